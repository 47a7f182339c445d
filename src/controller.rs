//! Board controller: the optimistic apply / persist / reconcile protocol.
//!
//! The controller owns the store handle and the cache; there is no global
//! state. Each mutation locks the cache only for its synchronous phases and
//! awaits the store in between, so several mutations can be in flight at
//! once. Every method returns after reconciliation, and an `Err` means the
//! optimistic change has already been rolled back.

use crate::board::BoardView;
use crate::board::drag::{
    DEFAULT_ACTIVATION_DISTANCE, DragSession, DragState, Point, resolve_drop,
};
use crate::cache::TaskCache;
use crate::error::{StoreError, StoreResult};
use crate::store::TaskStore;
use crate::types::{DropTarget, MoveIntent, NewTask, Task, TaskId, TaskPatch};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub struct BoardController<S> {
    store: Arc<S>,
    cache: Mutex<TaskCache>,
    drag: Mutex<DragSession>,
}

impl<S: TaskStore> BoardController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            cache: Mutex::new(TaskCache::new()),
            drag: Mutex::new(DragSession::new(DEFAULT_ACTIVATION_DISTANCE)),
        }
    }

    /// Set the pointer travel needed before a press becomes a drag.
    pub fn with_activation_distance(self, pixels: f64) -> Self {
        *self.drag.lock().unwrap_or_else(PoisonError::into_inner) = DragSession::new(pixels);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn cache(&self) -> MutexGuard<'_, TaskCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drag(&self) -> MutexGuard<'_, DragSession> {
        self.drag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the board from the store. A failing store reads as an empty
    /// board. Returns the number of tasks loaded.
    pub async fn refresh(&self) -> usize {
        let tasks = match self.store.list().await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "Failed to list tasks, showing an empty board");
                Vec::new()
            }
        };
        let count = tasks.len();
        self.cache().replace_all(tasks);
        count
    }

    /// Current per-column view, including optimistic changes.
    pub fn view(&self) -> BoardView {
        self.cache().view()
    }

    /// View filtered by a search query.
    pub fn search(&self, query: &str) -> BoardView {
        self.view().filtered(query)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.cache().tasks().to_vec()
    }

    pub fn in_flight(&self) -> usize {
        self.cache().in_flight()
    }

    pub async fn create(&self, input: NewTask) -> StoreResult<Task> {
        let (ticket, placeholder) = self.cache().begin_create(&input);

        match self.store.create(input).await {
            Ok(task) => {
                debug!(placeholder, task_id = task.id, "Create confirmed");
                self.cache().commit_create(ticket, task.clone());
                Ok(task)
            }
            Err(e) => {
                self.cache().rollback(ticket);
                Err(e)
            }
        }
    }

    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> StoreResult<Task> {
        let ticket = self
            .cache()
            .begin_update(id, patch.clone())
            .ok_or(StoreError::NotFound(id))?;

        match self.store.update(id, patch).await {
            Ok(task) => {
                self.cache().commit(ticket);
                Ok(task)
            }
            Err(e) => {
                self.cache().rollback(ticket);
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: TaskId) -> StoreResult<()> {
        let ticket = self
            .cache()
            .begin_delete(id)
            .ok_or(StoreError::NotFound(id))?;

        match self.store.delete(id).await {
            Ok(()) => {
                self.cache().commit(ticket);
                Ok(())
            }
            Err(e) => {
                self.cache().rollback(ticket);
                Err(e)
            }
        }
    }

    /// Apply a move intent. `Ok(None)` means the intent was invalid or
    /// changed nothing, and the store was not called.
    pub async fn submit_move(&self, intent: MoveIntent) -> StoreResult<Option<Task>> {
        let Some((ticket, plan)) = self.cache().begin_move(intent) else {
            debug!(?intent, "Move intent is a no-op");
            return Ok(None);
        };

        let column = plan.crosses_columns().then_some(plan.to_column);
        match self
            .store
            .move_task(plan.task_id, plan.index as u32, column)
            .await
        {
            Ok(task) => {
                self.cache().commit(ticket);
                Ok(Some(task))
            }
            Err(e) => {
                self.cache().rollback(ticket);
                Err(e)
            }
        }
    }

    /// Resolve a drop of `task_id` onto `over` against the current board
    /// and submit the resulting move, if any.
    pub async fn apply_intent(&self, task_id: TaskId, over: DropTarget) -> StoreResult<Option<Task>> {
        let intent = resolve_drop(task_id, over, &self.view());
        match intent {
            Some(intent) => self.submit_move(intent).await,
            None => Ok(None),
        }
    }

    /// Current drag state for rendering.
    pub fn drag_state(&self) -> DragState {
        self.drag().state()
    }

    pub fn pointer_down(&self, task_id: TaskId, at: Point) {
        self.drag().pointer_down(task_id, at);
    }

    pub fn pointer_move(&self, at: Point, over: DropTarget) {
        let view = self.view();
        self.drag().pointer_move(at, over, &view);
    }

    pub fn cancel_drag(&self) {
        self.drag().cancel();
    }

    /// End the drag. The drop is resolved against the latest cache state
    /// and, if it yields an intent, submitted as a move.
    pub async fn pointer_up(&self, over: DropTarget) -> StoreResult<Option<Task>> {
        let view = self.view();
        let intent = self.drag().pointer_up(over, &view);
        match intent {
            Some(intent) => self.submit_move(intent).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::memory::StoreCall;
    use crate::types::ColumnId;

    async fn controller() -> BoardController<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (title, column) in [
            ("Task A", ColumnId::Backlog),
            ("Task B", ColumnId::Backlog),
            ("Task C", ColumnId::Done),
        ] {
            let count = store.snapshot().iter().filter(|t| t.column == column).count();
            store
                .create(NewTask::new(title, column).with_order(count as u32))
                .await
                .unwrap();
        }
        let controller = BoardController::new(store);
        controller.refresh().await;
        controller
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_refresh_loads_board() {
        let controller = controller().await;
        let view = controller.view();
        assert_eq!(titles(&view.backlog), vec!["Task A", "Task B"]);
        assert_eq!(titles(&view.done), vec!["Task C"]);
    }

    #[tokio::test]
    async fn test_refresh_fails_soft() {
        let controller = controller().await;
        controller.store().fail_all();
        assert_eq!(controller.refresh().await, 0);
        assert!(controller.view().is_empty());
    }

    #[tokio::test]
    async fn test_noop_move_skips_store() {
        let controller = controller().await;
        let a = controller.view().backlog[0].id;
        let calls = controller.store().call_count();

        let result = controller
            .submit_move(MoveIntent {
                task_id: a,
                target_index: 0,
                target_column: None,
            })
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(controller.store().call_count(), calls);
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back() {
        let controller = controller().await;
        let before = controller.tasks();
        let a = controller.view().backlog[0].id;

        let err = controller
            .update(
                a,
                TaskPatch {
                    title: Some("x".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Validation { .. }));
        assert_eq!(controller.tasks(), before);
    }

    #[tokio::test]
    async fn test_delete_unknown_task_is_not_found() {
        let controller = controller().await;
        let calls = controller.store().call_count();
        let err = controller.delete(999).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound(999));
        assert_eq!(controller.store().call_count(), calls);
    }

    #[tokio::test]
    async fn test_drag_gesture_moves_task() {
        let controller = controller().await;
        let view = controller.view();
        let b = view.backlog[1].id;
        let c = view.done[0].id;

        controller.pointer_down(b, Point::new(0.0, 0.0));
        controller.pointer_move(Point::new(0.0, 20.0), DropTarget::TaskRow(c));
        assert!(matches!(
            controller.drag_state(),
            DragState::Dragging {
                highlighted: Some(ColumnId::Done),
                ..
            }
        ));

        let moved = controller
            .pointer_up(DropTarget::TaskRow(c))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.column, ColumnId::Done);
        assert_eq!(controller.drag_state(), DragState::Idle);

        let view = controller.view();
        assert_eq!(titles(&view.backlog), vec!["Task A"]);
        assert_eq!(titles(&view.done), vec!["Task B", "Task C"]);
    }

    #[tokio::test]
    async fn test_apply_intent_on_column_header_appends() {
        let controller = controller().await;
        let a = controller.view().backlog[0].id;

        controller
            .apply_intent(a, DropTarget::Column(ColumnId::Done))
            .await
            .unwrap();

        let view = controller.view();
        assert_eq!(titles(&view.backlog), vec!["Task B"]);
        assert_eq!(titles(&view.done), vec!["Task C", "Task A"]);
        assert_eq!(titles(&controller.store().snapshot()).len(), 3);
        assert!(crate::board::partition(&controller.store().snapshot()).is_dense());
    }

    #[tokio::test]
    async fn test_overlapping_mutations_survive_unrelated_failure() {
        let controller = controller().await;
        let view = controller.view();
        let a = view.backlog[0].id;
        let c = view.done[0].id;
        controller
            .store()
            .fail_when(move |call| *call == StoreCall::Update(a));

        let rename = controller.update(
            a,
            TaskPatch {
                title: Some("Renamed A".into()),
                ..Default::default()
            },
        );
        let moving = controller.submit_move(MoveIntent {
            task_id: c,
            target_index: 0,
            target_column: Some(ColumnId::Backlog),
        });
        let (renamed, moved) = tokio::join!(rename, moving);

        assert!(renamed.is_err());
        assert!(moved.unwrap().is_some());

        let view = controller.view();
        assert_eq!(titles(&view.backlog), vec!["Task C", "Task A", "Task B"]);
        assert!(view.done.is_empty());
        assert_eq!(controller.in_flight(), 0);
    }
}
