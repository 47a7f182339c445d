//! Pointer-driven drag session.
//!
//! A session goes `Idle -> Pressed -> Dragging -> Idle`. `Pressed` holds a
//! pointer-down that has not yet travelled the activation distance, so a
//! plain click never becomes a drag. Releasing the pointer always returns
//! to `Idle` and yields at most one [`MoveIntent`].

use super::BoardView;
use crate::types::{ColumnId, DropTarget, MoveIntent, TaskId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum pointer travel, in pixels, before a press becomes a drag.
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 3.0;

/// Pointer position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Drag lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer is down on a task but has not moved far enough yet.
    Pressed { task_id: TaskId, origin: Point },
    Dragging {
        task_id: TaskId,
        origin_column: ColumnId,
        /// Column currently shown as the drop target.
        highlighted: Option<ColumnId>,
    },
}

/// Tracks one pointer's drag lifecycle.
#[derive(Debug, Clone)]
pub struct DragSession {
    state: DragState,
    activation_distance: f64,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

impl DragSession {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            state: DragState::Idle,
            activation_distance: activation_distance.max(0.0),
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Task being dragged, once the drag is active.
    pub fn active_task(&self) -> Option<TaskId> {
        match self.state {
            DragState::Dragging { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    pub fn highlighted_column(&self) -> Option<ColumnId> {
        match self.state {
            DragState::Dragging { highlighted, .. } => highlighted,
            _ => None,
        }
    }

    /// Pointer pressed on a task card. Ignored unless idle.
    pub fn pointer_down(&mut self, task_id: TaskId, at: Point) {
        if matches!(self.state, DragState::Idle) {
            self.state = DragState::Pressed { task_id, origin: at };
        }
    }

    /// Pointer moved. Activates a pending press once it has travelled far
    /// enough, then tracks the highlighted column.
    pub fn pointer_move(&mut self, at: Point, over: DropTarget, view: &BoardView) {
        match self.state {
            DragState::Idle => {}
            DragState::Pressed { task_id, origin } => {
                if origin.distance_to(at) < self.activation_distance {
                    return;
                }
                let Some(task) = view.find(task_id) else {
                    debug!(task_id, "Pressed task no longer on the board, ignoring drag");
                    self.state = DragState::Idle;
                    return;
                };
                debug!(task_id, column = %task.column, "Drag started");
                self.state = DragState::Dragging {
                    task_id,
                    origin_column: task.column,
                    highlighted: Some(task.column),
                };
                self.track(over, view);
            }
            DragState::Dragging { .. } => self.track(over, view),
        }
    }

    fn track(&mut self, over: DropTarget, view: &BoardView) {
        let DragState::Dragging {
            ref mut highlighted,
            ..
        } = self.state
        else {
            return;
        };
        match over {
            DropTarget::Column(column) => *highlighted = Some(column),
            DropTarget::TaskRow(id) => {
                // Unknown rows leave the highlight where it was.
                if let Some(task) = view.find(id) {
                    *highlighted = Some(task.column);
                }
            }
            DropTarget::None => *highlighted = None,
        }
    }

    /// Pointer released. Always returns to idle; yields a move intent only
    /// for an active drag that resolves to a real change.
    pub fn pointer_up(&mut self, over: DropTarget, view: &BoardView) -> Option<MoveIntent> {
        let state = std::mem::take(&mut self.state);
        match state {
            DragState::Dragging { task_id, .. } => {
                let intent = resolve_drop(task_id, over, view);
                debug!(task_id, ?over, ?intent, "Drag ended");
                intent
            }
            _ => None,
        }
    }

    /// Abort without emitting anything.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

/// Turn a drop into a move intent.
///
/// - Column target: append to that column, unless it is the task's own
///   column (a cancel).
/// - Task target in the same column: take the hovered task's index, unless
///   that is the dragged task's own index.
/// - Task target in another column: insert before the hovered task.
///
/// Anything unresolvable (no target, unknown task) is a no-op.
pub fn resolve_drop(task_id: TaskId, over: DropTarget, view: &BoardView) -> Option<MoveIntent> {
    let (active_column, active_index) = view.position_of(task_id)?;

    match over {
        DropTarget::None => None,
        DropTarget::Column(column) => {
            if column == active_column {
                return None;
            }
            Some(MoveIntent {
                task_id,
                target_index: view.column(column).len(),
                target_column: Some(column),
            })
        }
        DropTarget::TaskRow(over_id) => {
            let (over_column, over_index) = view.position_of(over_id)?;
            if over_column == active_column {
                if over_index == active_index {
                    return None;
                }
                return Some(MoveIntent {
                    task_id,
                    target_index: over_index,
                    target_column: None,
                });
            }
            Some(MoveIntent {
                task_id,
                target_index: over_index,
                target_column: Some(over_column),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::partition;
    use crate::board::test_support::task;

    fn view() -> BoardView {
        partition(&[
            task(1, ColumnId::Backlog, 0),
            task(2, ColumnId::Backlog, 1),
            task(3, ColumnId::Done, 0),
        ])
    }

    fn start_drag(session: &mut DragSession, id: TaskId, view: &BoardView) {
        session.pointer_down(id, Point::new(0.0, 0.0));
        session.pointer_move(Point::new(10.0, 0.0), DropTarget::None, view);
    }

    #[test]
    fn test_press_below_threshold_is_a_click() {
        let view = view();
        let mut session = DragSession::default();
        session.pointer_down(1, Point::new(0.0, 0.0));
        session.pointer_move(Point::new(1.0, 1.0), DropTarget::Column(ColumnId::Done), &view);

        assert!(!session.is_dragging());
        assert_eq!(
            session.pointer_up(DropTarget::Column(ColumnId::Done), &view),
            None
        );
        assert_eq!(session.state(), DragState::Idle);
    }

    #[test]
    fn test_activation_sets_origin_and_tracks_target() {
        let view = view();
        let mut session = DragSession::default();
        session.pointer_down(1, Point::new(0.0, 0.0));
        session.pointer_move(Point::new(3.0, 0.0), DropTarget::TaskRow(3), &view);

        assert_eq!(
            session.state(),
            DragState::Dragging {
                task_id: 1,
                origin_column: ColumnId::Backlog,
                highlighted: Some(ColumnId::Done),
            }
        );
    }

    #[test]
    fn test_highlight_follows_targets() {
        let view = view();
        let mut session = DragSession::default();
        session.pointer_down(1, Point::new(0.0, 0.0));
        session.pointer_move(Point::new(5.0, 5.0), DropTarget::Column(ColumnId::Review), &view);
        assert_eq!(session.highlighted_column(), Some(ColumnId::Review));

        session.pointer_move(Point::new(6.0, 5.0), DropTarget::TaskRow(99), &view);
        assert_eq!(session.highlighted_column(), Some(ColumnId::Review));

        session.pointer_move(Point::new(7.0, 5.0), DropTarget::None, &view);
        assert_eq!(session.highlighted_column(), None);
    }

    #[test]
    fn test_drop_on_other_column_appends() {
        let view = view();
        let mut session = DragSession::default();
        start_drag(&mut session, 1, &view);

        let intent = session.pointer_up(DropTarget::Column(ColumnId::Done), &view);
        assert_eq!(
            intent,
            Some(MoveIntent {
                task_id: 1,
                target_index: 1,
                target_column: Some(ColumnId::Done),
            })
        );
        assert_eq!(session.state(), DragState::Idle);
    }

    #[test]
    fn test_drop_on_own_column_is_cancel() {
        let view = view();
        let mut session = DragSession::default();
        start_drag(&mut session, 1, &view);
        assert_eq!(
            session.pointer_up(DropTarget::Column(ColumnId::Backlog), &view),
            None
        );
    }

    #[test]
    fn test_drop_on_nothing() {
        let view = view();
        let mut session = DragSession::default();
        start_drag(&mut session, 1, &view);
        assert_eq!(session.pointer_up(DropTarget::None, &view), None);
        assert_eq!(session.state(), DragState::Idle);
    }

    #[test]
    fn test_drop_on_sibling_takes_its_index() {
        let view = view();
        assert_eq!(
            resolve_drop(1, DropTarget::TaskRow(2), &view),
            Some(MoveIntent {
                task_id: 1,
                target_index: 1,
                target_column: None,
            })
        );
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        assert_eq!(resolve_drop(2, DropTarget::TaskRow(2), &view()), None);
    }

    #[test]
    fn test_drop_on_task_in_other_column_inserts_before() {
        assert_eq!(
            resolve_drop(2, DropTarget::TaskRow(3), &view()),
            Some(MoveIntent {
                task_id: 2,
                target_index: 0,
                target_column: Some(ColumnId::Done),
            })
        );
    }

    #[test]
    fn test_unknown_tasks_are_noops() {
        let view = view();
        assert_eq!(resolve_drop(42, DropTarget::Column(ColumnId::Done), &view), None);
        assert_eq!(resolve_drop(1, DropTarget::TaskRow(42), &view), None);
    }

    #[test]
    fn test_pointer_down_ignored_while_dragging() {
        let view = view();
        let mut session = DragSession::default();
        start_drag(&mut session, 1, &view);
        session.pointer_down(2, Point::new(0.0, 0.0));
        assert_eq!(session.active_task(), Some(1));

        session.cancel();
        assert_eq!(session.state(), DragState::Idle);
    }
}
