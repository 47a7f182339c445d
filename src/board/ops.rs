//! Density-preserving mutations on a flat task collection.
//!
//! The optimistic cache, the in-memory store and the SQLite store all
//! route writes through these so a column always holds orders `0..len`.

use super::partition;
use super::reorder::{apply_changes, compute_reorder, place_new, repack};
use crate::error::{StoreError, StoreResult};
use crate::types::{ColumnId, Task, TaskId, TaskPatch};

/// Insert `task` at `index` of its column (top when `None`) and shift the
/// tasks below it. Returns the stored record.
pub fn insert_task(tasks: &mut Vec<Task>, mut task: Task, index: Option<u32>) -> Task {
    let (order, shifts) = place_new(tasks, task.column, index);
    apply_changes(tasks, &shifts);
    task.order = order;
    tasks.push(task.clone());
    task
}

/// Apply `patch` to task `id`.
///
/// A column change without an explicit `order` appends the task to the
/// end of the destination column. An `order` alone is a same-column move.
/// Re-sending the current column, as an edit form does, keeps placement.
pub fn update_task(
    tasks: &mut [Task],
    id: TaskId,
    patch: &TaskPatch,
    now: i64,
) -> StoreResult<Task> {
    let current = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(StoreError::NotFound(id))?;
    patch.apply_fields(current);
    current.updated_at = now;
    let current_column = current.column;

    let column = patch.column.unwrap_or(current_column);
    let index = match patch.order {
        Some(order) => Some(order as usize),
        None if column != current_column => Some(partition(tasks).column(column).len()),
        None => None,
    };
    if let Some(index) = index
        && let Some(plan) = compute_reorder(tasks, id, index, Some(column))
    {
        plan.apply(tasks, now);
    }

    find(tasks, id)
}

/// Place task `id` at `index` of `column` (its own column when `None`).
pub fn move_task(
    tasks: &mut [Task],
    id: TaskId,
    index: usize,
    column: Option<ColumnId>,
    now: i64,
) -> StoreResult<Task> {
    let plan = compute_reorder(tasks, id, index, column).ok_or(StoreError::NotFound(id))?;
    plan.apply(tasks, now);
    find(tasks, id)
}

/// Remove task `id` and close the gap in its column.
pub fn remove_task(tasks: &mut Vec<Task>, id: TaskId) -> StoreResult<Task> {
    let position = tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or(StoreError::NotFound(id))?;
    let removed = tasks.remove(position);
    let changes = repack(tasks, removed.column);
    apply_changes(tasks, &changes);
    Ok(removed)
}

fn find(tasks: &[Task], id: TaskId) -> StoreResult<Task> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .ok_or(StoreError::NotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_support::{ids, task};

    fn board() -> Vec<Task> {
        vec![
            task(1, ColumnId::Backlog, 0),
            task(2, ColumnId::Backlog, 1),
            task(3, ColumnId::Done, 0),
        ]
    }

    #[test]
    fn test_insert_at_top_by_default() {
        let mut tasks = board();
        let stored = insert_task(&mut tasks, task(4, ColumnId::Backlog, 9), None);
        assert_eq!(stored.order, 0);

        let view = partition(&tasks);
        assert_eq!(ids(&view.backlog), vec![4, 1, 2]);
        assert!(view.is_dense());
    }

    #[test]
    fn test_update_fields_only_keeps_placement() {
        let mut tasks = board();
        let patch = TaskPatch {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        let updated = update_task(&mut tasks, 2, &patch, 50).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.order, 1);
        assert_eq!(updated.updated_at, 50);
    }

    #[test]
    fn test_update_column_appends_and_repacks_source() {
        let mut tasks = board();
        let patch = TaskPatch {
            column: Some(ColumnId::Done),
            ..Default::default()
        };
        let updated = update_task(&mut tasks, 1, &patch, 50).unwrap();
        assert_eq!(updated.column, ColumnId::Done);
        assert_eq!(updated.order, 1);

        let view = partition(&tasks);
        assert_eq!(ids(&view.backlog), vec![2]);
        assert_eq!(ids(&view.done), vec![3, 1]);
        assert!(view.is_dense());
    }

    #[test]
    fn test_update_order_only_moves_within_column() {
        let mut tasks = board();
        let patch = TaskPatch {
            order: Some(0),
            ..Default::default()
        };
        update_task(&mut tasks, 2, &patch, 50).unwrap();
        assert_eq!(ids(&partition(&tasks).backlog), vec![2, 1]);
    }

    #[test]
    fn test_update_same_column_without_order_stays_put() {
        let mut tasks = board();
        let patch = TaskPatch {
            column: Some(ColumnId::Backlog),
            ..Default::default()
        };
        update_task(&mut tasks, 1, &patch, 50).unwrap();
        assert_eq!(ids(&partition(&tasks).backlog), vec![1, 2]);
    }

    #[test]
    fn test_update_missing() {
        let mut tasks = board();
        let err = update_task(&mut tasks, 9, &TaskPatch::default(), 0).unwrap_err();
        assert_eq!(err, StoreError::NotFound(9));
    }

    #[test]
    fn test_remove_repacks() {
        let mut tasks = board();
        let removed = remove_task(&mut tasks, 1).unwrap();
        assert_eq!(removed.id, 1);

        let view = partition(&tasks);
        assert_eq!(view.backlog[0].order, 0);
        assert!(view.is_dense());
        assert_eq!(remove_task(&mut tasks, 1), Err(StoreError::NotFound(1)));
    }
}
