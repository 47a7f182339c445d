//! Reorder engine.
//!
//! Every placement change renumbers the affected columns to dense,
//! zero-based `order` values. Moves are O(column size), which is fine for
//! boards of human scale.

use super::{BoardView, partition};
use crate::types::{ColumnId, Task, TaskId};
use serde::{Deserialize, Serialize};

/// A single placement update for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChange {
    pub id: TaskId,
    pub column: ColumnId,
    pub order: u32,
}

/// Result of computing a move: the moved task's new placement plus every
/// sibling whose `order` shifted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    pub task_id: TaskId,
    pub from_column: ColumnId,
    pub to_column: ColumnId,
    /// Final index of the moved task in `to_column`.
    pub index: usize,
    /// Only entries whose column or order actually differ.
    pub changes: Vec<OrderChange>,
}

impl ReorderPlan {
    /// Nothing changes; no persistence call is needed.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn crosses_columns(&self) -> bool {
        self.from_column != self.to_column
    }

    /// The moved task's new placement.
    pub fn moved(&self) -> OrderChange {
        OrderChange {
            id: self.task_id,
            column: self.to_column,
            order: self.index as u32,
        }
    }

    /// Apply the plan to a flat collection. The moved task's `updated_at`
    /// is bumped to `now`.
    pub fn apply(&self, tasks: &mut [Task], now: i64) {
        apply_changes(tasks, &self.changes);
        if !self.is_noop()
            && let Some(task) = tasks.iter_mut().find(|t| t.id == self.task_id)
        {
            task.updated_at = now;
        }
    }
}

/// Compute the placement changes for moving `task_id` to `target_index`
/// in `target_column` (or its own column when `None`).
///
/// The index is taken against the destination column with the moved task
/// removed and is clamped to `[0, len]`. Returns `None` if the task is not
/// in `tasks`.
pub fn compute_reorder(
    tasks: &[Task],
    task_id: TaskId,
    target_index: usize,
    target_column: Option<ColumnId>,
) -> Option<ReorderPlan> {
    let view = partition(tasks);
    compute_reorder_in(&view, task_id, target_index, target_column)
}

/// Same as [`compute_reorder`] against an already partitioned view.
pub fn compute_reorder_in(
    view: &BoardView,
    task_id: TaskId,
    target_index: usize,
    target_column: Option<ColumnId>,
) -> Option<ReorderPlan> {
    let (from_column, _) = view.position_of(task_id)?;
    let to_column = target_column.unwrap_or(from_column);

    let mut sequence: Vec<(TaskId, ColumnId, u32)> = view
        .column(to_column)
        .iter()
        .filter(|t| t.id != task_id)
        .map(|t| (t.id, t.column, t.order))
        .collect();
    let index = target_index.min(sequence.len());
    let current_order = view.find(task_id).map(|t| t.order).unwrap_or_default();
    sequence.insert(index, (task_id, from_column, current_order));

    let mut changes = renumber(to_column, &sequence);

    if from_column != to_column {
        let remaining: Vec<(TaskId, ColumnId, u32)> = view
            .column(from_column)
            .iter()
            .filter(|t| t.id != task_id)
            .map(|t| (t.id, t.column, t.order))
            .collect();
        changes.extend(renumber(from_column, &remaining));
    }

    Some(ReorderPlan {
        task_id,
        from_column,
        to_column,
        index,
        changes,
    })
}

/// Placement for a new task inserted at `index` of `column`.
///
/// Returns the clamped order for the new task and the shifts of the
/// existing tasks below it.
pub fn place_new(tasks: &[Task], column: ColumnId, index: Option<u32>) -> (u32, Vec<OrderChange>) {
    let view = partition(tasks);
    let existing = view.column(column);
    let index = (index.unwrap_or(0) as usize).min(existing.len());

    let shifts = existing
        .iter()
        .enumerate()
        .filter_map(|(position, task)| {
            let order = (if position < index { position } else { position + 1 }) as u32;
            (task.order != order).then_some(OrderChange {
                id: task.id,
                column,
                order,
            })
        })
        .collect();

    (index as u32, shifts)
}

/// Renumber one column to `0..len` in its current sort order.
pub fn repack(tasks: &[Task], column: ColumnId) -> Vec<OrderChange> {
    let view = partition(tasks);
    let sequence: Vec<(TaskId, ColumnId, u32)> = view
        .column(column)
        .iter()
        .map(|t| (t.id, t.column, t.order))
        .collect();
    renumber(column, &sequence)
}

/// Write `changes` into a flat collection.
pub fn apply_changes(tasks: &mut [Task], changes: &[OrderChange]) {
    for change in changes {
        if let Some(task) = tasks.iter_mut().find(|t| t.id == change.id) {
            task.column = change.column;
            task.order = change.order;
        }
    }
}

fn renumber(column: ColumnId, sequence: &[(TaskId, ColumnId, u32)]) -> Vec<OrderChange> {
    sequence
        .iter()
        .enumerate()
        .filter_map(|(index, &(id, current_column, current_order))| {
            let order = index as u32;
            (current_column != column || current_order != order).then_some(OrderChange {
                id,
                column,
                order,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_support::{ids, task};

    fn board() -> Vec<Task> {
        vec![
            task(1, ColumnId::Backlog, 0),
            task(2, ColumnId::Backlog, 1),
            task(3, ColumnId::Backlog, 2),
            task(4, ColumnId::Done, 0),
        ]
    }

    fn apply(tasks: &mut Vec<Task>, plan: &ReorderPlan) -> BoardView {
        plan.apply(tasks, 99);
        partition(tasks)
    }

    #[test]
    fn test_same_column_move_down() {
        let mut tasks = board();
        let plan = compute_reorder(&tasks, 1, 2, None).unwrap();
        let view = apply(&mut tasks, &plan);

        assert_eq!(ids(&view.backlog), vec![2, 3, 1]);
        assert!(view.is_dense());
        assert!(!plan.crosses_columns());
    }

    #[test]
    fn test_same_column_move_up() {
        let mut tasks = board();
        let plan = compute_reorder(&tasks, 3, 0, None).unwrap();
        let view = apply(&mut tasks, &plan);

        assert_eq!(ids(&view.backlog), vec![3, 1, 2]);
        assert_eq!(plan.changes.len(), 3);
    }

    #[test]
    fn test_same_index_is_noop() {
        let tasks = board();
        let plan = compute_reorder(&tasks, 2, 1, None).unwrap();
        assert!(plan.is_noop());
    }

    #[test]
    fn test_cross_column_move_renumbers_both_columns() {
        let mut tasks = board();
        let plan = compute_reorder(&tasks, 2, 0, Some(ColumnId::Done)).unwrap();
        let view = apply(&mut tasks, &plan);

        assert_eq!(ids(&view.backlog), vec![1, 3]);
        assert_eq!(ids(&view.done), vec![2, 4]);
        assert!(view.is_dense());
        assert_eq!(plan.moved().order, 0);
        assert_eq!(view.done[0].updated_at, 99);
    }

    #[test]
    fn test_index_is_clamped() {
        let mut tasks = board();
        let plan = compute_reorder(&tasks, 1, 50, Some(ColumnId::Done)).unwrap();
        assert_eq!(plan.index, 1);
        let view = apply(&mut tasks, &plan);
        assert_eq!(ids(&view.done), vec![4, 1]);
    }

    #[test]
    fn test_move_into_empty_column() {
        let mut tasks = board();
        let plan = compute_reorder(&tasks, 4, 0, Some(ColumnId::Review)).unwrap();
        let view = apply(&mut tasks, &plan);
        assert_eq!(ids(&view.review), vec![4]);
        assert!(view.done.is_empty());
    }

    #[test]
    fn test_unknown_task() {
        assert!(compute_reorder(&board(), 42, 0, None).is_none());
    }

    #[test]
    fn test_move_repairs_gapped_column() {
        let mut tasks = vec![task(1, ColumnId::Review, 3), task(2, ColumnId::Review, 7)];
        let plan = compute_reorder(&tasks, 2, 0, None).unwrap();
        let view = apply(&mut tasks, &plan);
        assert_eq!(ids(&view.review), vec![2, 1]);
        assert!(view.is_dense());
    }

    #[test]
    fn test_place_new_at_top_shifts_siblings() {
        let tasks = board();
        let (order, shifts) = place_new(&tasks, ColumnId::Backlog, None);
        assert_eq!(order, 0);
        assert_eq!(shifts.len(), 3);
        assert!(shifts.iter().all(|c| c.column == ColumnId::Backlog));
    }

    #[test]
    fn test_place_new_clamps_to_end() {
        let tasks = board();
        let (order, shifts) = place_new(&tasks, ColumnId::Done, Some(10));
        assert_eq!(order, 1);
        assert!(shifts.is_empty());
    }

    #[test]
    fn test_repack_closes_gaps() {
        let mut tasks = vec![task(1, ColumnId::Done, 2), task(2, ColumnId::Done, 5)];
        let changes = repack(&tasks, ColumnId::Done);
        apply_changes(&mut tasks, &changes);
        assert!(partition(&tasks).is_dense());
    }
}
