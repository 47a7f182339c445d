//! Per-column view of the task collection.
//!
//! [`partition`] is the single source of truth for column membership and
//! position. Rendering and drag resolution both read through it, and it
//! must be called on the latest cache state before a move is computed.

pub mod drag;
pub mod ops;
pub mod reorder;

use crate::types::{ColumnId, Task, TaskId};
use serde::{Deserialize, Serialize};

/// Tasks grouped by column, each column sorted by `order`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub backlog: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub review: Vec<Task>,
    pub done: Vec<Task>,
}

/// Group `tasks` by column and sort each column by `order`.
///
/// The sort is stable, so tasks with equal `order` keep their relative
/// position from `tasks`.
pub fn partition(tasks: &[Task]) -> BoardView {
    let mut view = BoardView::default();
    for task in tasks {
        view.column_mut(task.column).push(task.clone());
    }
    for column in ColumnId::ALL {
        view.column_mut(column).sort_by_key(|t| t.order);
    }
    view
}

impl BoardView {
    /// Ordered tasks of one column.
    pub fn column(&self, column: ColumnId) -> &[Task] {
        match column {
            ColumnId::Backlog => &self.backlog,
            ColumnId::InProgress => &self.in_progress,
            ColumnId::Review => &self.review,
            ColumnId::Done => &self.done,
        }
    }

    fn column_mut(&mut self, column: ColumnId) -> &mut Vec<Task> {
        match column {
            ColumnId::Backlog => &mut self.backlog,
            ColumnId::InProgress => &mut self.in_progress,
            ColumnId::Review => &mut self.review,
            ColumnId::Done => &mut self.done,
        }
    }

    /// Iterate columns in display order.
    pub fn columns(&self) -> impl Iterator<Item = (ColumnId, &[Task])> {
        ColumnId::ALL.into_iter().map(move |c| (c, self.column(c)))
    }

    /// Column and index of a task, if it is on the board.
    pub fn position_of(&self, id: TaskId) -> Option<(ColumnId, usize)> {
        self.columns().find_map(|(column, tasks)| {
            tasks
                .iter()
                .position(|t| t.id == id)
                .map(|index| (column, index))
        })
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.columns()
            .flat_map(|(_, tasks)| tasks.iter())
            .find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.columns().map(|(_, tasks)| tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only tasks whose title or description contains `query`,
    /// ignoring case. A blank query keeps everything.
    ///
    /// For display only; drags resolve against the unfiltered view.
    pub fn filtered(&self, query: &str) -> BoardView {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.clone();
        }
        let matches = |task: &&Task| {
            task.title.to_lowercase().contains(&query)
                || task
                    .description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
        };
        let mut view = BoardView::default();
        for (column, tasks) in self.columns() {
            *view.column_mut(column) = tasks.iter().filter(|t| matches(t)).cloned().collect();
        }
        view
    }

    /// Whether every column holds exactly the orders `0..len`.
    pub fn is_dense(&self) -> bool {
        self.columns().all(|(_, tasks)| {
            tasks
                .iter()
                .enumerate()
                .all(|(index, task)| task.order as usize == index)
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{ColumnId, Priority, Task, TaskId};

    pub fn task(id: TaskId, column: ColumnId, order: u32) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: None,
            column,
            priority: Priority::Low,
            order,
            created_at: 1_000 + id,
            updated_at: 1_000 + id,
        }
    }

    pub fn ids(tasks: &[Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id).collect()
    }
}
