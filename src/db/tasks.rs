//! Task CRUD and ordering.
//!
//! Every write loads the board inside a transaction, applies the same
//! density-preserving operation the cache uses, and writes back only the
//! rows that changed.

use super::Database;
use crate::board::ops;
use crate::error::StoreError;
use crate::types::{ColumnId, NewTask, Task, TaskId, TaskPatch, now_ms};
use crate::validation::{validate_new_task, validate_patch};
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

const SELECT_TASKS: &str = "SELECT id, title, description, column_id, priority, sort_order, created_at, updated_at
     FROM tasks";

const BOARD_ORDER: &str = "ORDER BY CASE column_id
         WHEN 'backlog' THEN 0
         WHEN 'in_progress' THEN 1
         WHEN 'review' THEN 2
         ELSE 3
     END, sort_order, id";

fn parse_enum<T: std::str::FromStr<Err = String>>(
    row: &Row,
    idx: usize,
    name: &str,
) -> rusqlite::Result<T> {
    let raw: String = row.get(name)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        column: parse_enum(row, 3, "column_id")?,
        priority: parse_enum(row, 4, "priority")?,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// All tasks, grouped by column in display order and sorted by order.
pub(crate) fn load_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!("{} {}", SELECT_TASKS, BOARD_ORDER))?;
    let tasks = stmt
        .query_map([], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

pub(crate) fn get_task_internal(conn: &Connection, id: TaskId) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_TASKS))?;

    match stmt.query_row(params![id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist the difference between two versions of the board.
fn write_changes(conn: &Connection, before: &[Task], after: &[Task]) -> Result<usize> {
    let mut written = 0;

    for task in after {
        if before.iter().any(|b| b == task) {
            continue;
        }
        written += conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, column_id = ?3, priority = ?4,
                 sort_order = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                task.title,
                task.description,
                task.column.as_str(),
                task.priority.as_str(),
                task.order,
                task.updated_at,
                task.id,
            ],
        )?;
    }

    for task in before {
        if !after.iter().any(|a| a.id == task.id) {
            written += conn.execute("DELETE FROM tasks WHERE id = ?1", params![task.id])?;
        }
    }

    Ok(written)
}

impl Database {
    /// List all tasks ordered by column, then order.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(load_tasks)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, id))
    }

    /// Create a task. `input.order` is an insertion index into the column
    /// (top when absent); tasks below it shift down.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        validate_new_task(&input)?;
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let before = load_tasks(&tx)?;

            let priority = input.priority.unwrap_or_default();
            tx.execute(
                "INSERT INTO tasks (title, description, column_id, priority, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
                params![
                    input.title,
                    input.description,
                    input.column.as_str(),
                    priority.as_str(),
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            let record = Task {
                id,
                title: input.title,
                description: input.description,
                column: input.column,
                priority,
                order: 0,
                created_at: now,
                updated_at: now,
            };
            let mut after = before.clone();
            let task = ops::insert_task(&mut after, record, input.order);
            write_changes(&tx, &before, &after)?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Apply a partial update.
    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        validate_patch(patch)?;
        self.rewrite(|tasks, now| ops::update_task(tasks, id, patch, now))
    }

    pub fn delete_task(&self, id: TaskId) -> Result<()> {
        self.rewrite(|tasks, _| ops::remove_task(tasks, id).map(drop))
    }

    /// Place a task at `order` in `column` (its own column when `None`)
    /// and renumber both affected columns.
    pub fn move_task(&self, id: TaskId, order: u32, column: Option<ColumnId>) -> Result<Task> {
        self.rewrite(|tasks, now| ops::move_task(tasks, id, order as usize, column, now))
    }

    /// Load the board, apply `op` to it, and write back what changed, all
    /// in one transaction.
    fn rewrite<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>, i64) -> Result<T, StoreError>,
    {
        let now = now_ms();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let before = load_tasks(&tx)?;

            let mut after = before.clone();
            let result = op(&mut after, now)?;
            write_changes(&tx, &before, &after)?;

            tx.commit()?;
            Ok(result)
        })
    }
}
