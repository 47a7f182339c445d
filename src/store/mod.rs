//! Task store collaborator.
//!
//! The board core only talks to persistence through [`TaskStore`]. The
//! SQLite [`Database`](crate::db::Database) and the in-memory
//! [`MemoryStore`] both implement it.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::types::{ColumnId, NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;

/// Persistence operations consumed by the board.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks. Callers treat failure as an empty board.
    async fn list(&self) -> StoreResult<Vec<Task>>;

    /// Create a task and return the canonical record.
    async fn create(&self, input: NewTask) -> StoreResult<Task>;

    /// Apply a partial update.
    async fn update(&self, id: TaskId, patch: TaskPatch) -> StoreResult<Task>;

    async fn delete(&self, id: TaskId) -> StoreResult<()>;

    /// Place a task at `order` within `column` (its own column if `None`).
    /// Siblings are renumbered by the store.
    async fn move_task(&self, id: TaskId, order: u32, column: Option<ColumnId>)
    -> StoreResult<Task>;
}
