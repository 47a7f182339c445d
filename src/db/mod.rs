//! SQLite persistence for the board.

pub mod maintenance;
pub mod tasks;

use crate::error::{StoreError, StoreResult};
use crate::store::TaskStore;
use crate::types::{ColumnId, NewTask, Task, TaskId, TaskPatch};
use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent access
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    }

    /// Run blocking database work off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Unavailable(format!("database task failed: {}", e)))?
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl TaskStore for Database {
    async fn list(&self) -> StoreResult<Vec<Task>> {
        self.blocking(|db| db.list_tasks()).await
    }

    async fn create(&self, input: NewTask) -> StoreResult<Task> {
        self.blocking(move |db| db.create_task(input)).await
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> StoreResult<Task> {
        self.blocking(move |db| db.update_task(id, &patch)).await
    }

    async fn delete(&self, id: TaskId) -> StoreResult<()> {
        self.blocking(move |db| db.delete_task(id)).await
    }

    async fn move_task(
        &self,
        id: TaskId,
        order: u32,
        column: Option<ColumnId>,
    ) -> StoreResult<Task> {
        self.blocking(move |db| db.move_task(id, order, column)).await
    }
}
