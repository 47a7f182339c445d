//! In-memory task store.
//!
//! Behaves like the SQLite store (dense ordering, monotonically assigned
//! ids) and can be told to fail or slow down specific calls, which makes it
//! the store of choice for exercising rollback paths.

use super::TaskStore;
use crate::board::ops;
use crate::error::{StoreError, StoreResult};
use crate::types::{ColumnId, NewTask, Task, TaskId, TaskPatch, now_ms};
use crate::validation::{validate_new_task, validate_patch};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A store call, as seen by failure predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    List,
    Create,
    Update(TaskId),
    Delete(TaskId),
    Move(TaskId),
}

type FailPredicate = Box<dyn Fn(&StoreCall) -> bool + Send + Sync>;

/// Task store backed by a `Vec` behind a mutex.
pub struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
    latency: Mutex<Option<Duration>>,
    fail_when: Mutex<Option<FailPredicate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            calls: AtomicUsize::new(0),
            latency: Mutex::new(None),
            fail_when: Mutex::new(None),
        }
    }

    /// Start from existing records. Ids continue after the largest one.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let store = Self::new();
        store.next_id.store(next.max(1), Ordering::SeqCst);
        *store.tasks.lock().unwrap_or_else(PoisonError::into_inner) = tasks;
        store
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Fail every call matching `predicate` with [`StoreError::Unavailable`].
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreCall) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(predicate));
    }

    /// Fail every call.
    pub fn fail_all(&self) {
        self.fail_when(|_| true);
    }

    /// Stop injecting failures.
    pub fn recover(&self) {
        *self.fail_when.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of calls made so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copy of the stored records.
    pub fn snapshot(&self) -> Vec<Task> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, wait out latency, and check the failure predicate.
    async fn enter(&self, call: StoreCall) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        match latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        let failing = self
            .fail_when
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|predicate| predicate(&call));
        if failing {
            return Err(StoreError::Unavailable(format!("injected failure for {:?}", call)));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Task>> {
        self.enter(StoreCall::List).await?;
        Ok(self.snapshot())
    }

    async fn create(&self, input: NewTask) -> StoreResult<Task> {
        self.enter(StoreCall::Create).await?;
        validate_new_task(&input)?;

        let now = now_ms();
        let task = Task {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: input.title,
            description: input.description,
            column: input.column,
            priority: input.priority.unwrap_or_default(),
            order: 0,
            created_at: now,
            updated_at: now,
        };
        Ok(ops::insert_task(&mut self.lock(), task, input.order))
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> StoreResult<Task> {
        self.enter(StoreCall::Update(id)).await?;
        validate_patch(&patch)?;
        ops::update_task(&mut self.lock(), id, &patch, now_ms())
    }

    async fn delete(&self, id: TaskId) -> StoreResult<()> {
        self.enter(StoreCall::Delete(id)).await?;
        ops::remove_task(&mut self.lock(), id).map(|_| ())
    }

    async fn move_task(
        &self,
        id: TaskId,
        order: u32,
        column: Option<ColumnId>,
    ) -> StoreResult<Task> {
        self.enter(StoreCall::Move(id)).await?;
        ops::move_task(&mut self.lock(), id, order as usize, column, now_ms())
    }
}
