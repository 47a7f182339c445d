//! Optimistic task cache.
//!
//! Every mutation is applied here synchronously, before the store is
//! called, and handed back as a [`Ticket`]. Once the store call settles the
//! caller passes the ticket to [`TaskCache::commit`],
//! [`TaskCache::commit_create`] or [`TaskCache::rollback`].
//!
//! In-flight mutations are kept in an ordered log, each with the state it
//! was applied on top of. Rolling back one entry restores its snapshot and
//! replays every later entry, so a failure never erases a mutation that
//! was applied after it. A lone mutation rolls back to exactly its
//! snapshot.

use crate::board::reorder::{ReorderPlan, compute_reorder};
use crate::board::{BoardView, ops, partition};
use crate::error::StoreResult;
use crate::types::{ColumnId, MoveIntent, NewTask, Task, TaskId, TaskPatch, now_ms};
use tracing::{debug, warn};

/// A replayable optimistic change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert `record` at `index` of its column. Holds the placeholder
    /// until the store answers, then the canonical record.
    Create { record: Task, index: Option<u32> },
    Update { id: TaskId, patch: TaskPatch },
    Delete { id: TaskId },
    Move {
        id: TaskId,
        index: usize,
        column: Option<ColumnId>,
    },
}

impl Mutation {
    fn apply(&self, tasks: &mut Vec<Task>, now: i64) -> StoreResult<()> {
        match self {
            Mutation::Create { record, index } => {
                if !tasks.iter().any(|t| t.id == record.id) {
                    ops::insert_task(tasks, record.clone(), *index);
                }
                Ok(())
            }
            Mutation::Update { id, patch } => ops::update_task(tasks, *id, patch, now).map(drop),
            Mutation::Delete { id } => ops::remove_task(tasks, *id).map(drop),
            Mutation::Move { id, index, column } => {
                ops::move_task(tasks, *id, *index, *column, now).map(drop)
            }
        }
    }
}

/// Handle for one applied, not yet reconciled mutation.
///
/// Consumed by exactly one of commit, commit_create or rollback.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an applied mutation must be committed or rolled back"]
pub struct Ticket {
    seq: u64,
}

#[derive(Debug, Clone)]
struct Pending {
    seq: u64,
    mutation: Mutation,
    /// State immediately before `mutation` was applied.
    snapshot: Vec<Task>,
    settled: bool,
}

/// In-memory projection of the task collection.
#[derive(Debug, Clone)]
pub struct TaskCache {
    tasks: Vec<Task>,
    log: Vec<Pending>,
    next_seq: u64,
    next_placeholder: TaskId,
}

impl Default for TaskCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskCache {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            log: Vec::new(),
            next_seq: 1,
            next_placeholder: -1,
        }
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Self::new()
        }
    }

    /// Current projected collection.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Fresh per-column view of the current state.
    pub fn view(&self) -> BoardView {
        partition(&self.tasks)
    }

    /// Mutations applied but not yet reconciled.
    pub fn in_flight(&self) -> usize {
        self.log.iter().filter(|p| !p.settled).count()
    }

    pub fn is_placeholder(id: TaskId) -> bool {
        id < 0
    }

    /// Replace the collection with a freshly listed one and replay
    /// unsettled mutations on top of it.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.log.retain(|p| !p.settled);
        self.tasks = tasks;
        self.replay_from(0);
    }

    /// Optimistically insert a placeholder for `input`. Returns the
    /// placeholder's temporary id.
    pub fn begin_create(&mut self, input: &NewTask) -> (Ticket, TaskId) {
        let now = now_ms();
        let id = self.next_placeholder;
        self.next_placeholder -= 1;

        let record = Task {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            column: input.column,
            priority: input.priority.unwrap_or_default(),
            order: 0,
            created_at: now,
            updated_at: now,
        };
        let mutation = Mutation::Create {
            record,
            index: input.order,
        };
        let ticket = self.push(mutation, now);
        debug!(placeholder = id, column = %input.column, "Optimistic create applied");
        (ticket, id)
    }

    /// Optimistically apply `patch`. `None` if the task is unknown or
    /// still a placeholder.
    pub fn begin_update(&mut self, id: TaskId, patch: TaskPatch) -> Option<Ticket> {
        if !self.is_mutable(id) {
            return None;
        }
        debug!(task_id = id, "Optimistic update applied");
        Some(self.push(Mutation::Update { id, patch }, now_ms()))
    }

    /// Optimistically remove a task and repack its column.
    pub fn begin_delete(&mut self, id: TaskId) -> Option<Ticket> {
        if !self.is_mutable(id) {
            return None;
        }
        debug!(task_id = id, "Optimistic delete applied");
        Some(self.push(Mutation::Delete { id }, now_ms()))
    }

    /// Optimistically apply a move. `None` when the intent is invalid or
    /// would change nothing; no store call is needed then.
    pub fn begin_move(&mut self, intent: MoveIntent) -> Option<(Ticket, ReorderPlan)> {
        if !self.is_mutable(intent.task_id) {
            return None;
        }
        let plan = compute_reorder(
            &self.tasks,
            intent.task_id,
            intent.target_index,
            intent.target_column,
        )?;
        if plan.is_noop() {
            return None;
        }
        let mutation = Mutation::Move {
            id: intent.task_id,
            index: plan.index,
            column: Some(plan.to_column),
        };
        debug!(
            task_id = intent.task_id,
            from = %plan.from_column,
            to = %plan.to_column,
            index = plan.index,
            siblings = plan.changes.len().saturating_sub(1),
            "Optimistic move applied"
        );
        Some((self.push(mutation, now_ms()), plan))
    }

    /// The store accepted the mutation; the optimistic state stands.
    pub fn commit(&mut self, ticket: Ticket) {
        if let Some(entry) = self.log.iter_mut().find(|p| p.seq == ticket.seq) {
            entry.settled = true;
        }
        self.prune();
    }

    /// The store created the record: swap the placeholder for it.
    ///
    /// The canonical record is matched by the placeholder id. Placement
    /// keeps the cache's projection, which already includes any later
    /// in-flight moves.
    pub fn commit_create(&mut self, ticket: Ticket, canonical: Task) {
        let Some(position) = self.log.iter().position(|p| p.seq == ticket.seq) else {
            return;
        };
        if !matches!(self.log[position].mutation, Mutation::Create { .. }) {
            self.commit(ticket);
            return;
        }
        let mut placeholder = canonical.id;
        if let Mutation::Create { record, .. } = &mut self.log[position].mutation {
            placeholder = record.id;
            *record = canonical.clone();
        }

        adopt(&mut self.tasks, placeholder, &canonical);
        for later in &mut self.log[position + 1..] {
            adopt(&mut later.snapshot, placeholder, &canonical);
        }
        debug!(placeholder, task_id = canonical.id, "Placeholder replaced");
        self.commit(ticket);
    }

    /// The store rejected the mutation: restore its snapshot and replay
    /// everything applied after it.
    pub fn rollback(&mut self, ticket: Ticket) {
        let Some(position) = self.log.iter().position(|p| p.seq == ticket.seq) else {
            return;
        };
        let entry = self.log.remove(position);
        warn!(
            seq = entry.seq,
            mutation = ?entry.mutation,
            replayed = self.log.len() - position,
            "Store rejected mutation, rolling back"
        );
        self.tasks = entry.snapshot;
        self.replay_from(position);
        self.prune();
    }

    fn is_mutable(&self, id: TaskId) -> bool {
        !Self::is_placeholder(id) && self.get(id).is_some()
    }

    fn push(&mut self, mutation: Mutation, now: i64) -> Ticket {
        let seq = self.next_seq;
        self.next_seq += 1;

        let snapshot = self.tasks.clone();
        if let Err(e) = mutation.apply(&mut self.tasks, now) {
            debug!(error = %e, "Optimistic apply found nothing to change");
        }
        self.log.push(Pending {
            seq,
            mutation,
            snapshot,
            settled: false,
        });
        Ticket { seq }
    }

    /// Re-snapshot and re-apply log entries from `start` on top of the
    /// current state.
    fn replay_from(&mut self, start: usize) {
        let now = now_ms();
        for entry in &mut self.log[start..] {
            entry.snapshot = self.tasks.clone();
            if let Err(e) = entry.mutation.apply(&mut self.tasks, now) {
                debug!(seq = entry.seq, error = %e, "Replayed mutation no longer applies");
            }
        }
    }

    /// Drop settled entries from the front of the log. A settled entry
    /// behind an unsettled one stays so it can be replayed.
    fn prune(&mut self) {
        let settled = self.log.iter().take_while(|p| p.settled).count();
        self.log.drain(..settled);
    }
}

/// Swap the record with id `placeholder` for `canonical`, keeping its
/// placement.
///
/// A refresh that lands between the store write and its response already
/// lists the canonical row; the placeholder is then dropped instead.
fn adopt(tasks: &mut Vec<Task>, placeholder: TaskId, canonical: &Task) {
    if tasks.iter().any(|t| t.id == canonical.id) {
        if ops::remove_task(tasks, placeholder).is_ok() {
            debug!(placeholder, task_id = canonical.id, "Canonical record already listed");
        }
        return;
    }
    if let Some(task) = tasks.iter_mut().find(|t| t.id == placeholder) {
        let (column, order) = (task.column, task.order);
        *task = canonical.clone();
        task.column = column;
        task.order = order;
    }
}
