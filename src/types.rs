//! Core types for the kanban board.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task identifier.
///
/// Positive values are assigned by the store and never reused. Negative
/// values are optimistic placeholders handed out by the cache.
pub type TaskId = i64;

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One of the four fixed workflow columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnId {
    Backlog,
    InProgress,
    Review,
    Done,
}

impl ColumnId {
    /// All columns in display order.
    pub const ALL: [ColumnId; 4] = [
        ColumnId::Backlog,
        ColumnId::InProgress,
        ColumnId::Review,
        ColumnId::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnId::Backlog => "backlog",
            ColumnId::InProgress => "in_progress",
            ColumnId::Review => "review",
            ColumnId::Done => "done",
        }
    }

    /// Human-readable column header.
    pub fn title(&self) -> &'static str {
        match self {
            ColumnId::Backlog => "Backlog",
            ColumnId::InProgress => "In Progress",
            ColumnId::Review => "Review",
            ColumnId::Done => "Done",
        }
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(ColumnId::Backlog),
            "in_progress" => Ok(ColumnId::InProgress),
            "review" => Ok(ColumnId::Review),
            "done" => Ok(ColumnId::Done),
            other => Err(format!(
                "unknown column '{}' (expected backlog, in_progress, review or done)",
                other
            )),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Capitalized label ("High", "Medium", "Low").
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!(
                "unknown priority '{}' (expected high, medium or low)",
                other
            )),
        }
    }
}

/// A task on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub column: ColumnId,
    pub priority: Priority,
    /// Zero-based rank within `column`.
    pub order: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub column: ColumnId,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Insertion index within `column`. Defaults to the top of the column.
    #[serde(default)]
    pub order: Option<u32>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, column: ColumnId) -> Self {
        Self {
            title: title.into(),
            description: None,
            column,
            priority: None,
            order: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }
}

/// Partial update of a task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub column: Option<ColumnId>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub order: Option<u32>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.column.is_none()
            && self.priority.is_none()
            && self.order.is_none()
    }

    /// Apply the non-placement fields to `task`.
    pub fn apply_fields(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
    }
}

/// Distinguishes an absent `description` from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            None => serializer.serialize_none(),
            Some(inner) => inner.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

/// The resolved outcome of one completed drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub task_id: TaskId,
    /// Index within the destination column.
    pub target_index: usize,
    /// Destination column; `None` keeps the task in its current column.
    pub target_column: Option<ColumnId>,
}

/// What the pointer is over during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    /// A column body or header.
    Column(ColumnId),
    /// Another task card.
    TaskRow(TaskId),
    None,
}
