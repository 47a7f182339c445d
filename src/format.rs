//! Output formatting for the board and single tasks.

use crate::board::BoardView;
use crate::types::{Priority, Task};

/// Render the board as text, one section per column in display order.
pub fn format_board_text(view: &BoardView) -> String {
    let mut out = String::new();

    for (column, tasks) in view.columns() {
        out.push_str(&format!("## {} ({})\n", column.title(), tasks.len()));
        for task in tasks {
            out.push_str(&format_task_short(task));
        }
        out.push('\n');
    }

    out
}

/// Render the board as pretty JSON keyed by column.
pub fn format_board_json(view: &BoardView) -> serde_json::Result<String> {
    serde_json::to_string_pretty(view)
}

/// Format a task in short form for lists.
fn format_task_short(task: &Task) -> String {
    let priority_marker = match task.priority {
        Priority::High => "!!! ",
        Priority::Medium | Priority::Low => "",
    };

    let description = task
        .description
        .as_ref()
        .map(|d| format!(" - _{}_", d))
        .unwrap_or_default();

    format!(
        "{:>3}. {}{} `#{}` [{}]{}\n",
        task.order,
        priority_marker,
        task.title,
        task.id,
        task.priority.label(),
        description,
    )
}

/// Format a single task with all its fields.
pub fn format_task_text(task: &Task) -> String {
    let mut out = String::new();

    out.push_str(&format!("Task #{}: {}\n", task.id, task.title));
    out.push_str(&format!("- column: {}\n", task.column.title()));
    out.push_str(&format!("- position: {}\n", task.order));
    out.push_str(&format!("- priority: {}\n", task.priority.label()));

    if let Some(ref desc) = task.description {
        out.push_str(&format!("- description: {}\n", desc));
    }

    out
}
