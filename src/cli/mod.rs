//! CLI command definitions for kanban-board
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::types::{ColumnId, NewTask, Priority, TaskId, TaskPatch};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for the `board` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BoardFormat {
    #[default]
    Text,
    Json,
}

/// Kanban board server and CLI tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API (default if no subcommand given)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the board
    Board {
        #[arg(short, long, value_enum, default_value_t = BoardFormat::Text)]
        format: BoardFormat,

        /// Only show tasks whose title or description contains this text
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Create a task
    Add(AddArgs),

    /// Edit a task's fields
    Edit(EditArgs),

    /// Move a task to a position, optionally in another column
    Move {
        id: TaskId,

        /// Target position within the column, starting at 0
        #[arg(short, long)]
        order: u32,

        #[arg(long)]
        column: Option<ColumnId>,
    },

    /// Delete a task
    Delete { id: TaskId },

    /// Replace all tasks with the sample board
    Seed,

    /// Renumber every column by creation time
    Repack,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(short, long)]
    pub title: String,

    #[arg(long, default_value = "backlog")]
    pub column: ColumnId,

    #[arg(short, long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub description: Option<String>,

    /// Insert at this position instead of the top of the column
    #[arg(short, long)]
    pub order: Option<u32>,
}

impl From<AddArgs> for NewTask {
    fn from(args: AddArgs) -> Self {
        NewTask {
            title: args.title,
            description: args.description,
            column: args.column,
            priority: args.priority,
            order: args.order,
        }
    }
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: TaskId,

    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    /// Remove the description
    #[arg(long)]
    pub clear_description: bool,

    /// Move to another column (appended at the end)
    #[arg(long)]
    pub column: Option<ColumnId>,

    #[arg(short, long)]
    pub priority: Option<Priority>,
}

impl EditArgs {
    pub fn patch(&self) -> TaskPatch {
        let description = if self.clear_description {
            Some(None)
        } else {
            self.description.clone().map(Some)
        };
        TaskPatch {
            title: self.title.clone(),
            description,
            column: self.column,
            priority: self.priority,
            order: None,
        }
    }
}
