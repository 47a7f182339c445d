//! Kanban board library.
//!
//! Drag-and-drop ordering, cross-column moves and an optimistic task cache
//! with rollback, over a pluggable task store (SQLite or in-memory).

pub mod board;
pub mod cache;
pub mod cli;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod server;
pub mod store;
pub mod types;
pub mod validation;
