//! Kanban board server and CLI.

use anyhow::{Result, bail};
use clap::Parser;
use kanban_board::cli::{BoardFormat, Cli, Command};
use kanban_board::config::Config;
use kanban_board::controller::BoardController;
use kanban_board::db::Database;
use kanban_board::format::{format_board_json, format_board_text, format_task_text};
use kanban_board::logging::{self, LogTarget};
use kanban_board::server;
use kanban_board::types::MoveIntent;
use std::sync::Arc;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.clone();
    }
    debug!(?config, "Configuration resolved");

    config.ensure_db_dir()?;
    let db = Arc::new(Database::open(&config.server.db_path)?);

    match cli.command {
        Some(Command::Serve { port }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(&config.server, db).await?;
        }
        None => server::serve(&config.server, db).await?,
        Some(Command::Board { format, query }) => {
            let board = controller(db, &config).await;
            let view = board.search(query.as_deref().unwrap_or_default());
            match format {
                BoardFormat::Text => print!("{}", format_board_text(&view)),
                BoardFormat::Json => println!("{}", format_board_json(&view)?),
            }
        }
        Some(Command::Add(args)) => {
            let board = controller(db, &config).await;
            let task = board.create(args.into()).await?;
            print!("{}", format_task_text(&task));
        }
        Some(Command::Edit(args)) => {
            let patch = args.patch();
            if patch.is_empty() {
                bail!("Nothing to change; pass at least one field to edit");
            }
            let board = controller(db, &config).await;
            let task = board.update(args.id, patch).await?;
            print!("{}", format_task_text(&task));
        }
        Some(Command::Move { id, order, column }) => {
            let board = controller(db, &config).await;
            let intent = MoveIntent {
                task_id: id,
                target_index: order as usize,
                target_column: column,
            };
            match board.submit_move(intent).await? {
                Some(task) => print!("{}", format_task_text(&task)),
                None => println!("Task #{} is already in place", id),
            }
        }
        Some(Command::Delete { id }) => {
            let board = controller(db, &config).await;
            board.delete(id).await?;
            println!("Deleted task #{}", id);
        }
        Some(Command::Seed) => {
            let count = db.seed_sample_tasks()?;
            println!("Seeded {} tasks", count);
        }
        Some(Command::Repack) => {
            let changed = db.repack_by_created_at()?;
            println!("Repacked board ({} tasks renumbered)", changed);
        }
    }

    Ok(())
}

/// Board controller over `db`, loaded with the current tasks.
async fn controller(db: Arc<Database>, config: &Config) -> BoardController<Database> {
    let board = BoardController::new(db)
        .with_activation_distance(config.board.activation_distance_px);
    board.refresh().await;
    board
}
