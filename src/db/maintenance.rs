//! Seeding and order maintenance.

use super::Database;
use crate::types::{ColumnId, Priority, now_ms};
use anyhow::Result;
use rusqlite::params;
use tracing::{debug, info};

/// Sample board: (title, description, column, priority, order).
pub const SAMPLE_TASKS: [(&str, &str, ColumnId, Priority, u32); 15] = [
    ("Design homepage", "Include hero section", ColumnId::Backlog, Priority::High, 0),
    ("Setup database", "Configure database connection", ColumnId::Done, Priority::High, 0),
    ("Create API routes", "Implement CRUD endpoints", ColumnId::InProgress, Priority::Medium, 0),
    ("Write unit tests", "Test core functionality", ColumnId::Backlog, Priority::Low, 1),
    ("Design user profile", "Create profile page layout", ColumnId::Backlog, Priority::Medium, 2),
    ("Implement authentication", "Add login/register", ColumnId::InProgress, Priority::High, 1),
    ("Code review PR #123", "Review and provide feedback", ColumnId::Review, Priority::Medium, 0),
    ("Update documentation", "Add API docs", ColumnId::Done, Priority::Low, 1),
    ("Fix navigation bug", "Mobile menu not closing", ColumnId::Backlog, Priority::High, 3),
    ("Optimize images", "Compress and lazy load", ColumnId::Backlog, Priority::Low, 4),
    ("Setup CI/CD", "Configure GitHub Actions", ColumnId::InProgress, Priority::Medium, 2),
    ("Review analytics", "Check user metrics", ColumnId::Review, Priority::Low, 1),
    ("Design email templates", "Create welcome email", ColumnId::Backlog, Priority::Medium, 5),
    ("Deploy to staging", "Test staging environment", ColumnId::Done, Priority::High, 2),
    ("User feedback session", "Gather user feedback", ColumnId::Review, Priority::Medium, 2),
];

impl Database {
    /// Replace every task with the sample board. Returns the number of
    /// tasks inserted.
    pub fn seed_sample_tasks(&self) -> Result<usize> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let cleared = tx.execute("DELETE FROM tasks", [])?;
            info!(cleared, "Cleared existing tasks");

            for (title, description, column, priority, order) in SAMPLE_TASKS {
                tx.execute(
                    "INSERT INTO tasks (title, description, column_id, priority, sort_order, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![title, description, column.as_str(), priority.as_str(), order, now],
                )?;
            }

            tx.commit()?;
            info!(count = SAMPLE_TASKS.len(), "Seed completed");
            Ok(SAMPLE_TASKS.len())
        })
    }

    /// Renumber every column `0..len` by creation time. Returns the number
    /// of tasks whose order changed.
    pub fn repack_by_created_at(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut changed = 0;

            for column in ColumnId::ALL {
                let rows = {
                    let mut stmt = tx.prepare(
                        "SELECT id, title, sort_order FROM tasks
                         WHERE column_id = ?1
                         ORDER BY created_at, id",
                    )?;
                    stmt.query_map(params![column.as_str()], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, u32>(2)?,
                        ))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?
                };
                info!(column = %column, tasks = rows.len(), "Repacking column");

                for (index, (id, title, order)) in rows.into_iter().enumerate() {
                    let index = index as u32;
                    if order == index {
                        continue;
                    }
                    tx.execute(
                        "UPDATE tasks SET sort_order = ?1 WHERE id = ?2",
                        params![index, id],
                    )?;
                    debug!(task_id = id, title = %title, from = order, to = index, "Order updated");
                    changed += 1;
                }
            }

            tx.commit()?;
            info!(changed, "Repack completed");
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::partition;

    #[test]
    fn test_seed_builds_dense_board() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.seed_sample_tasks().unwrap(), 15);

        let view = partition(&db.list_tasks().unwrap());
        assert_eq!(view.backlog.len(), 6);
        assert_eq!(view.in_progress.len(), 3);
        assert_eq!(view.review.len(), 3);
        assert_eq!(view.done.len(), 3);
        assert!(view.is_dense());
        assert_eq!(view.backlog[0].title, "Design homepage");
    }

    #[test]
    fn test_seed_replaces_existing_tasks() {
        let db = Database::open_in_memory().unwrap();
        db.seed_sample_tasks().unwrap();
        db.seed_sample_tasks().unwrap();
        assert_eq!(db.list_tasks().unwrap().len(), 15);
    }

    #[test]
    fn test_repack_orders_by_creation_time() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            for (title, order, created) in [("Second", 7, 20), ("First", 7, 10), ("Third", 2, 30)] {
                conn.execute(
                    "INSERT INTO tasks (title, column_id, priority, sort_order, created_at, updated_at)
                     VALUES (?1, 'review', 'low', ?2, ?3, ?3)",
                    params![title, order, created],
                )?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(db.repack_by_created_at().unwrap(), 2);

        let review = partition(&db.list_tasks().unwrap()).review;
        let titles: Vec<_> = review.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
        assert_eq!(db.repack_by_created_at().unwrap(), 0);
    }
}
