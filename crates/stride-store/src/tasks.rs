use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Maximum title length in characters, after trimming.
pub const TITLE_MAX: usize = 200;
/// Maximum description length in characters, after trimming.
pub const DESCRIPTION_MAX: usize = 1000;

/// Timezone-naive UTC, second precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single to-do record. Fixed shape: every front end (CLI, GUI shell,
/// forwarders) consumes these fields by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

/// The four core operations against the tasks table.
///
/// Owns the storage handle; callers never touch the file directly.
pub struct TaskRepo {
    db: Database,
}

impl TaskRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new pending task and return its assigned id.
    ///
    /// Ids are AUTOINCREMENT rowids: strictly increasing in creation order,
    /// never reused. Inputs are stored trimmed.
    #[instrument(skip(self, title, description))]
    pub fn add(&self, title: &str, description: &str) -> Result<i64, StoreError> {
        let title = title.trim();
        let description = description.trim();

        if title.is_empty() {
            return Err(StoreError::Validation {
                field: "title",
                reason: "required".to_string(),
            });
        }
        if title.chars().count() > TITLE_MAX {
            return Err(StoreError::Validation {
                field: "title",
                reason: format!("longer than {TITLE_MAX} characters"),
            });
        }
        if description.chars().count() > DESCRIPTION_MAX {
            return Err(StoreError::Validation {
                field: "description",
                reason: format!("longer than {DESCRIPTION_MAX} characters"),
            });
        }

        let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (title, description, completed, created_at)
                 VALUES (?1, ?2, 0, ?3)",
                rusqlite::params![title, description, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Full snapshot: pending tasks first, newest first within each group.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, completed, created_at FROM tasks
                 ORDER BY completed ASC, created_at DESC, id DESC",
            )?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_task(row)?);
            }
            Ok(results)
        })
    }

    /// Case-insensitive substring match against title or description.
    /// Pure read: never mutates state. Same ordering as `list`.
    #[instrument(skip(self))]
    pub fn search(&self, keyword: &str) -> Result<Vec<Task>, StoreError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(StoreError::Validation {
                field: "keyword",
                reason: "required".to_string(),
            });
        }

        // LIKE folds case on both sides (ASCII); non-ASCII text matches
        // verbatim, same as the raw pattern would
        let pattern = format!("%{}%", row_helpers::escape_like(keyword));

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, completed, created_at FROM tasks
                 WHERE title LIKE ?1 ESCAPE '\\'
                    OR description LIKE ?1 ESCAPE '\\'
                 ORDER BY completed ASC, created_at DESC, id DESC",
            )?;
            let mut rows = stmt.query([&pattern])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_task(row)?);
            }
            Ok(results)
        })
    }

    /// Mark a task complete and return its new state.
    ///
    /// Idempotent: completing an already-completed task succeeds and leaves
    /// the row unchanged. `created_at` is never touched.
    #[instrument(skip(self))]
    pub fn complete(&self, id: i64) -> Result<Task, StoreError> {
        self.db.with_conn(|conn| {
            let updated = conn.execute("UPDATE tasks SET completed = 1 WHERE id = ?1", [id])?;
            if updated == 0 {
                return Err(StoreError::NotFound { id });
            }

            let mut stmt = conn.prepare(
                "SELECT id, title, description, completed, created_at FROM tasks
                 WHERE id = ?1",
            )?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => row_to_task(row),
                None => Err(StoreError::NotFound { id }),
            }
        })
    }

    /// Fetch a single task by id.
    #[instrument(skip(self))]
    pub fn get(&self, id: i64) -> Result<Task, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, completed, created_at FROM tasks
                 WHERE id = ?1",
            )?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => row_to_task(row),
                None => Err(StoreError::NotFound { id }),
            }
        })
    }
}

/// Decode one row into a Task. Kept next to the queries that produce it so
/// a schema change only touches this file.
fn row_to_task(row: &rusqlite::Row<'_>) -> Result<Task, StoreError> {
    let created_raw: String = row_helpers::get(row, 4, "tasks", "created_at")?;
    let created_at = NaiveDateTime::parse_from_str(&created_raw, TIMESTAMP_FORMAT).map_err(
        |e| StoreError::CorruptRow {
            table: "tasks",
            column: "created_at",
            detail: format!("invalid timestamp: {e}"),
        },
    )?;

    Ok(Task {
        id: row_helpers::get(row, 0, "tasks", "id")?,
        title: row_helpers::get(row, 1, "tasks", "title")?,
        description: row_helpers::get(row, 2, "tasks", "description")?,
        completed: row_helpers::get(row, 3, "tasks", "completed")?,
        created_at,
    })
}
