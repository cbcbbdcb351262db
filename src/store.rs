// Task store backed by a single SQLite file

use crate::error::{Result, StoreError};
use crate::task::{self, Task};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};

/// Default database filename, relative to the working directory.
pub const DEFAULT_DB_NAME: &str = "todo.db";

const SELECT_TASKS: &str = "SELECT id, task, deadline FROM task";

const TASK_COLUMNS: &str = "(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task TEXT NOT NULL,
    deadline DATE NOT NULL
)";

/// Durable task collection with date-scoped queries.
///
/// Owns one connection for its whole lifetime. Every mutating call runs in its
/// own transaction and is committed before it returns.
pub struct TaskStore {
    path: PathBuf,
    db: Connection,
}

impl TaskStore {
    /// Open or create a store at the given database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Connection::open(&path)?;

        let mut store = Self { path, db };
        store.create_schema()?;

        Ok(store)
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection, reporting any failure to flush.
    pub fn close(self) -> Result<()> {
        self.db.close().map_err(|(_, e)| StoreError::Storage(e))
    }

    fn create_schema(&mut self) -> Result<()> {
        let existing: Option<String> = self
            .db
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'task'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            None => self.db.execute_batch(&format!("CREATE TABLE task {};", TASK_COLUMNS))?,
            // Without AUTOINCREMENT SQLite hands the highest deleted id out again
            Some(sql) if !sql.to_ascii_uppercase().contains("AUTOINCREMENT") => self.migrate_legacy_table()?,
            Some(_) => {}
        }

        self.db
            .execute_batch("CREATE INDEX IF NOT EXISTS idx_task_deadline ON task(deadline, id);")?;

        Ok(())
    }

    /// Rebuild a `task` table created without AUTOINCREMENT, keeping its ids.
    ///
    /// Rows with a missing id, description or deadline, or ids shared by several
    /// rows, abort the migration with `Integrity` and leave the file untouched.
    fn migrate_legacy_table(&mut self) -> Result<()> {
        let tx = self.db.transaction()?;

        let incomplete: i64 = tx.query_row(
            "SELECT COUNT(*) FROM task WHERE id IS NULL OR task IS NULL OR deadline IS NULL",
            [],
            |row| row.get(0),
        )?;
        if incomplete > 0 {
            return Err(StoreError::Integrity(format!(
                "{} task rows lack an id, description or deadline",
                incomplete
            )));
        }

        let duplicated: i64 = tx.query_row(
            "SELECT COUNT(*) FROM (SELECT id FROM task GROUP BY id HAVING COUNT(*) > 1)",
            [],
            |row| row.get(0),
        )?;
        if duplicated > 0 {
            return Err(StoreError::Integrity(format!("{} task ids are shared by several rows", duplicated)));
        }

        tx.execute_batch(&format!(
            r#"
            CREATE TABLE task_migrated {};
            INSERT INTO task_migrated (id, task, deadline) SELECT id, task, deadline FROM task ORDER BY id;
            DROP TABLE task;
            ALTER TABLE task_migrated RENAME TO task;
            "#,
            TASK_COLUMNS
        ))?;

        tx.commit()?;
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a new task and return it with its assigned id
    pub fn create(&mut self, description: &str, deadline: NaiveDate) -> Result<Task> {
        task::validate(description, deadline)?;

        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT INTO task (task, deadline) VALUES (?1, ?2)",
            params![description, deadline],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Task {
            id,
            description: description.to_string(),
            deadline,
        })
    }

    /// Delete the task with the given id
    ///
    /// Fails with `NotFound` when no such task exists; nothing is changed in that case.
    pub fn delete_by_id(&mut self, id: i64) -> Result<()> {
        let tx = self.db.transaction()?;

        // Look the task up first so a missing id is reported as such
        fetch_one(&tx, id)?;
        tx.execute("DELETE FROM task WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get a task by id
    pub fn get_by_id(&self, id: i64) -> Result<Task> {
        fetch_one(&self.db, id)
    }

    /// All tasks due exactly on `day`, in creation order
    pub fn get_by_exact_date(&self, day: NaiveDate) -> Result<Vec<Task>> {
        query_tasks(
            &self.db,
            &format!("{} WHERE deadline = ?1 ORDER BY id", SELECT_TASKS),
            params![day],
        )
    }

    /// All tasks due strictly before `reference_day`, earliest first
    pub fn get_overdue(&self, reference_day: NaiveDate) -> Result<Vec<Task>> {
        query_tasks(
            &self.db,
            &format!("{} WHERE deadline < ?1 ORDER BY deadline, id", SELECT_TASKS),
            params![reference_day],
        )
    }

    /// Every task, ascending by deadline with ties in creation order
    pub fn get_all_ordered_by_deadline(&self) -> Result<Vec<Task>> {
        query_tasks(&self.db, &format!("{} ORDER BY deadline, id", SELECT_TASKS), [])
    }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        description: row.get(1)?,
        deadline: row.get(2)?,
    })
}

fn query_tasks<P: rusqlite::Params>(db: &Connection, sql: &str, params: P) -> Result<Vec<Task>> {
    let mut stmt = db.prepare(sql)?;
    let rows = stmt.query_map(params, row_to_task)?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?);
    }
    Ok(tasks)
}

fn fetch_one(db: &Connection, id: i64) -> Result<Task> {
    let mut matches = query_tasks(db, &format!("{} WHERE id = ?1", SELECT_TASKS), params![id])?;

    match matches.len() {
        0 => Err(StoreError::not_found(id)),
        1 => Ok(matches.remove(0)),
        n => Err(StoreError::Integrity(format!("{} rows share task id {}", n, id))),
    }
}
