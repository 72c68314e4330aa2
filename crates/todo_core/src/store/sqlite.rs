//! SQLite-backed task store.
//!
//! # Responsibility
//! - Persist tasks in the migrated `tasks` table.
//! - Wrap each mutation in an immediate write transaction.
//! - Publish refreshed snapshots to live queries after each commit.
//!
//! # Invariants
//! - `uuid` and `created_at` never change after insert.
//! - Snapshot ordering ties are broken by `rowid` in the query direction.
//! - Publishing never fails a write that already committed.

use super::live::{
    LiveTasks, SortDirection, SortField, SubscriberRegistry, Subscription, TaskQuery,
    TaskSnapshot,
};
use super::{StoreError, StoreResult, TaskStore};
use crate::config::{StoreConfig, StoreLocation};
use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory};
use crate::model::task::{NewTask, Task, TaskId};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT uuid, description, is_complete, created_at FROM tasks";

const REQUIRED_COLUMNS: [&str; 4] = ["uuid", "description", "is_complete", "created_at"];

/// Task store owning one migrated SQLite connection.
///
/// Not `Sync`: one instance per process, driven from the UI event loop.
pub struct SqliteTaskStore {
    conn: Connection,
    registry: Rc<RefCell<SubscriberRegistry>>,
    revision: Cell<u64>,
}

impl SqliteTaskStore {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` for foreign layouts.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(&conn)?;
        Ok(Self {
            conn,
            registry: Rc::new(RefCell::new(SubscriberRegistry::default())),
            revision: Cell::new(0),
        })
    }

    /// Opens (and migrates) the database described by `config`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let conn = match &config.location {
            StoreLocation::File(path) => open_db(path)?,
            StoreLocation::InMemory => open_db_in_memory()?,
        };
        Self::try_new(conn)
    }

    /// Raw connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of writes committed through this store instance.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Number of live queries currently registered.
    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().len()
    }

    fn write_tx(&self) -> StoreResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn after_commit(&self, event: &str, task_id: TaskId, started_at: Instant) {
        let revision = self.revision.get() + 1;
        self.revision.set(revision);
        info!(
            "event={event} module=store status=ok task_id={task_id} revision={revision} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        self.publish(revision);
    }

    fn publish(&self, revision: u64) {
        let queries = self.registry.borrow().active_queries();
        if queries.is_empty() {
            return;
        }

        let mut snapshots = BTreeMap::new();
        for query in queries {
            match self.fetch(&query) {
                Ok(tasks) => {
                    snapshots.insert(query, TaskSnapshot { revision, tasks });
                }
                Err(err) => warn!(
                    "event=live_query_publish module=store status=error revision={revision} error={err}"
                ),
            }
        }
        self.registry.borrow_mut().deliver(&snapshots);
    }
}

impl TaskStore for SqliteTaskStore {
    fn create(&self, fields: NewTask) -> StoreResult<Task> {
        fields.validate()?;
        let started_at = Instant::now();
        let task = fields.into_task();

        let tx = self.write_tx()?;
        let inserted = tx.execute(
            "INSERT INTO tasks (uuid, description, is_complete, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(uuid) DO NOTHING;",
            params![
                task.uuid.to_string(),
                task.description.as_str(),
                bool_to_int(task.is_complete),
                task.created_at,
            ],
        )?;
        if inserted == 0 {
            return Err(StoreError::DuplicateId(task.uuid));
        }
        tx.commit()?;

        self.after_commit("task_create", task.uuid, started_at);
        Ok(task)
    }

    fn update<F>(&self, task: &Task, mutator: F) -> StoreResult<Task>
    where
        F: FnOnce(&mut Task),
    {
        let started_at = Instant::now();
        let tx = self.write_tx()?;
        let mut current =
            load_task(&tx, task.uuid)?.ok_or(StoreError::Invalidated(task.uuid))?;
        let original_id = current.uuid;
        let original_created_at = current.created_at;

        mutator(&mut current);

        if current.uuid != original_id {
            return Err(StoreError::ImmutableField("uuid"));
        }
        if current.created_at != original_created_at {
            return Err(StoreError::ImmutableField("created_at"));
        }
        current.validate()?;

        tx.execute(
            "UPDATE tasks SET description = ?1, is_complete = ?2 WHERE uuid = ?3;",
            params![
                current.description.as_str(),
                bool_to_int(current.is_complete),
                current.uuid.to_string(),
            ],
        )?;
        tx.commit()?;

        self.after_commit("task_update", current.uuid, started_at);
        Ok(current)
    }

    fn delete(&self, task: &Task) -> StoreResult<()> {
        let started_at = Instant::now();
        let tx = self.write_tx()?;
        let removed = tx.execute("DELETE FROM tasks WHERE uuid = ?1;", [task.uuid.to_string()])?;
        if removed == 0 {
            return Err(StoreError::Invalidated(task.uuid));
        }
        tx.commit()?;

        self.after_commit("task_delete", task.uuid, started_at);
        Ok(())
    }

    fn query(&self, query: TaskQuery) -> StoreResult<LiveTasks> {
        let (id, receiver) = self.registry.borrow_mut().register(query);
        // Guard first so a failed initial fetch still deregisters.
        let subscription = Subscription::new(id, Rc::downgrade(&self.registry));
        let snapshot = TaskSnapshot {
            revision: self.revision.get(),
            tasks: self.fetch(&query)?,
        };
        Ok(LiveTasks::new(query, snapshot, receiver, subscription))
    }

    fn fetch(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let column = match query.sort.field {
            SortField::CreatedAt => "created_at",
            SortField::Description => "description",
            SortField::IsComplete => "is_complete",
        };
        let direction = match query.sort.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };

        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL} ORDER BY {column} {direction}, rowid {direction};"
        ))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn is_valid(&self, task: &Task) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE uuid = ?1);",
            [task.uuid.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn load_task(conn: &Connection, id: TaskId) -> StoreResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
    let task = stmt
        .query_row([id.to_string()], |row| Ok(parse_task_row(row)))
        .optional()?;
    task.transpose()
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{uuid_text}` in tasks.uuid"))
    })?;

    let is_complete = match row.get::<_, i64>("is_complete")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_complete value `{other}` in tasks.is_complete"
            )));
        }
    };

    let task = Task {
        uuid,
        description: row.get("description")?,
        is_complete,
        created_at: row.get("created_at")?,
    };
    task.validate()?;
    Ok(task)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "tasks")? {
        return Err(StoreError::MissingRequiredTable("tasks"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "tasks", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "tasks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
