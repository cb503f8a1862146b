//! SQLite-backed durable slot.
//!
//! # Responsibility
//! - Store key-value pairs in the `kv_store` table.
//! - Detect writes from other connections through `PRAGMA data_version`.
//!
//! # Invariants
//! - Every write takes the next value of the store-wide `kv_clock` as the
//!   row `revision` and stamps this context as `writer`; revisions never
//!   repeat, even for a key that was deleted and written again.
//! - `data_version` only moves for commits made by other connections, so a
//!   context's own writes never wake its poll.

use super::{DurableSlot, RevisionLog, RevisionRow, SlotResult, StorageEvent};
use crate::db::{open_db, DbResult};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::path::Path;
use uuid::Uuid;

/// Durable slot over one SQLite connection.
pub struct SqliteSlot {
    conn: Connection,
    context_id: String,
    last_data_version: Cell<i64>,
    revisions: RefCell<RevisionLog>,
}

impl SqliteSlot {
    /// Opens (and migrates) the database at `path` as a new context.
    pub fn open(path: impl AsRef<Path>) -> SlotResult<Self> {
        let conn = open_db(path)?;
        Self::new(conn)
    }

    fn new(conn: Connection) -> SlotResult<Self> {
        let context_id = Uuid::new_v4().to_string();
        let data_version = read_data_version(&conn)?;
        let rows = read_revision_rows(&conn, &context_id)?;

        info!(
            "event=slot_open module=slot status=ok backend=sqlite context_id={} keys={}",
            context_id,
            rows.len()
        );

        Ok(Self {
            conn,
            context_id,
            last_data_version: Cell::new(data_version),
            revisions: RefCell::new(RevisionLog::from_rows(rows)),
        })
    }

    /// Identifier stamped on rows written by this context.
    pub fn context_id(&self) -> &str {
        self.context_id.as_str()
    }
}

impl DurableSlot for SqliteSlot {
    fn get(&self, key: &str) -> SlotResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> SlotResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let revision: i64 = tx.query_row(
            "UPDATE kv_clock SET revision = revision + 1 WHERE id = 1 RETURNING revision;",
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO kv_store (key, value, revision, writer, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                revision = excluded.revision,
                writer = excluded.writer,
                updated_at = excluded.updated_at;",
            params![
                key,
                value,
                revision,
                self.context_id.as_str(),
                chrono::Utc::now().timestamp_millis()
            ],
        )?;
        tx.commit()?;

        self.revisions.borrow_mut().record_own(key, revision);
        debug!(
            "event=slot_write module=slot status=ok backend=sqlite key={} revision={} bytes={}",
            key,
            revision,
            value.len()
        );
        Ok(())
    }

    fn poll_events(&self) -> SlotResult<Vec<StorageEvent>> {
        let data_version = read_data_version(&self.conn)?;
        if data_version == self.last_data_version.get() {
            return Ok(Vec::new());
        }
        self.last_data_version.set(data_version);

        let rows = read_revision_rows(&self.conn, &self.context_id)?;
        let events = self.revisions.borrow_mut().observe(rows);
        if !events.is_empty() {
            debug!(
                "event=slot_poll module=slot status=ok backend=sqlite changed_keys={}",
                events.len()
            );
        }
        Ok(events)
    }
}

fn read_data_version(conn: &Connection) -> DbResult<i64> {
    let version = conn.query_row("PRAGMA data_version;", [], |row| row.get(0))?;
    Ok(version)
}

fn read_revision_rows(conn: &Connection, context_id: &str) -> DbResult<Vec<RevisionRow>> {
    let mut stmt = conn.prepare("SELECT key, revision, writer FROM kv_store ORDER BY key;")?;
    let mut rows = stmt.query([])?;
    let mut revisions = Vec::new();

    while let Some(row) = rows.next()? {
        let writer: String = row.get("writer")?;
        revisions.push(RevisionRow {
            key: row.get("key")?,
            revision: row.get("revision")?,
            foreign: writer != context_id,
        });
    }

    Ok(revisions)
}
