//! Durable key-value slot shared by every open context.
//!
//! # Responsibility
//! - Define the key-value contract the persistence adapter writes through.
//! - Report writes made by *other* contexts as `StorageEvent`s.
//!
//! # Invariants
//! - A context never receives events for its own writes.
//! - Writes overwrite the previous value wholesale (last write wins).
//! - Revisions are unique across the whole store, so a key that disappears
//!   and comes back never reuses a revision a context has already seen.
//! - Each slot handle is one context; handles opened on the same backing
//!   store observe each other.

use crate::db::DbError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemorySlot;
pub use sqlite::SqliteSlot;

pub type SlotResult<T> = Result<T, SlotError>;

/// Slot-level failure.
#[derive(Debug)]
pub enum SlotError {
    Db(DbError),
    /// Backing store refused the write (for example a full disk or quota).
    Unavailable(String),
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for SlotError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SlotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Notification that another context changed (or removed) `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
}

/// Key-value storage contract used by the persistence adapter.
pub trait DurableSlot {
    fn get(&self, key: &str) -> SlotResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> SlotResult<()>;
    /// Drains changes made by other contexts since the previous poll.
    fn poll_events(&self) -> SlotResult<Vec<StorageEvent>>;
}

/// One row of the backing store as seen by a poll.
#[derive(Debug, Clone)]
pub(crate) struct RevisionRow {
    pub key: String,
    pub revision: i64,
    pub foreign: bool,
}

/// Per-context memory of the last revision seen for every key.
#[derive(Debug, Default)]
pub(crate) struct RevisionLog {
    seen: BTreeMap<String, i64>,
}

impl RevisionLog {
    /// Seeds the log so values present at open time are not reported.
    pub fn from_rows(rows: impl IntoIterator<Item = RevisionRow>) -> Self {
        Self {
            seen: rows
                .into_iter()
                .map(|row| (row.key, row.revision))
                .collect(),
        }
    }

    pub fn record_own(&mut self, key: &str, revision: i64) {
        self.seen.insert(key.to_string(), revision);
    }

    /// Diffs a full snapshot of the store against what this context saw last.
    pub fn observe(&mut self, rows: Vec<RevisionRow>) -> Vec<StorageEvent> {
        let mut events = Vec::new();
        let mut current = BTreeMap::new();

        for row in rows {
            let changed = self.seen.get(&row.key) != Some(&row.revision);
            if changed && row.foreign {
                events.push(StorageEvent {
                    key: row.key.clone(),
                });
            }
            current.insert(row.key, row.revision);
        }

        for key in self.seen.keys() {
            if !current.contains_key(key) {
                events.push(StorageEvent { key: key.clone() });
            }
        }

        self.seen = current;
        events.sort_by(|left, right| left.key.cmp(&right.key));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::{RevisionLog, RevisionRow};

    fn row(key: &str, revision: i64, foreign: bool) -> RevisionRow {
        RevisionRow {
            key: key.to_string(),
            revision,
            foreign,
        }
    }

    #[test]
    fn observe_reports_foreign_changes_and_removals_only() {
        let mut log = RevisionLog::from_rows(vec![row("a", 1, true), row("b", 1, true)]);
        log.record_own("c", 4);

        let events = log.observe(vec![row("a", 2, true), row("c", 5, false)]);
        let keys: Vec<_> = events.iter().map(|event| event.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn observe_reports_key_that_returns_after_removal() {
        let mut log = RevisionLog::from_rows(vec![row("a", 1, true)]);

        assert_eq!(log.observe(Vec::new()).len(), 1);
        let events = log.observe(vec![row("a", 2, true)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, "a");
    }

    #[test]
    fn observe_is_quiet_when_nothing_moved() {
        let mut log = RevisionLog::from_rows(vec![row("a", 3, true)]);
        assert!(log.observe(vec![row("a", 3, true)]).is_empty());
    }
}
