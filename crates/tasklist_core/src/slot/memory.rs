//! In-process durable slot.
//!
//! Handles created with [`MemorySlot::connect`] share one store and behave
//! like separate contexts, which lets cross-context sync run without a
//! database file. Write failures can be injected to exercise the
//! persistence-failure path.

use super::{DurableSlot, RevisionLog, RevisionRow, SlotError, SlotResult, StorageEvent};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug)]
struct Entry {
    value: String,
    revision: i64,
    writer: u64,
}

#[derive(Debug, Default)]
struct SharedStore {
    entries: BTreeMap<String, Entry>,
    /// Bumped on every committed change, like SQLite's `data_version`.
    version: u64,
    /// Source of row revisions, shared by every key like `kv_clock`.
    clock: i64,
    next_context: u64,
    fail_writes: Option<String>,
}

impl SharedStore {
    fn next_revision(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

/// One context over a shared in-memory store.
#[derive(Debug)]
pub struct MemorySlot {
    store: Rc<RefCell<SharedStore>>,
    context: u64,
    last_version: Cell<u64>,
    revisions: RefCell<RevisionLog>,
    writes: Cell<usize>,
}

impl MemorySlot {
    /// Creates an empty store and returns its first context.
    pub fn new() -> Self {
        Self::attach(Rc::new(RefCell::new(SharedStore::default())))
    }

    /// Opens another context over the same store.
    pub fn connect(&self) -> Self {
        Self::attach(Rc::clone(&self.store))
    }

    fn attach(store: Rc<RefCell<SharedStore>>) -> Self {
        let (context, version, rows) = {
            let mut shared = store.borrow_mut();
            shared.next_context += 1;
            let context = shared.next_context;
            let rows = snapshot(&shared, context);
            (context, shared.version, rows)
        };

        Self {
            store,
            context,
            last_version: Cell::new(version),
            revisions: RefCell::new(RevisionLog::from_rows(rows)),
            writes: Cell::new(0),
        }
    }

    /// Makes every subsequent write on any context fail with `message`.
    /// Passing `None` restores normal writes.
    pub fn fail_writes(&self, message: Option<&str>) {
        self.store.borrow_mut().fail_writes = message.map(str::to_string);
    }

    /// Number of successful `set` calls made through this context.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Writes `value` as an anonymous writer; every context sees it as a
    /// foreign change.
    pub fn inject_raw(&self, key: &str, value: &str) {
        let mut shared = self.store.borrow_mut();
        let revision = shared.next_revision();
        shared.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                revision,
                writer: 0,
            },
        );
        shared.version += 1;
    }
}

impl Default for MemorySlot {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableSlot for MemorySlot {
    fn get(&self, key: &str) -> SlotResult<Option<String>> {
        Ok(self
            .store
            .borrow()
            .entries
            .get(key)
            .map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> SlotResult<()> {
        let revision = {
            let mut shared = self.store.borrow_mut();
            if let Some(message) = shared.fail_writes.clone() {
                return Err(SlotError::Unavailable(message));
            }
            let revision = shared.next_revision();
            shared.entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    revision,
                    writer: self.context,
                },
            );
            shared.version += 1;
            revision
        };

        self.revisions.borrow_mut().record_own(key, revision);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn poll_events(&self) -> SlotResult<Vec<StorageEvent>> {
        let rows = {
            let shared = self.store.borrow();
            if shared.version == self.last_version.get() {
                return Ok(Vec::new());
            }
            self.last_version.set(shared.version);
            snapshot(&shared, self.context)
        };
        Ok(self.revisions.borrow_mut().observe(rows))
    }
}

fn snapshot(shared: &SharedStore, context: u64) -> Vec<RevisionRow> {
    shared
        .entries
        .iter()
        .map(|(key, entry)| RevisionRow {
            key: key.clone(),
            revision: entry.revision,
            foreign: entry.writer != context,
        })
        .collect()
}
