//! Core state management for the task list.
//! This crate owns the task collection, its persistence, and the
//! projection onto a presentational tree; front-ends only feed it actions.

pub mod clock;
pub mod controller;
pub mod db;
pub mod indicator;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod slot;
pub mod store;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{Action, Confirm, Controller, EditKey};
pub use indicator::{SaveIndicator, SAVED_DELAY_MS};
pub use logging::{init_logging, LogLevel, LoggingError};
pub use model::task::{normalize_text, Task, TaskId, TaskValidationError, MAX_TEXT_CHARS};
pub use persistence::{is_tasks_key, TaskPersistence, STORAGE_KEY};
pub use slot::{DurableSlot, MemorySlot, SlotError, SlotResult, SqliteSlot, StorageEvent};
pub use store::{Outcome, StoreError, StoreResult, TaskStore};
pub use view::{
    render_list, Caption, CaptionKind, Checkbox, EditForm, FocusRequest, ItemAction,
    ItemContent, ListBody, ListView, TaskItemView,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
