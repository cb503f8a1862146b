//! Input controller: maps user gestures onto store operations.
//!
//! # Responsibility
//! - Dispatch each `Action` to exactly one handler.
//! - Ask for confirmation before per-task delete and clear-all.
//! - Run the persist/re-render cycle and drive the save indicator.
//! - Turn storage notifications from other contexts into reloads.
//!
//! # Invariants
//! - Actions are handled one at a time to completion; the view is rebuilt
//!   before `dispatch` returns.
//! - A failed write never aborts the session: it is logged, shown through
//!   the indicator, and the view keeps showing the unchanged state.

use crate::clock::Clock;
use crate::indicator::SaveIndicator;
use crate::model::task::TaskId;
use crate::persistence::is_tasks_key;
use crate::slot::{DurableSlot, SlotResult};
use crate::store::{Outcome, StoreResult, TaskStore};
use crate::view::{render_list, ListView};
use chrono::TimeZone;
use log::{debug, warn};
use std::fmt::Display;

/// Keys with special meaning inside the inline edit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    Escape,
}

/// Every user gesture (and the cross-context signal) the controller accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Submit of the new-task form.
    Submit(String),
    Toggle(TaskId),
    BeginEdit(TaskId),
    CancelEdit,
    SaveEdit {
        id: TaskId,
        draft: String,
    },
    Delete(TaskId),
    /// Key press while focus is inside the edit field of `id`.
    EditKey {
        id: TaskId,
        key: EditKey,
        draft: String,
    },
    ClearCompleted,
    ClearAll,
    /// Another context wrote `key` in the shared slot.
    StorageChanged {
        key: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::Toggle(_) => "toggle",
            Self::BeginEdit(_) => "begin_edit",
            Self::CancelEdit => "cancel_edit",
            Self::SaveEdit { .. } => "save_edit",
            Self::Delete(_) => "delete",
            Self::EditKey { .. } => "edit_key",
            Self::ClearCompleted => "clear_completed",
            Self::ClearAll => "clear_all",
            Self::StorageChanged { .. } => "storage_changed",
        }
    }
}

/// Confirmation step shown before destructive actions.
pub trait Confirm {
    /// Returns `true` when the user accepts `prompt`.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Owns the store and the rendered view for one context.
pub struct Controller<S, C, Tz>
where
    S: DurableSlot,
    C: Clock,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    store: TaskStore<S, C>,
    indicator: SaveIndicator,
    zone: Tz,
    view: ListView,
    renders: usize,
}

impl<S, C, Tz> Controller<S, C, Tz>
where
    S: DurableSlot,
    C: Clock,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Takes over `store` and performs the initial render.
    pub fn new(store: TaskStore<S, C>, zone: Tz) -> Self {
        let view = render_list(store.tasks(), store.editing_id(), &zone);
        Self {
            store,
            indicator: SaveIndicator::default(),
            zone,
            view,
            renders: 1,
        }
    }

    pub fn view(&self) -> &ListView {
        &self.view
    }

    pub fn store(&self) -> &TaskStore<S, C> {
        &self.store
    }

    pub fn indicator(&self) -> &SaveIndicator {
        &self.indicator
    }

    /// Number of full renders performed so far, the initial one included.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Handles one action to completion. Returns `true` when the view was
    /// rebuilt.
    pub fn dispatch(&mut self, action: Action, confirm: &mut dyn Confirm) -> bool {
        let name = action.name();
        let result = match action {
            Action::Submit(text) => self.store.add(&text),
            Action::Toggle(id) => self.store.toggle_completed(&id),
            Action::BeginEdit(id) => Ok(self.store.begin_edit(&id)),
            Action::CancelEdit => Ok(self.store.cancel_edit()),
            Action::SaveEdit { id, draft } => self.store.update_text(&id, &draft),
            Action::Delete(id) => self.on_delete(&id, confirm),
            Action::EditKey { id, key, draft } => self.on_edit_key(&id, key, &draft),
            Action::ClearCompleted => self.store.clear_completed(),
            Action::ClearAll => self.on_clear_all(confirm),
            Action::StorageChanged { key } => Ok(self.on_storage_changed(&key)),
        };
        self.settle(name, result)
    }

    /// Drains cross-context notifications and reloads when the task key moved.
    /// Returns `true` when the view was rebuilt.
    pub fn poll_sync(&mut self) -> SlotResult<bool> {
        let events = self.store.persistence().slot().poll_events()?;
        let mut rendered = false;
        for event in events {
            // Reload never asks for confirmation.
            rendered |= self.dispatch(Action::StorageChanged { key: event.key }, &mut |_: &str| {
                false
            });
        }
        Ok(rendered)
    }

    /// Advances the save indicator. Returns `true` when its label changed.
    pub fn tick(&mut self) -> bool {
        let now = self.store.clock().now_ms();
        self.indicator.tick(now)
    }

    fn on_delete(&mut self, id: &TaskId, confirm: &mut dyn Confirm) -> StoreResult<Outcome> {
        // A task that vanished (e.g. removed by another context) needs no
        // confirmation.
        if let Some(task) = self.store.find(id) {
            let prompt = format!("Delete \"{}\"?", task.text);
            if !confirm.confirm(&prompt) {
                return Ok(Outcome::Unchanged);
            }
        }
        self.store.delete(id)
    }

    fn on_clear_all(&mut self, confirm: &mut dyn Confirm) -> StoreResult<Outcome> {
        if self.store.tasks().is_empty() || !confirm.confirm("Clear all tasks?") {
            return Ok(Outcome::Unchanged);
        }
        self.store.clear_all()
    }

    fn on_edit_key(&mut self, id: &TaskId, key: EditKey, draft: &str) -> StoreResult<Outcome> {
        match key {
            EditKey::Enter => self.store.update_text(id, draft),
            EditKey::Escape => Ok(self.store.cancel_edit()),
        }
    }

    fn on_storage_changed(&mut self, key: &str) -> Outcome {
        if is_tasks_key(key) {
            self.store.reload()
        } else {
            Outcome::Unchanged
        }
    }

    fn settle(&mut self, name: &'static str, result: StoreResult<Outcome>) -> bool {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "event=action_dispatch module=controller status=error action={} error={}",
                    name, err
                );
                self.indicator.mark_failed(format!("Not saved: {err}"));
                self.render();
                return true;
            }
        };

        debug!(
            "event=action_dispatch module=controller status=ok action={} outcome={:?}",
            name, outcome
        );
        if outcome == Outcome::Persisted {
            self.indicator.mark_saving(self.store.clock().now_ms());
        }
        if !outcome.needs_render() {
            return false;
        }
        self.render();
        true
    }

    fn render(&mut self) {
        self.view = render_list(self.store.tasks(), self.store.editing_id(), &self.zone);
        self.renders += 1;
    }
}
