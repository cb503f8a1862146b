//! Task store: the single owner of the task collection and edit cursor.
//!
//! # Responsibility
//! - Apply every mutation as a wholesale replacement of the collection.
//! - Persist after each effective mutation and report whether a re-render
//!   is due.
//! - Keep the edit cursor pointing at an existing task or at nothing.
//!
//! # Invariants
//! - New tasks are prepended; other operations keep relative order.
//! - A mutation is either fully applied (saved and swapped in) or not at all;
//!   a failed save leaves tasks and cursor untouched.
//! - The edit cursor is never persisted.

use crate::clock::Clock;
use crate::model::task::{normalize_text, Task, TaskId};
use crate::persistence::TaskPersistence;
use crate::slot::{DurableSlot, SlotError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// What an operation did, and therefore what the caller must refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Collection saved; re-render required.
    Persisted,
    /// Only transient state moved; re-render without saving.
    RenderOnly,
    /// Nothing changed; no save, no re-render.
    Unchanged,
}

impl Outcome {
    pub fn needs_render(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// The durable write failed; the in-memory state was not changed.
    Persist(SlotError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persist(err) => write!(f, "failed to persist tasks: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<SlotError> for StoreError {
    fn from(value: SlotError) -> Self {
        Self::Persist(value)
    }
}

/// In-memory task collection backed by a durable slot.
pub struct TaskStore<S: DurableSlot, C: Clock> {
    persistence: TaskPersistence<S>,
    clock: C,
    tasks: Vec<Task>,
    editing_id: Option<TaskId>,
}

impl<S: DurableSlot, C: Clock> TaskStore<S, C> {
    /// Loads the persisted collection once and takes ownership of it.
    pub fn open(persistence: TaskPersistence<S>, clock: C) -> Self {
        let tasks = persistence.load();
        info!(
            "event=store_open module=store status=ok count={}",
            tasks.len()
        );
        Self {
            persistence,
            clock,
            tasks,
            editing_id: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn editing_id(&self) -> Option<&TaskId> {
        self.editing_id.as_ref()
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn persistence(&self) -> &TaskPersistence<S> {
        &self.persistence
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Prepends a task built from `raw`; whitespace-only input is ignored.
    pub fn add(&mut self, raw: &str) -> StoreResult<Outcome> {
        let Some(text) = normalize_text(raw) else {
            return Ok(Outcome::Unchanged);
        };

        let task = Task::with_id(self.fresh_id(), text, self.clock.now_ms());
        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(task);
        next.extend(self.tasks.iter().cloned());

        self.commit("add", next, None)
    }

    /// Flips completion on `id`. An unknown id still re-saves the current
    /// collection so every context converges on the same value.
    pub fn toggle_completed(&mut self, id: &TaskId) -> StoreResult<Outcome> {
        let now = self.clock.now_ms();
        let next = self
            .tasks
            .iter()
            .map(|task| {
                if &task.id == id {
                    task.toggled(now)
                } else {
                    task.clone()
                }
            })
            .collect();

        self.commit("toggle", next, self.editing_id.clone())
    }

    pub fn delete(&mut self, id: &TaskId) -> StoreResult<Outcome> {
        let next = self
            .tasks
            .iter()
            .filter(|task| &task.id != id)
            .cloned()
            .collect();
        let editing = self.editing_id.clone().filter(|editing| editing != id);

        self.commit("delete", next, editing)
    }

    /// Commits an edit. Whitespace-only text is ignored and the edit stays
    /// open.
    pub fn update_text(&mut self, id: &TaskId, raw: &str) -> StoreResult<Outcome> {
        let Some(text) = normalize_text(raw) else {
            return Ok(Outcome::Unchanged);
        };

        let now = self.clock.now_ms();
        let next = self
            .tasks
            .iter()
            .map(|task| {
                if &task.id == id {
                    task.retexted(text.as_str(), now)
                } else {
                    task.clone()
                }
            })
            .collect();

        self.commit("update_text", next, None)
    }

    /// Drops completed tasks. Skips the write entirely when none exist.
    pub fn clear_completed(&mut self) -> StoreResult<Outcome> {
        let next: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| !task.completed)
            .cloned()
            .collect();
        if next.len() == self.tasks.len() {
            return Ok(Outcome::Unchanged);
        }

        self.commit("clear_completed", next, self.editing_id.clone())
    }

    pub fn clear_all(&mut self) -> StoreResult<Outcome> {
        self.commit("clear_all", Vec::new(), None)
    }

    /// Puts `id` under inline edit. Unknown ids leave no task in edit mode.
    pub fn begin_edit(&mut self, id: &TaskId) -> Outcome {
        self.editing_id = self.find(id).map(|task| task.id.clone());
        Outcome::RenderOnly
    }

    pub fn cancel_edit(&mut self) -> Outcome {
        self.editing_id = None;
        Outcome::RenderOnly
    }

    /// Discards local state and re-reads the durable slot.
    pub fn reload(&mut self) -> Outcome {
        self.tasks = self.persistence.load();
        self.editing_id = None;
        info!(
            "event=store_reload module=store status=ok count={}",
            self.tasks.len()
        );
        Outcome::RenderOnly
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.find(&id).is_none() {
                return id;
            }
        }
    }

    fn commit(
        &mut self,
        op: &'static str,
        next: Vec<Task>,
        editing: Option<TaskId>,
    ) -> StoreResult<Outcome> {
        if let Err(err) = self.persistence.save(&next) {
            warn!(
                "event=store_commit module=store status=error op={} error_code=persist_failed error={}",
                op, err
            );
            return Err(err.into());
        }

        self.editing_id = editing.filter(|id| next.iter().any(|task| &task.id == id));
        self.tasks = next;
        info!(
            "event=store_commit module=store status=ok op={} count={}",
            op,
            self.tasks.len()
        );
        Ok(Outcome::Persisted)
    }
}
