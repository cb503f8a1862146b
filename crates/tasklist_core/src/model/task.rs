//! Task record and text normalization.
//!
//! # Responsibility
//! - Define the canonical `Task` record and its serialized field names.
//! - Generate collision-resistant task identifiers.
//! - Normalize user-entered text before it reaches the collection.
//!
//! # Invariants
//! - `id` is never reused and never changes after creation.
//! - `text` has no leading/trailing whitespace, no whitespace runs, and is
//!   never empty.
//! - `updated_at == created_at` until the first edit or toggle.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Upper bound for task text, counted in chars.
pub const MAX_TEXT_CHARS: usize = 200;

// U+FEFF is not Unicode whitespace, but input fields treat it as such.
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\x{FEFF}]+").expect("valid ws regex"));

/// Opaque task identifier.
///
/// Newly created tasks get a UUIDv7 string (millisecond timestamp plus
/// random bits), so two tasks created in the same millisecond still differ.
/// Ids loaded from storage are accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Validation failures for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyId,
    EmptyText(TaskId),
    UnnormalizedText(TaskId),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "task id cannot be empty"),
            Self::EmptyText(id) => write!(f, "task {id} has empty text"),
            Self::UnnormalizedText(id) => write!(f, "task {id} text is not normalized"),
        }
    }
}

impl Error for TaskValidationError {}

/// A single to-do item.
///
/// Serialized with camelCase keys (`createdAt`, `updatedAt`) to keep the
/// stored JSON shape stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last edit or toggle.
    pub updated_at: i64,
}

impl Task {
    /// Creates an incomplete task with a generated id.
    ///
    /// `text` is expected to be normalized already; see [`normalize_text`].
    pub fn new(text: impl Into<String>, now_ms: i64) -> Self {
        Self::with_id(TaskId::generate(), text, now_ms)
    }

    /// Creates an incomplete task with a caller-provided id.
    pub fn with_id(id: TaskId, text: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Returns a copy with `completed` flipped and `updated_at` moved to `now_ms`.
    pub fn toggled(&self, now_ms: i64) -> Self {
        Self {
            completed: !self.completed,
            updated_at: now_ms,
            ..self.clone()
        }
    }

    /// Returns a copy carrying `text` and `updated_at = now_ms`.
    pub fn retexted(&self, text: impl Into<String>, now_ms: i64) -> Self {
        Self {
            text: text.into(),
            updated_at: now_ms,
            ..self.clone()
        }
    }

    /// Whether the task has been touched since creation.
    pub fn is_edited(&self) -> bool {
        self.updated_at != self.created_at
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.as_str().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        match normalize_text(&self.text) {
            None => Err(TaskValidationError::EmptyText(self.id.clone())),
            Some(normalized) if normalized != self.text => {
                Err(TaskValidationError::UnnormalizedText(self.id.clone()))
            }
            Some(_) => Ok(()),
        }
    }
}

/// Collapses whitespace runs to one space, trims, and caps the length.
///
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_text(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(raw, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.chars().count() <= MAX_TEXT_CHARS {
        return Some(trimmed.to_string());
    }
    let capped: String = trimmed.chars().take(MAX_TEXT_CHARS).collect();
    Some(capped.trim_end().to_string())
}
