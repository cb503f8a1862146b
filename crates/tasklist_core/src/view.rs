//! View renderer: projects store state onto a presentational tree.
//!
//! # Responsibility
//! - Derive the whole visible list and the summary counters from
//!   `(tasks, editing_id)` on every call.
//! - Decide per-item presentation (display row vs inline edit form).
//!
//! # Invariants
//! - Rendering is pure; the same input always yields the same tree.
//! - At most one item renders as an edit form, and it carries the focus
//!   request.

use crate::model::task::{Task, TaskId, MAX_TEXT_CHARS};
use chrono::TimeZone;
use std::fmt::Display;

/// Placeholder shown instead of the list when there are no tasks.
pub const EMPTY_PLACEHOLDER: &str = "No tasks yet. Add your first one above.";

const TIMESTAMP_FORMAT: &str = "%b %d, %Y, %I:%M %p";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub body: ListBody,
    /// Number of incomplete tasks.
    pub remaining: usize,
    /// e.g. `1 item left`, `3 items left`.
    pub remaining_label: String,
    pub clear_completed_enabled: bool,
    pub clear_all_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListBody {
    Empty { placeholder: &'static str },
    Items(Vec<TaskItemView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItemView {
    pub id: TaskId,
    pub checkbox: Checkbox,
    pub content: ItemContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkbox {
    pub checked: bool,
    /// Accessible label.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemContent {
    Display {
        text: String,
        caption: Caption,
        actions: Vec<ItemAction>,
    },
    Editing(EditForm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionKind {
    Added,
    Edited,
}

/// Timestamp line under a task's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub kind: CaptionKind,
    pub at_ms: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    /// Pre-filled with the task's current text.
    pub draft: String,
    pub max_chars: usize,
    pub label: String,
    /// Focus must land in the field right after it is shown.
    pub focus: FocusRequest,
    pub actions: Vec<ItemAction>,
}

/// Input focus with the caret at a char offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRequest {
    pub caret: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    Edit,
    Delete,
    Save,
    Cancel,
}

impl ItemAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Delete => "Delete",
            Self::Save => "Save",
            Self::Cancel => "Cancel",
        }
    }
}

impl ListView {
    pub fn is_empty(&self) -> bool {
        matches!(self.body, ListBody::Empty { .. })
    }

    pub fn items(&self) -> &[TaskItemView] {
        match &self.body {
            ListBody::Empty { .. } => &[],
            ListBody::Items(items) => items,
        }
    }

    /// The item currently rendered as an edit form, if any.
    pub fn editing_item(&self) -> Option<(&TaskItemView, &EditForm)> {
        self.items().iter().find_map(|item| match &item.content {
            ItemContent::Editing(form) => Some((item, form)),
            ItemContent::Display { .. } => None,
        })
    }
}

/// Renders the full list from scratch.
pub fn render_list<Tz>(tasks: &[Task], editing_id: Option<&TaskId>, zone: &Tz) -> ListView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let remaining = tasks.iter().filter(|task| !task.completed).count();
    let body = if tasks.is_empty() {
        ListBody::Empty {
            placeholder: EMPTY_PLACEHOLDER,
        }
    } else {
        ListBody::Items(
            tasks
                .iter()
                .map(|task| render_item(task, editing_id == Some(&task.id), zone))
                .collect(),
        )
    };

    ListView {
        body,
        remaining,
        remaining_label: remaining_label(remaining),
        clear_completed_enabled: tasks.iter().any(|task| task.completed),
        clear_all_enabled: !tasks.is_empty(),
    }
}

fn render_item<Tz>(task: &Task, editing: bool, zone: &Tz) -> TaskItemView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let checkbox = Checkbox {
        checked: task.completed,
        label: format!("Mark as completed: {}", task.text),
    };

    let content = if editing {
        ItemContent::Editing(EditForm {
            draft: task.text.clone(),
            max_chars: MAX_TEXT_CHARS,
            label: format!("Edit task: {}", task.text),
            focus: FocusRequest {
                caret: task.text.chars().count(),
            },
            actions: vec![ItemAction::Save, ItemAction::Cancel, ItemAction::Delete],
        })
    } else {
        ItemContent::Display {
            text: task.text.clone(),
            caption: caption(task, zone),
            actions: vec![ItemAction::Edit, ItemAction::Delete],
        }
    };

    TaskItemView {
        id: task.id.clone(),
        checkbox,
        content,
    }
}

fn caption<Tz>(task: &Task, zone: &Tz) -> Caption
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (kind, at_ms, prefix) = if task.is_edited() {
        (CaptionKind::Edited, task.updated_at, "Edited")
    } else {
        (CaptionKind::Added, task.created_at, "Added")
    };

    Caption {
        kind,
        at_ms,
        label: format!("{prefix} • {}", format_timestamp(at_ms, zone)),
    }
}

/// `1 item left` / `N items left`.
pub fn remaining_label(remaining: usize) -> String {
    let noun = if remaining == 1 { "item" } else { "items" };
    format!("{remaining} {noun} left")
}

/// Formats epoch milliseconds as e.g. `Mar 05, 2024, 09:07 AM` in `zone`.
pub fn format_timestamp<Tz>(at_ms: i64, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match zone.timestamp_millis_opt(at_ms).single() {
        Some(at) => at.format(TIMESTAMP_FORMAT).to_string(),
        None => at_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, remaining_label};
    use chrono::Utc;

    #[test]
    fn remaining_label_pluralizes() {
        assert_eq!(remaining_label(0), "0 items left");
        assert_eq!(remaining_label(1), "1 item left");
        assert_eq!(remaining_label(2), "2 items left");
    }

    #[test]
    fn timestamp_uses_short_month_and_12h_clock() {
        // 2024-03-05T21:07:00Z
        assert_eq!(format_timestamp(1_709_672_820_000, &Utc), "Mar 05, 2024, 09:07 PM");
    }
}
