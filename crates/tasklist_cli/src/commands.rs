//! REPL line parsing and translation into controller actions.
//!
//! Lines starting with `:` are commands; any other line is text for the
//! new-task form, or, while a task is being edited, the new text followed by
//! Enter.

use std::error::Error;
use std::fmt::{Display, Formatter};
use tasklist_core::{Action, EditKey, ListView, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit of the new-task form.
    Submit(String),
    /// Enter inside the edit field with this draft.
    Enter(String),
    Toggle(usize),
    Edit(usize),
    /// Delete by 1-based index, or the task under edit when omitted.
    Delete(Option<usize>),
    /// Save button; `None` keeps the current draft.
    Save(Option<String>),
    Cancel,
    Escape,
    ClearCompleted,
    ClearAll,
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    MissingIndex(&'static str),
    BadIndex(String),
    NoSuchTask(usize),
    NotEditing(&'static str),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown command `:{name}` (try :help)"),
            Self::MissingIndex(name) => write!(f, ":{name} needs a task number"),
            Self::BadIndex(raw) => write!(f, "`{raw}` is not a task number"),
            Self::NoSuchTask(index) => write!(f, "there is no task #{index}"),
            Self::NotEditing(name) => write!(f, ":{name} only works while editing"),
        }
    }
}

impl Error for CommandError {}

pub const HELP: &str = "\
  <text>              add a task (while editing: save <text>)
  :toggle N           mark task N done / not done
  :edit N             edit task N inline
  :save [text]        save the edit (keeps the draft when text is omitted)
  :cancel | :esc      leave edit mode without saving
  :delete [N]         delete task N (or the one being edited)
  :clear-completed    remove completed tasks
  :clear-all          remove every task
  :refresh            check for changes from other terminals
  :help               show this help
  :quit               exit";

/// Parses one input line. Returns `None` for a blank line outside edit mode.
pub fn parse_line(line: &str, editing: bool) -> Result<Option<Command>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.trim_start().strip_prefix(':') else {
        if editing {
            return Ok(Some(Command::Enter(line.to_string())));
        }
        if line.trim().is_empty() {
            return Ok(None);
        }
        return Ok(Some(Command::Submit(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "toggle" | "t" => Command::Toggle(required_index("toggle", arg)?),
        "edit" | "e" => Command::Edit(required_index("edit", arg)?),
        "delete" | "d" => Command::Delete(optional_index(arg)?),
        "save" | "s" => Command::Save((!arg.is_empty()).then(|| arg.to_string())),
        "cancel" | "c" => Command::Cancel,
        "esc" => Command::Escape,
        "clear-completed" => Command::ClearCompleted,
        "clear-all" => Command::ClearAll,
        "refresh" | "r" => Command::Refresh,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Resolves list positions against the rendered view.
///
/// Returns `Ok(None)` for commands handled by the REPL itself.
pub fn to_action(command: Command, view: &ListView) -> Result<Option<Action>, CommandError> {
    let editing = view
        .editing_item()
        .map(|(item, form)| (item.id.clone(), form.draft.clone()));

    let action = match command {
        Command::Submit(text) => Action::Submit(text),
        Command::Enter(draft) => {
            let (id, current) = editing.ok_or(CommandError::NotEditing("enter"))?;
            // A blank Enter re-commits the draft as shown.
            let draft = if draft.trim().is_empty() { current } else { draft };
            Action::EditKey {
                id,
                key: EditKey::Enter,
                draft,
            }
        }
        Command::Toggle(index) => Action::Toggle(id_at(view, index)?),
        Command::Edit(index) => Action::BeginEdit(id_at(view, index)?),
        Command::Delete(Some(index)) => Action::Delete(id_at(view, index)?),
        Command::Delete(None) => {
            let (id, _) = editing.ok_or(CommandError::MissingIndex("delete"))?;
            Action::Delete(id)
        }
        Command::Save(text) => {
            let (id, current) = editing.ok_or(CommandError::NotEditing("save"))?;
            Action::SaveEdit {
                id,
                draft: text.unwrap_or(current),
            }
        }
        Command::Cancel => Action::CancelEdit,
        Command::Escape => {
            let (id, draft) = editing.ok_or(CommandError::NotEditing("esc"))?;
            Action::EditKey {
                id,
                key: EditKey::Escape,
                draft,
            }
        }
        Command::ClearCompleted => Action::ClearCompleted,
        Command::ClearAll => Action::ClearAll,
        Command::Refresh | Command::Help | Command::Quit => return Ok(None),
    };
    Ok(Some(action))
}

fn id_at(view: &ListView, index: usize) -> Result<TaskId, CommandError> {
    index
        .checked_sub(1)
        .and_then(|position| view.items().get(position))
        .map(|item| item.id.clone())
        .ok_or(CommandError::NoSuchTask(index))
}

fn required_index(name: &'static str, arg: &str) -> Result<usize, CommandError> {
    optional_index(arg)?.ok_or(CommandError::MissingIndex(name))
}

fn optional_index(arg: &str) -> Result<Option<usize>, CommandError> {
    if arg.is_empty() {
        return Ok(None);
    }
    arg.parse::<usize>()
        .map(Some)
        .map_err(|_| CommandError::BadIndex(arg.to_string()))
}
