//! Text projection of the rendered list for a line-oriented terminal.

use std::fmt::Write;
use tasklist_core::{ItemAction, ItemContent, ListBody, ListView};

/// Draws the whole list; called after every re-render.
pub fn draw(view: &ListView, status: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "Tasks{:>width$}", status, width = 40);

    match &view.body {
        ListBody::Empty { placeholder } => {
            let _ = writeln!(out, "  {placeholder}");
        }
        ListBody::Items(items) => {
            for (position, item) in items.iter().enumerate() {
                let mark = if item.checkbox.checked { "x" } else { " " };
                match &item.content {
                    ItemContent::Display {
                        text,
                        caption,
                        actions,
                    } => {
                        let _ = writeln!(out, "{:>3}. [{mark}] {text}", position + 1);
                        let _ = writeln!(
                            out,
                            "          {}   ({})",
                            caption.label,
                            action_labels(actions)
                        );
                    }
                    ItemContent::Editing(form) => {
                        let _ = writeln!(
                            out,
                            "{:>3}. [{mark}] editing> {}▏",
                            position + 1,
                            form.draft
                        );
                        let _ = writeln!(
                            out,
                            "          type new text + Enter, or ({}) · max {} chars",
                            action_labels(&form.actions),
                            form.max_chars
                        );
                    }
                }
            }
        }
    }

    let _ = writeln!(
        out,
        "{}   {}   {}",
        view.remaining_label,
        toggle_label("clear-completed", view.clear_completed_enabled),
        toggle_label("clear-all", view.clear_all_enabled)
    );
    out
}

/// Prompt matching the current mode.
pub fn prompt(view: &ListView) -> &'static str {
    if view.editing_item().is_some() {
        "edit> "
    } else {
        "new> "
    }
}

fn action_labels(actions: &[ItemAction]) -> String {
    actions
        .iter()
        .map(|action| format!(":{}", action.label().to_ascii_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn toggle_label(name: &str, enabled: bool) -> String {
    if enabled {
        format!(":{name}")
    } else {
        format!("({name})")
    }
}
