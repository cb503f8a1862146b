use chrono::Utc;
use std::sync::mpsc;
use tasklist_cli::repl::Repl;
use tasklist_core::{Controller, ManualClock, MemorySlot, TaskPersistence, TaskStore};

const T0: i64 = 1_700_000_000_000;

type TestRepl = Repl<MemorySlot, ManualClock, Utc, Vec<u8>>;

fn controller_over(slot: MemorySlot) -> Controller<MemorySlot, ManualClock, Utc> {
    let store = TaskStore::open(TaskPersistence::new(slot), ManualClock::starting_at(T0));
    Controller::new(store, Utc)
}

/// Feeds every line up front and runs until input is exhausted.
fn run_session(slot: MemorySlot, lines: &[&str]) -> (TestRepl, String) {
    run_with(controller_over(slot), lines)
}

fn run_with(
    controller: Controller<MemorySlot, ManualClock, Utc>,
    lines: &[&str],
) -> (TestRepl, String) {
    let (sender, receiver) = mpsc::channel();
    for line in lines {
        sender.send((*line).to_string()).unwrap();
    }
    drop(sender);

    let mut repl = Repl::new(controller, receiver, Vec::new());
    repl.run().unwrap();
    let output = String::from_utf8(repl.output().clone()).unwrap();
    (repl, output)
}

fn texts(repl: &TestRepl) -> Vec<String> {
    repl.controller()
        .store()
        .tasks()
        .iter()
        .map(|task| task.text.clone())
        .collect()
}

#[test]
fn add_toggle_and_clear_completed() {
    let (repl, output) = run_session(
        MemorySlot::new(),
        &["buy milk", "walk dog", ":toggle 2", ":clear-completed"],
    );

    assert_eq!(texts(&repl), vec!["walk dog"]);
    assert!(output.contains("1 item left"));
    assert!(output.contains("[x] buy milk"));
}

#[test]
fn edit_with_enter_replaces_text() {
    let (repl, output) = run_session(MemorySlot::new(), &["first draft", ":edit 1", "final"]);

    assert_eq!(texts(&repl), vec!["final"]);
    assert!(output.contains("editing> first draft"));
    assert!(output.contains("new> "));
}

#[test]
fn delete_asks_and_honours_answer() {
    let (repl, output) = run_session(
        MemorySlot::new(),
        &["keep", ":delete 1", "n", ":delete 1", "y"],
    );

    assert!(output.contains("Delete \"keep\"? [y/N]"));
    assert!(texts(&repl).is_empty());
}

#[test]
fn clear_all_declined_keeps_tasks() {
    let (repl, output) = run_session(MemorySlot::new(), &["a", "b", ":clear-all", "no"]);

    assert!(output.contains("Clear all tasks? [y/N]"));
    assert_eq!(texts(&repl), vec!["b", "a"]);
}

#[test]
fn bad_commands_report_errors_and_continue() {
    let (repl, output) = run_session(MemorySlot::new(), &[":toggle 9", ":nope", "still works"]);

    assert!(output.contains("there is no task #9"));
    assert!(output.contains("unknown command `:nope`"));
    assert_eq!(texts(&repl), vec!["still works"]);
}

#[test]
fn refresh_picks_up_other_context() {
    let slot = MemorySlot::new();
    let other = slot.connect();
    {
        let mut writer = TaskStore::open(TaskPersistence::new(other), ManualClock::starting_at(T0));
        writer.add("from elsewhere").unwrap();
    }

    // `slot` was attached before the write, so the poll reports it.
    let (repl, output) = run_session(slot, &[":refresh"]);
    assert_eq!(texts(&repl), vec!["from elsewhere"]);
    assert!(output.contains("updated from another terminal"));
}

#[test]
fn typed_lines_resolve_against_other_context_changes() {
    let slot = MemorySlot::new();
    let other = slot.connect();
    let controller = controller_over(slot);
    assert!(controller.view().is_empty());

    let mut writer = TaskStore::open(TaskPersistence::new(other), ManualClock::starting_at(T0));
    writer.add("from elsewhere").unwrap();

    let (repl, output) = run_with(controller, &[":toggle 1"]);
    assert!(output.contains("updated from another terminal"));
    assert!(!output.contains("there is no task"));
    let tasks = repl.controller().store().tasks();
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].completed);
}

#[test]
fn quit_stops_before_remaining_input() {
    let (repl, _output) = run_session(MemorySlot::new(), &["one", ":quit", "two"]);
    assert_eq!(texts(&repl), vec!["one"]);
}
