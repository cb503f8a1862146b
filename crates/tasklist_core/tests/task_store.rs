use std::collections::HashSet;
use tasklist_core::{
    DurableSlot, ManualClock, MemorySlot, Outcome, StoreError, TaskId, TaskPersistence,
    TaskStore, STORAGE_KEY,
};

const T0: i64 = 1_700_000_000_000;

fn open_store() -> (TaskStore<MemorySlot, ManualClock>, ManualClock) {
    let clock = ManualClock::starting_at(T0);
    let store = TaskStore::open(TaskPersistence::new(MemorySlot::new()), clock.clone());
    (store, clock)
}

fn writes(store: &TaskStore<MemorySlot, ManualClock>) -> usize {
    store.persistence().slot().write_count()
}

fn texts(store: &TaskStore<MemorySlot, ManualClock>) -> Vec<&str> {
    store.tasks().iter().map(|task| task.text.as_str()).collect()
}

#[test]
fn add_normalizes_and_stamps_new_task() {
    let (mut store, _clock) = open_store();

    assert_eq!(store.add("  buy   milk  ").unwrap(), Outcome::Persisted);

    let task = &store.tasks()[0];
    assert_eq!(task.text, "buy milk");
    assert!(!task.completed);
    assert_eq!(task.created_at, T0);
    assert_eq!(task.updated_at, T0);
    assert_eq!(writes(&store), 1);
}

#[test]
fn add_prepends_in_reverse_call_order() {
    let (mut store, clock) = open_store();
    for text in ["first", "second", "third"] {
        store.add(text).unwrap();
        clock.advance_by(1);
    }
    assert_eq!(texts(&store), vec!["third", "second", "first"]);
}

#[test]
fn add_ids_are_pairwise_distinct_within_one_millisecond() {
    let (mut store, _clock) = open_store();
    for index in 0..200 {
        store.add(&format!("task {index}")).unwrap();
    }
    let ids: HashSet<&TaskId> = store.tasks().iter().map(|task| &task.id).collect();
    assert_eq!(ids.len(), 200);
}

#[test]
fn whitespace_only_input_changes_nothing() {
    let (mut store, _clock) = open_store();
    store.add("keep me").unwrap();
    let id = store.tasks()[0].id.clone();
    let before = store.tasks().to_vec();

    for raw in ["", "   ", "\t\n"] {
        assert_eq!(store.add(raw).unwrap(), Outcome::Unchanged);
        assert_eq!(store.update_text(&id, raw).unwrap(), Outcome::Unchanged);
    }

    assert_eq!(store.tasks(), before.as_slice());
    assert_eq!(writes(&store), 1);
}

#[test]
fn add_empty_on_empty_collection_writes_nothing() {
    let (mut store, _clock) = open_store();
    assert_eq!(store.add("").unwrap(), Outcome::Unchanged);
    assert!(store.tasks().is_empty());
    assert_eq!(writes(&store), 0);
    assert_eq!(store.persistence().slot().get(STORAGE_KEY).unwrap(), None);
}

#[test]
fn toggle_twice_restores_flag_and_advances_timestamp() {
    let (mut store, clock) = open_store();
    store.add("laundry").unwrap();
    let id = store.tasks()[0].id.clone();

    clock.advance_by(10);
    store.toggle_completed(&id).unwrap();
    assert!(store.tasks()[0].completed);
    assert_eq!(store.tasks()[0].updated_at, T0 + 10);

    clock.advance_by(10);
    store.toggle_completed(&id).unwrap();
    assert!(!store.tasks()[0].completed);
    assert_eq!(store.tasks()[0].updated_at, T0 + 20);
    assert_eq!(store.tasks()[0].created_at, T0);
}

#[test]
fn toggle_unknown_id_still_persists_same_collection() {
    let (mut store, _clock) = open_store();
    store.add("a").unwrap();
    let before = store.tasks().to_vec();

    assert_eq!(
        store.toggle_completed(&TaskId::from("missing")).unwrap(),
        Outcome::Persisted
    );
    assert_eq!(store.tasks(), before.as_slice());
    assert_eq!(writes(&store), 2);
}

#[test]
fn toggle_keeps_order_and_edit_cursor() {
    let (mut store, _clock) = open_store();
    store.add("one").unwrap();
    store.add("two").unwrap();
    let one = store.tasks()[1].id.clone();
    let two = store.tasks()[0].id.clone();

    store.begin_edit(&two);
    store.toggle_completed(&one).unwrap();

    assert_eq!(texts(&store), vec!["two", "one"]);
    assert_eq!(store.editing_id(), Some(&two));
}

#[test]
fn delete_of_edited_task_clears_cursor() {
    let (mut store, _clock) = open_store();
    store.add("doomed").unwrap();
    let id = store.tasks()[0].id.clone();

    assert_eq!(store.begin_edit(&id), Outcome::RenderOnly);
    assert_eq!(store.editing_id(), Some(&id));

    store.delete(&id).unwrap();
    assert!(store.tasks().is_empty());
    assert_eq!(store.editing_id(), None);
}

#[test]
fn delete_of_other_task_keeps_cursor() {
    let (mut store, _clock) = open_store();
    store.add("keep editing").unwrap();
    store.add("remove").unwrap();
    let editing = store.tasks()[1].id.clone();
    let removed = store.tasks()[0].id.clone();

    store.begin_edit(&editing);
    store.delete(&removed).unwrap();
    assert_eq!(store.editing_id(), Some(&editing));
}

#[test]
fn update_text_commits_and_closes_edit() {
    let (mut store, clock) = open_store();
    store.add("draft").unwrap();
    let id = store.tasks()[0].id.clone();
    store.begin_edit(&id);

    clock.advance_by(5_000);
    assert_eq!(
        store.update_text(&id, " final   copy ").unwrap(),
        Outcome::Persisted
    );
    assert_eq!(store.tasks()[0].text, "final copy");
    assert_eq!(store.tasks()[0].updated_at, T0 + 5_000);
    assert_eq!(store.editing_id(), None);
}

#[test]
fn blank_edit_is_ignored_and_edit_stays_open() {
    let (mut store, _clock) = open_store();
    store.add("original").unwrap();
    let id = store.tasks()[0].id.clone();
    store.begin_edit(&id);

    assert_eq!(store.update_text(&id, "   ").unwrap(), Outcome::Unchanged);
    assert_eq!(store.tasks()[0].text, "original");
    assert_eq!(store.editing_id(), Some(&id));
}

#[test]
fn clear_completed_writes_once_and_keeps_incomplete() {
    let (mut store, _clock) = open_store();
    store.add("done").unwrap();
    store.add("todo").unwrap();
    let done = store.tasks()[1].id.clone();
    store.toggle_completed(&done).unwrap();
    let writes_before = writes(&store);

    assert_eq!(store.clear_completed().unwrap(), Outcome::Persisted);
    assert_eq!(texts(&store), vec!["todo"]);
    assert_eq!(writes(&store), writes_before + 1);
}

#[test]
fn clear_completed_without_completed_tasks_skips_write() {
    let (mut store, _clock) = open_store();
    store.add("todo").unwrap();

    assert_eq!(store.clear_completed().unwrap(), Outcome::Unchanged);
    assert_eq!(writes(&store), 1);
}

#[test]
fn clear_completed_drops_cursor_on_removed_task() {
    let (mut store, _clock) = open_store();
    store.add("done").unwrap();
    let id = store.tasks()[0].id.clone();
    store.toggle_completed(&id).unwrap();
    store.begin_edit(&id);

    store.clear_completed().unwrap();
    assert_eq!(store.editing_id(), None);
}

#[test]
fn clear_all_empties_and_clears_cursor() {
    let (mut store, _clock) = open_store();
    store.add("a").unwrap();
    store.add("b").unwrap();
    let id = store.tasks()[0].id.clone();
    store.begin_edit(&id);

    assert_eq!(store.clear_all().unwrap(), Outcome::Persisted);
    assert!(store.tasks().is_empty());
    assert_eq!(store.editing_id(), None);
    assert_eq!(
        store.persistence().slot().get(STORAGE_KEY).unwrap().as_deref(),
        Some("[]")
    );
}

#[test]
fn begin_edit_on_unknown_id_leaves_cursor_unset() {
    let (mut store, _clock) = open_store();
    store.add("a").unwrap();
    store.begin_edit(&TaskId::from("ghost"));
    assert_eq!(store.editing_id(), None);
}

#[test]
fn edit_cursor_changes_never_write() {
    let (mut store, _clock) = open_store();
    store.add("a").unwrap();
    let id = store.tasks()[0].id.clone();

    store.begin_edit(&id);
    assert_eq!(store.cancel_edit(), Outcome::RenderOnly);
    assert_eq!(store.editing_id(), None);
    assert_eq!(writes(&store), 1);
}

#[test]
fn failed_write_leaves_state_untouched() {
    let (mut store, _clock) = open_store();
    store.add("safe").unwrap();
    let id = store.tasks()[0].id.clone();
    store.begin_edit(&id);
    let before = store.tasks().to_vec();

    store.persistence().slot().fail_writes(Some("quota exceeded"));
    let err = store.add("lost").unwrap_err();
    assert!(matches!(err, StoreError::Persist(_)));
    assert!(err.to_string().contains("quota exceeded"));
    assert!(store.delete(&id).is_err());

    assert_eq!(store.tasks(), before.as_slice());
    assert_eq!(store.editing_id(), Some(&id));
}

#[test]
fn reload_replaces_state_from_slot() {
    let slot = MemorySlot::new();
    let other = slot.connect();
    let mut store = TaskStore::open(TaskPersistence::new(slot), ManualClock::starting_at(T0));
    store.add("local").unwrap();
    let id = store.tasks()[0].id.clone();
    store.begin_edit(&id);

    other.set(STORAGE_KEY, "[]").unwrap();
    assert_eq!(store.reload(), Outcome::RenderOnly);
    assert!(store.tasks().is_empty());
    assert_eq!(store.editing_id(), None);
}

#[test]
fn open_loads_existing_collection() {
    let slot = MemorySlot::new();
    let writer = slot.connect();
    {
        let mut store = TaskStore::open(
            TaskPersistence::new(writer),
            ManualClock::starting_at(T0),
        );
        store.add("persisted").unwrap();
    }

    let store = TaskStore::open(TaskPersistence::new(slot), ManualClock::starting_at(T0));
    assert_eq!(texts(&store), vec!["persisted"]);
}
