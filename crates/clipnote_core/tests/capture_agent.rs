use chrono::{Duration, TimeZone, Utc};
use clipnote_core::{
    CaptureAgent, CaptureEvent, ChangeNotifier, ManualClock, MemoryNoteStore, NoteStore,
    SqliteNoteStore,
};
use std::collections::HashSet;
use std::sync::Arc;

fn event(selection: &str) -> CaptureEvent {
    CaptureEvent {
        selection_text: selection.to_string(),
        page_url: "https://example.com/post".to_string(),
    }
}

fn memory_store() -> Arc<MemoryNoteStore> {
    Arc::new(MemoryNoteStore::new(Arc::new(ChangeNotifier::new())))
}

#[test]
fn short_selection_still_gets_ellipsis() {
    let store = memory_store();
    let agent = CaptureAgent::new(Arc::clone(&store));

    let note = agent.capture(event("Hi")).unwrap();

    assert_eq!(note.title, "Hi...");
    assert_eq!(note.content, "Hi");
    assert!(!note.manual_title);
    assert_eq!(note.background_color, None);
}

#[test]
fn long_selection_is_truncated_in_title_only() {
    let store = memory_store();
    let agent = CaptureAgent::new(Arc::clone(&store));
    let selection = "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHIJKLMN";
    assert_eq!(selection.chars().count(), 50);

    let note = agent.capture(event(selection)).unwrap();

    assert_eq!(note.title, "abcdefghijklmnopqrstuvwxyz0123...");
    assert_eq!(note.content, selection);
}

#[test]
fn capture_records_source_and_capture_time() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let store = memory_store();
    let agent = CaptureAgent::with_clock(
        Arc::clone(&store),
        ManualClock::new(start, Duration::seconds(1)),
    );

    let note = agent.capture(event("quote")).unwrap();

    assert_eq!(note.source.as_deref(), Some("https://example.com/post"));
    assert_eq!(note.date, start);
    assert_eq!(store.read().unwrap().as_slice(), &[note]);
}

#[test]
fn captures_are_prepended_newest_first_without_dedup() {
    let store = memory_store();
    let agent = CaptureAgent::new(Arc::clone(&store));

    let first = agent.capture(event("same text")).unwrap();
    let second = agent.capture(event("same text")).unwrap();
    let third = agent.capture(event("other")).unwrap();

    let stored = store.read().unwrap();
    assert_eq!(stored.ids(), vec![third.id, second.id, first.id]);
}

#[test]
fn ids_stay_unique_across_many_captures() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteNoteStore::open(
        dir.path().join("captures.sqlite3"),
        Arc::new(ChangeNotifier::new()),
    )
    .unwrap();
    let agent = CaptureAgent::new(&store);

    for idx in 0..200 {
        agent.capture(event(&format!("selection {idx}"))).unwrap();
    }

    let stored = store.read().unwrap();
    assert_eq!(stored.len(), 200);
    assert!(stored.has_unique_ids());
    let unique: HashSet<_> = stored.iter().map(|note| note.id.clone()).collect();
    assert_eq!(unique.len(), 200);
}

#[test]
fn every_capture_notifies_subscribers() {
    let notifier = Arc::new(ChangeNotifier::new());
    let store = Arc::new(MemoryNoteStore::new(Arc::clone(&notifier)));
    let list_side = notifier.subscribe();
    let agent = CaptureAgent::new(Arc::clone(&store));

    agent.capture(event("one")).unwrap();
    agent.capture(event("two")).unwrap();

    assert_eq!(list_side.drain(), 2);
}
