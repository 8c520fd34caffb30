use chrono::{Duration, TimeZone, Utc};
use clipnote_core::{
    CaptureAgent, CaptureEvent, ChangeNotifier, DeleteOutcome, EditorSession, ManualClock,
    MemoryNoteStore, Note, NoteCollection, NoteId, NoteListView, NoteStore, RefreshOutcome,
    RefreshPolicy, SessionState,
};
use std::sync::Arc;

struct Harness {
    notifier: Arc<ChangeNotifier>,
    store: Arc<MemoryNoteStore>,
}

impl Harness {
    fn new() -> Self {
        let notifier = Arc::new(ChangeNotifier::new());
        let store = Arc::new(MemoryNoteStore::new(Arc::clone(&notifier)));
        Self { notifier, store }
    }

    fn editor(&self) -> EditorSession<Arc<MemoryNoteStore>, ManualClock> {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
        EditorSession::with_clock(
            Arc::clone(&self.store),
            ManualClock::new(start, Duration::seconds(1)),
        )
    }

    fn capture(&self, selection: &str) -> Note {
        CaptureAgent::new(Arc::clone(&self.store))
            .capture(CaptureEvent {
                selection_text: selection.to_string(),
                page_url: "https://example.com".to_string(),
            })
            .unwrap()
    }

    fn list(&self) -> NoteListView<Arc<MemoryNoteStore>> {
        NoteListView::new(
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            RefreshPolicy::SuppressWhileEditing,
        )
    }
}

#[test]
fn open_loads_surface_and_background_rule() {
    let harness = Harness::new();
    let mut note = harness.capture("styled");
    note.background_color = Some("#bfdbfe".to_string());
    let mut editor = harness.editor();

    editor.open(&note);

    assert_eq!(editor.current_id(), Some(&note.id));
    assert_eq!(editor.surface().content, "styled");
    assert_eq!(editor.surface().foreground.css_value(), Some("#1f2937"));

    let plain = harness.capture("plain");
    editor.open(&plain);
    assert_eq!(editor.surface().background_color, None);
    assert_eq!(editor.surface().foreground.css_value(), None);
}

#[test]
fn save_derives_title_and_keeps_capture_source() {
    let harness = Harness::new();
    let captured = harness.capture("Hi");
    let mut editor = harness.editor();
    editor.open(&captured);

    let saved = editor.input("<p>Hi <b>there</b></p>").unwrap().unwrap();

    assert_eq!(saved.title, "Hi there");
    assert_eq!(saved.source, captured.source);
    assert!(!saved.manual_title);
}

#[test]
fn captured_plain_text_with_angle_brackets_keeps_its_title() {
    let harness = Harness::new();
    let captured = harness.capture("x < y or y > z");
    let mut editor = harness.editor();
    editor.open(&captured);

    let saved = editor
        .set_background_color(Some("#fde68a"))
        .unwrap()
        .unwrap();

    assert_eq!(saved.title, "x < y or y > z");
    assert_eq!(saved.content, "x < y or y > z");
}

#[test]
fn long_content_title_is_truncated_with_marker() {
    let harness = Harness::new();
    let mut editor = harness.editor();
    editor.new_note();

    let saved = editor
        .input("<div>The quick brown fox jumps over the lazy dog</div>")
        .unwrap()
        .unwrap();

    assert_eq!(saved.title, "The quick brown fox jumps over...");
}

#[test]
fn empty_content_falls_back_to_default_title() {
    let harness = Harness::new();
    let mut editor = harness.editor();
    editor.new_note();

    let saved = editor.input("<p><br></p>").unwrap().unwrap();

    assert_eq!(saved.title, "New Note");
}

#[test]
fn manual_title_survives_later_saves() {
    let harness = Harness::new();
    let captured = harness.capture("original selection");
    let mut editor = harness.editor();

    assert!(editor.set_manual_title(&captured.id, "Foo").unwrap());
    editor.open(&captured);
    editor.input("<p>completely different</p>").unwrap();
    let saved = editor.input("<p>and again</p>").unwrap().unwrap();

    assert_eq!(saved.title, "Foo");
    assert!(saved.manual_title);
    let stored = harness.store.read().unwrap();
    assert_eq!(stored.get(&captured.id).unwrap().title, "Foo");
    assert_eq!(stored.get(&captured.id).unwrap().content, "<p>and again</p>");
}

#[test]
fn rename_can_target_a_note_other_than_the_open_one() {
    let harness = Harness::new();
    let other = harness.capture("other");
    let open = harness.capture("open");
    let mut editor = harness.editor();
    editor.open(&open);

    assert!(editor.set_manual_title(&other.id, "Renamed").unwrap());
    assert_eq!(editor.current_id(), Some(&open.id));

    let stored = harness.store.read().unwrap();
    assert_eq!(stored.get(&other.id).unwrap().title, "Renamed");
    assert_eq!(stored.get(&open.id).unwrap().title, "open...");
}

#[test]
fn rename_of_unknown_note_does_not_write() {
    let harness = Harness::new();
    harness.capture("only");
    let editor = harness.editor();
    let before = harness.store.read_versioned().unwrap().revision;

    assert!(!editor
        .set_manual_title(&NoteId::from("missing"), "Nope")
        .unwrap());
    assert_eq!(harness.store.read_versioned().unwrap().revision, before);
}

#[test]
fn delete_removes_only_the_open_note() {
    let harness = Harness::new();
    let a = harness.capture("a");
    let b = harness.capture("b");
    let c = harness.capture("c");
    let before = harness.store.read().unwrap();
    assert_eq!(before.ids(), vec![c.id.clone(), b.id.clone(), a.id.clone()]);
    let mut editor = harness.editor();
    editor.open(&b);

    let outcome = editor.delete(|| true).unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted(b.id.clone()));
    assert_eq!(editor.state(), &SessionState::Closed);
    let after = harness.store.read().unwrap();
    assert_eq!(after, NoteCollection::from(vec![c, a]));
}

#[test]
fn repeated_save_changes_only_the_date() {
    let harness = Harness::new();
    let mut editor = harness.editor();
    editor.new_note();
    editor.input("<p>steady</p>").unwrap();

    let first = editor.save().unwrap().unwrap();
    let second = editor.save().unwrap().unwrap();

    assert_eq!(first.content, second.content);
    assert_eq!(first.title, second.title);
    assert!(second.date > first.date);
}

#[test]
fn saving_an_existing_note_keeps_its_position() {
    let harness = Harness::new();
    let oldest = harness.capture("oldest");
    let middle = harness.capture("middle");
    let newest = harness.capture("newest");
    let mut editor = harness.editor();
    editor.open(&oldest);

    editor.input("<p>edited long after capture</p>").unwrap();

    let stored = harness.store.read().unwrap();
    assert_eq!(stored.ids(), vec![newest.id, middle.id, oldest.id.clone()]);
    assert_eq!(stored.as_slice()[2].content, "<p>edited long after capture</p>");
}

#[test]
fn new_note_is_prepended_on_first_save() {
    let harness = Harness::new();
    let captured = harness.capture("earlier");
    let mut editor = harness.editor();
    let id = editor.new_note();

    editor.input("fresh").unwrap();

    let stored = harness.store.read().unwrap();
    assert_eq!(stored.ids(), vec![id, captured.id]);
}

#[test]
fn close_saves_and_returns_to_list() {
    let harness = Harness::new();
    let mut editor = harness.editor();
    let id = editor.new_note();

    let saved = editor.close().unwrap().unwrap();

    assert_eq!(saved.id, id);
    assert_eq!(saved.title, "New Note");
    assert_eq!(editor.state(), &SessionState::Closed);
    assert!(editor.save().unwrap().is_none());
}

#[test]
fn list_refreshes_only_while_closed() {
    let harness = Harness::new();
    let mut list = harness.list();
    let mut editor = harness.editor();
    list.reload().unwrap();
    assert!(list.is_empty());

    harness.capture("while browsing");
    assert_eq!(list.pump(editor.state()).unwrap(), RefreshOutcome::Reloaded);
    assert_eq!(list.notes().len(), 1);

    editor.new_note();
    editor.input("typing").unwrap();
    editor.input("typing more").unwrap();
    assert_eq!(
        list.pump(editor.state()).unwrap(),
        RefreshOutcome::Suppressed { events: 2 }
    );
    assert_eq!(list.notes().len(), 1);

    editor.close().unwrap();
    list.reload().unwrap();
    assert_eq!(list.notes().len(), 2);
}
