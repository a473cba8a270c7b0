use journa_core::repo::sidecar;
use journa_core::{
    Editor, FocusOutcome, FontMeta, JournalRef, NoteRef, SaveOutcome, SaveSkip, SelectOutcome,
    SessionState, TrunkRef, Workspace,
};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn setup() -> (TempDir, Workspace) {
    let dir = tempfile::tempdir().unwrap();
    let workspace = Workspace::open(dir.path().join("Trunks")).unwrap();
    (dir, workspace)
}

fn daily(workspace: &Workspace) -> JournalRef {
    let trunk = TrunkRef::new("work");
    if !workspace.store().trunk_exists(&trunk) {
        workspace.create_trunk("Work").unwrap();
    }
    let journal = JournalRef::new("work", "daily");
    if !workspace.store().journal_exists(&journal) {
        workspace.create_journal(&trunk, "Daily").unwrap();
    }
    journal
}

fn note_with(workspace: &Workspace, name: &str, body: &str) -> NoteRef {
    let journal = daily(workspace);
    let note = workspace.create_note(&journal, name).unwrap();
    fs::write(workspace.store().note_path(&note), body).unwrap();
    note
}

fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut entries = Vec::new();
    collect(root, root, &mut entries);
    entries.sort();
    entries
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let relative = path.strip_prefix(root).unwrap().display().to_string();
        if path.is_dir() {
            out.push((relative, Vec::new()));
            collect(root, &path, out);
        } else {
            out.push((relative, fs::read(&path).unwrap()));
        }
    }
}

fn keep() -> bool {
    true
}

fn refuse() -> bool {
    false
}

#[test]
fn whitespace_only_save_never_touches_disk() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "original");
    let before = snapshot(workspace.root());

    workspace.set_buffer("  \n\t ");
    assert_eq!(
        workspace.save_current().unwrap(),
        SaveOutcome::Skipped(SaveSkip::EmptyContent)
    );

    workspace.select_note(&note, keep).unwrap();
    workspace.set_buffer("\n\n");
    assert_eq!(
        workspace.save_current().unwrap(),
        SaveOutcome::Skipped(SaveSkip::EmptyContent)
    );
    assert_eq!(snapshot(workspace.root()), before);
}

#[test]
fn typing_without_selection_materializes_unsaved_note() {
    let (_dir, mut workspace) = setup();
    workspace.set_buffer("stray thought");

    let note = match workspace.save_current().unwrap() {
        SaveOutcome::Created(note) => note,
        other => panic!("expected a created note, got {other:?}"),
    };
    assert_eq!(note.journal_ref(), JournalRef::unsaved());
    let pattern = Regex::new(r"^note_[0-9]{8}_[0-9]{6}$").unwrap();
    assert!(pattern.is_match(&note.slug), "slug was {}", note.slug);

    let path = workspace.store().note_path(&note);
    assert_eq!(fs::read_to_string(&path).unwrap(), "stray thought");
    assert_eq!(workspace.session().open_path(), Some(path.as_path()));
    assert!(workspace.session().label().starts_with("Note "));

    workspace.set_buffer("stray thought, expanded");
    assert_eq!(
        workspace.save_current().unwrap(),
        SaveOutcome::Written(path.clone())
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "stray thought, expanded"
    );
}

#[test]
fn content_is_written_byte_for_byte() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "x");
    workspace.select_note(&note, keep).unwrap();

    let body = "  leading\ttabs\n\ntrailing  \n";
    workspace.set_buffer(body);
    workspace.save_current().unwrap();
    assert_eq!(workspace.load_note_content(&note).unwrap(), body);
}

#[test]
fn select_note_saves_previous_note_first() {
    let (_dir, mut workspace) = setup();
    let monday = note_with(&workspace, "Monday", "monday body");
    let tuesday = note_with(&workspace, "Tuesday", "tuesday body");

    workspace.select_note(&monday, keep).unwrap();
    workspace.set_buffer("monday edited");
    let outcome = workspace.select_note(&tuesday, keep).unwrap();

    assert_eq!(outcome, SelectOutcome::Opened(tuesday.clone()));
    assert_eq!(workspace.load_note_content(&monday).unwrap(), "monday edited");
    assert_eq!(workspace.session().buffer(), "tuesday body");
    assert_eq!(workspace.session().label(), "Tuesday");
}

#[test]
fn select_note_loads_font_and_container_resets_it() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "x");
    let meta = FontMeta {
        font_family: "Georgia".to_string(),
        font_size: 16,
    };
    sidecar::save(&workspace.store().note_path(&note), &meta).unwrap();

    workspace.select_note(&note, keep).unwrap();
    assert_eq!(workspace.session().font(), &meta);

    assert_eq!(
        workspace.select_container(keep).unwrap(),
        SelectOutcome::Cleared
    );
    assert_eq!(workspace.session().state(), &SessionState::NoSelection);
    assert_eq!(workspace.session().font(), &FontMeta::default());
}

#[test]
fn focus_regain_with_file_present_changes_nothing() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "x");
    workspace.select_note(&note, keep).unwrap();

    let outcome = workspace.on_focus_regained(|| panic!("must not ask"));
    assert_eq!(outcome, FocusOutcome::Unchanged);
    assert_eq!(workspace.session().label(), "Monday");
}

#[test]
fn externally_deleted_note_is_kept_in_memory_and_never_recreated() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "x");
    let other = note_with(&workspace, "Tuesday", "y");
    workspace.select_note(&note, keep).unwrap();
    let path = workspace.store().note_path(&note);
    fs::remove_file(&path).unwrap();

    workspace.set_buffer("typed after delete");
    assert_eq!(
        workspace.save_current().unwrap(),
        SaveOutcome::Skipped(SaveSkip::BackingFileMissing)
    );
    assert!(!path.exists());

    assert_eq!(workspace.on_focus_regained(keep), FocusOutcome::KeptInMemory);
    assert!(workspace.session().is_in_memory());
    assert_eq!(workspace.session().label(), "In-Memory: Monday");
    assert_eq!(workspace.session().buffer(), "typed after delete");
    assert_eq!(
        workspace.save_current().unwrap(),
        SaveOutcome::Skipped(SaveSkip::InMemory)
    );
    assert!(!path.exists());

    assert_eq!(
        workspace.select_note(&other, refuse).unwrap(),
        SelectOutcome::Cancelled
    );
    assert!(workspace.session().is_in_memory());

    assert_eq!(
        workspace.select_note(&other, keep).unwrap(),
        SelectOutcome::Opened(other)
    );
    assert!(!path.exists());
}

#[test]
fn declining_to_keep_discards_buffer() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "x");
    workspace.select_note(&note, keep).unwrap();
    workspace.set_buffer("lost");
    fs::remove_file(workspace.store().note_path(&note)).unwrap();

    assert_eq!(workspace.on_focus_regained(refuse), FocusOutcome::Discarded);
    assert_eq!(workspace.session().state(), &SessionState::NoSelection);
    assert_eq!(workspace.session().buffer(), "");
}

#[test]
fn container_selection_with_in_memory_note_asks_first() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "x");
    workspace.select_note(&note, keep).unwrap();
    fs::remove_file(workspace.store().note_path(&note)).unwrap();
    workspace.on_focus_regained(keep);

    assert_eq!(
        workspace.select_container(refuse).unwrap(),
        SelectOutcome::Cancelled
    );
    assert!(workspace.session().is_in_memory());
    assert_eq!(
        workspace.select_container(keep).unwrap(),
        SelectOutcome::Cleared
    );
    assert_eq!(workspace.session().label(), "Untitled");
}

#[test]
fn set_font_persists_only_for_file_backed_notes() {
    let (_dir, mut workspace) = setup();
    let meta = FontMeta {
        font_family: "Courier".to_string(),
        font_size: 10,
    };
    let before = snapshot(workspace.root());
    workspace.set_font(meta.clone()).unwrap();
    assert_eq!(snapshot(workspace.root()), before);

    let note = note_with(&workspace, "Monday", "x");
    workspace.select_note(&note, keep).unwrap();
    workspace.set_font(meta.clone()).unwrap();
    assert_eq!(workspace.session().font(), &meta);
    assert_eq!(workspace.load_note_font(&note), meta);
}

#[test]
fn deleting_open_note_or_its_ancestor_clears_session() {
    let (_dir, mut workspace) = setup();
    let monday = note_with(&workspace, "Monday", "x");
    let tuesday = note_with(&workspace, "Tuesday", "y");

    workspace.select_note(&monday, keep).unwrap();
    workspace.delete_note(&tuesday).unwrap();
    assert_eq!(workspace.session().label(), "Monday");

    workspace.delete_note(&monday).unwrap();
    assert_eq!(workspace.session().state(), &SessionState::NoSelection);

    let wednesday = note_with(&workspace, "Wednesday", "z");
    workspace.select_note(&wednesday, keep).unwrap();
    workspace.delete_trunk(&TrunkRef::new("work")).unwrap();
    assert_eq!(workspace.session().state(), &SessionState::NoSelection);
    assert_eq!(
        workspace.save_current().unwrap(),
        SaveOutcome::Skipped(SaveSkip::EmptyContent)
    );
}

#[tokio::test(start_paused = true)]
async fn editor_saves_once_after_quiet_window() {
    let (_dir, workspace) = setup();
    let note = note_with(&workspace, "Monday", "original");
    let path = workspace.store().note_path(&note);
    let mut editor = Editor::new(workspace, Duration::from_millis(2000));
    editor.select_note(&note, keep).unwrap();

    editor.edit("d");
    tokio::time::sleep(Duration::from_millis(500)).await;
    editor.edit("dr");
    tokio::time::sleep(Duration::from_millis(500)).await;
    editor.edit("draft");
    assert!(editor.is_save_pending());

    tokio::time::sleep(Duration::from_millis(1999)).await;
    assert_eq!(fs::read_to_string(&path).unwrap(), "original");

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(fs::read_to_string(&path).unwrap(), "draft");
    assert!(!editor.is_save_pending());
}

#[tokio::test(start_paused = true)]
async fn editor_flushes_pending_edit_on_note_switch() {
    let (_dir, workspace) = setup();
    let monday = note_with(&workspace, "Monday", "monday");
    let tuesday = note_with(&workspace, "Tuesday", "tuesday");
    let monday_path = workspace.store().note_path(&monday);
    let tuesday_path = workspace.store().note_path(&tuesday);
    let mut editor = Editor::new(workspace, Duration::from_millis(2000));

    editor.select_note(&monday, keep).unwrap();
    editor.edit("monday edited");
    editor.select_note(&tuesday, keep).unwrap();

    assert!(!editor.is_save_pending());
    assert_eq!(fs::read_to_string(&monday_path).unwrap(), "monday edited");

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(fs::read_to_string(&monday_path).unwrap(), "monday edited");
    assert_eq!(fs::read_to_string(&tuesday_path).unwrap(), "tuesday");
}

#[tokio::test(start_paused = true)]
async fn editor_close_flushes_pending_edit() {
    let (_dir, workspace) = setup();
    let note = note_with(&workspace, "Monday", "monday");
    let path = workspace.store().note_path(&note);
    let mut editor = Editor::new(workspace, Duration::from_millis(2000));
    editor.select_note(&note, keep).unwrap();
    editor.edit("last words");

    let outcome = editor.close().unwrap();
    assert_eq!(outcome, SaveOutcome::Written(path.clone()));
    assert_eq!(fs::read_to_string(&path).unwrap(), "last words");
}

#[test]
fn selecting_missing_note_keeps_in_memory_buffer() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "x");
    workspace.select_note(&note, keep).unwrap();
    workspace.set_buffer("only copy");
    fs::remove_file(workspace.store().note_path(&note)).unwrap();
    workspace.on_focus_regained(keep);

    let ghost = NoteRef::new("work", "daily", "ghost");
    let err = workspace
        .select_note(&ghost, || panic!("must not ask"))
        .unwrap_err();

    assert!(matches!(err, journa_core::WorkspaceError::NotFound(_)));
    assert!(workspace.session().is_in_memory());
    assert_eq!(workspace.session().buffer(), "only copy");
}

#[test]
fn reselecting_open_note_shows_saved_edits() {
    let (_dir, mut workspace) = setup();
    let note = note_with(&workspace, "Monday", "before");
    workspace.select_note(&note, keep).unwrap();
    workspace.set_buffer("after");

    workspace.select_note(&note, keep).unwrap();
    assert_eq!(workspace.session().buffer(), "after");
    assert_eq!(workspace.load_note_content(&note).unwrap(), "after");
}
