//! Integration tests for keepnotes
//!
//! These tests run the services against an in-process fake Notes Service:
//! - Note lifecycle through editor sessions
//! - Labels and label resolution
//! - Bulk actions over a selection, including rollback
//! - Debounced autosave

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use keepnotes::api::{LabelRef, Note, NoteFilter, NoteStatus, NoteType, NotesClient, RecordId};
use keepnotes::app;
use keepnotes::config::Config;
use keepnotes::editor::{BlockKind, BlockPayload, NoteEditor};
use keepnotes::error::AppError;
use keepnotes::selection::SelectionCoordinator;
use keepnotes::services::{
    apply_bulk_action, Autosaver, BulkAction, LabelsService, NotesService, SaveState,
};

#[derive(Default)]
struct Store {
    notes: Vec<Value>,
    labels: Vec<Value>,
    next_id: i64,
    puts: usize,
    failing_deletes: HashSet<String>,
}

type Shared = Arc<Mutex<Store>>;

fn find(records: &[Value], id: &str) -> Option<usize> {
    records.iter().position(|r| r["id"].to_string() == id)
}

fn now() -> Value {
    json!(chrono::Utc::now().to_rfc3339())
}

async fn list_notes(
    State(store): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let store = store.lock().unwrap();
    let status = query.get("status").cloned().unwrap_or_else(|| "active".to_string());
    let notes = store
        .notes
        .iter()
        .filter(|n| n["status"].as_str().unwrap_or("active") == status)
        .cloned()
        .collect();
    Json(notes)
}

async fn create_note(
    State(store): State<Shared>,
    Json(mut note): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut store = store.lock().unwrap();
    store.next_id += 1;
    note["id"] = json!(store.next_id);
    note["createdAt"] = now();
    note["lastModified"] = now();
    store.notes.push(note.clone());
    (StatusCode::CREATED, Json(note))
}

async fn get_note(
    State(store): State<Shared>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let store = store.lock().unwrap();
    let index = find(&store.notes, &id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(store.notes[index].clone()))
}

async fn update_note(
    State(store): State<Shared>,
    Path(id): Path<String>,
    Json(fields): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = store.lock().unwrap();
    store.puts += 1;
    let index = find(&store.notes, &id).ok_or(StatusCode::NOT_FOUND)?;
    let note = &mut store.notes[index];
    if let (Some(target), Some(fields)) = (note.as_object_mut(), fields.as_object()) {
        for (key, value) in fields {
            if key != "id" {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    note["lastModified"] = now();
    Ok(Json(note.clone()))
}

async fn delete_note(
    State(store): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> StatusCode {
    let mut store = store.lock().unwrap();
    if store.failing_deletes.contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    let Some(index) = find(&store.notes, &id) else {
        return StatusCode::NOT_FOUND;
    };
    if query.get("permanent").map(String::as_str) == Some("1") {
        store.notes.remove(index);
    } else {
        store.notes[index]["status"] = json!("trashed");
    }
    StatusCode::NO_CONTENT
}

async fn list_labels(State(store): State<Shared>) -> Json<Vec<Value>> {
    Json(store.lock().unwrap().labels.clone())
}

async fn create_label(
    State(store): State<Shared>,
    Json(mut label): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut store = store.lock().unwrap();
    store.next_id += 1;
    label["id"] = json!(store.next_id);
    store.labels.push(label.clone());
    (StatusCode::CREATED, Json(label))
}

async fn update_label(
    State(store): State<Shared>,
    Path(id): Path<String>,
    Json(fields): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = store.lock().unwrap();
    let index = find(&store.labels, &id).ok_or(StatusCode::NOT_FOUND)?;
    store.labels[index]["name"] = fields["name"].clone();
    Ok(Json(store.labels[index].clone()))
}

async fn delete_label(State(store): State<Shared>, Path(id): Path<String>) -> StatusCode {
    let mut store = store.lock().unwrap();
    match find(&store.labels, &id) {
        Some(index) => {
            store.labels.remove(index);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// Start a fake Notes Service and return its store and a config pointing at it
async fn spawn_service() -> (Shared, Config) {
    let store: Shared = Arc::new(Mutex::new(Store::default()));
    let router = Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route("/labels", get(list_labels).post(create_label))
        .route("/labels/{id}", axum::routing::put(update_label).delete(delete_label))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (store, Config::new(format!("http://{}", addr)))
}

async fn create_test_services() -> (Shared, NotesService, LabelsService) {
    let (store, config) = spawn_service().await;
    let state = app::setup(config).unwrap();
    (store, state.notes, state.labels)
}

async fn create_text_note(service: &NotesService, title: &str, body: &str) -> Note {
    let mut note = Note::draft(NoteType::Note);
    note.title = title.to_string();
    note.content = body.to_string();
    service.save_note(&note).await.unwrap()
}

#[tokio::test]
async fn test_editor_save_and_reopen() {
    let (_store, service, _) = create_test_services().await;

    let mut editor = NoteEditor::new_note(NoteType::List);
    let checklist = editor.blocks().blocks()[0].id.clone();
    editor.set_title("Groceries");
    editor.add_checklist_item(&checklist, "Milk");
    editor.add_checklist_item(&checklist, "Eggs");
    assert!(editor.is_dirty());

    let saved = service.save_editor(&mut editor).await.unwrap();
    assert!(editor.is_persisted());
    assert!(!editor.is_dirty());
    assert_eq!(saved.content, "[ ] Milk\n[ ] Eggs");

    let id = saved.id.clone().unwrap();
    let fetched = service.get_note(&id).await.unwrap();
    assert_eq!(fetched.title, "Groceries");
    assert!(fetched.created_at.is_some());

    let reopened = NoteEditor::open(fetched);
    let blocks = reopened.blocks().blocks();
    assert_eq!(blocks.len(), 1);
    match &blocks[0].payload {
        BlockPayload::Checklist(items) => {
            let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
            assert_eq!(texts, vec!["Milk", "Eggs"]);
        }
        other => panic!("expected checklist, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_note_is_not_sent() {
    let (store, service, _) = create_test_services().await;

    let mut editor = NoteEditor::new_note(NoteType::Note);
    let result = service.save_editor(&mut editor).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(store.lock().unwrap().notes.is_empty());
}

#[tokio::test]
async fn test_missing_note_maps_to_not_found() {
    let (_store, service, _) = create_test_services().await;
    let result = service.get_note(&RecordId::Int(404)).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_lifecycle_transitions() {
    let (_store, service, _) = create_test_services().await;
    let note = create_text_note(&service, "Plan", "Trip").await;
    let id = note.id.unwrap();

    let archived = service.archive_note(&id).await.unwrap();
    assert_eq!(archived.status, NoteStatus::Archived);

    let active = service.unarchive_note(&id).await.unwrap();
    assert_eq!(active.status, NoteStatus::Active);

    let pinned = service.set_pinned(&id, true).await.unwrap();
    assert!(pinned.pinned);

    service.trash_note(&id).await.unwrap();
    let trashed = service
        .list_notes(&NoteFilter::status(NoteStatus::Trashed))
        .await
        .unwrap();
    assert_eq!(trashed.len(), 1);

    let restored = service.restore_note(&id).await.unwrap();
    assert_eq!(restored.status, NoteStatus::Active);
}

#[tokio::test]
async fn test_search_notes() {
    let (_store, service, _) = create_test_services().await;

    let mut editor = NoteEditor::new_note(NoteType::List);
    let checklist = editor.blocks().blocks()[0].id.clone();
    editor.set_title("Shopping");
    editor.add_checklist_item(&checklist, "Oat milk");
    service.save_editor(&mut editor).await.unwrap();

    create_text_note(&service, "Meeting", "Quarterly review").await;
    create_text_note(&service, "Recipes", "Pancakes need MILK").await;

    let results = service.search_notes("milk").await.unwrap();
    assert_eq!(results.len(), 2);

    let results = service.search_notes("quarterly").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Meeting");

    let results = service.search_notes("  ").await.unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn test_empty_trash() {
    let (store, service, _) = create_test_services().await;

    let keep = create_text_note(&service, "Keep", "me").await;
    for title in ["Old", "Older"] {
        let note = create_text_note(&service, title, "gone").await;
        service.trash_note(note.id.as_ref().unwrap()).await.unwrap();
    }

    let removed = service.empty_trash().await.unwrap();
    assert_eq!(removed, 2);

    let store = store.lock().unwrap();
    assert_eq!(store.notes.len(), 1);
    assert_eq!(store.notes[0]["id"], json!(keep.id));
}

#[tokio::test]
async fn test_labels_and_resolution() {
    let (_store, _, labels) = create_test_services().await;

    let work = labels.create_label("Work", None).await.unwrap();
    let home = labels
        .create_label("Home", Some("#00ff00".to_string()))
        .await
        .unwrap();

    let duplicate = labels.create_label("work", None).await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));

    let resolved = labels
        .resolve(&[
            LabelRef::Id(RecordId::from("home")),
            LabelRef::Embedded(work.clone()),
            LabelRef::Id(RecordId::Int(999)),
            LabelRef::Id(home.id.clone()),
        ])
        .await
        .unwrap();
    assert_eq!(resolved, vec![LabelRef::Id(home.id.clone()), LabelRef::Id(work.id.clone())]);

    let renamed = labels.rename_label(&work.id, "Office", None).await.unwrap();
    assert_eq!(renamed.name, "Office");

    labels.delete_label(&home.id).await.unwrap();
    assert_eq!(labels.list_labels().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_archive_clears_selection() {
    let (_store, service, _) = create_test_services().await;
    for title in ["One", "Two", "Three"] {
        create_text_note(&service, title, "body").await;
    }

    let mut notes = service
        .list_notes(&NoteFilter::status(NoteStatus::Active))
        .await
        .unwrap();
    let mut selection = SelectionCoordinator::new(notes.iter().filter_map(|n| n.id.clone()));
    selection.toggle_selection(notes[0].id.as_ref().unwrap(), None);
    selection.toggle_selection(notes[2].id.as_ref().unwrap(), None);

    let count = apply_bulk_action(&service, &mut selection, &mut notes, BulkAction::Archive)
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Two");
    assert!(!selection.is_active());
    assert_eq!(selection.selected_count(), 0);

    let archived = service
        .list_notes(&NoteFilter::status(NoteStatus::Archived))
        .await
        .unwrap();
    assert_eq!(archived.len(), 2);
}

#[tokio::test]
async fn test_bulk_failure_rolls_back() {
    let (store, service, _) = create_test_services().await;
    for title in ["One", "Two", "Three"] {
        create_text_note(&service, title, "body").await;
    }
    let mut notes = service
        .list_notes(&NoteFilter::status(NoteStatus::Active))
        .await
        .unwrap();
    let failing = notes[1].id.clone().unwrap();
    store
        .lock()
        .unwrap()
        .failing_deletes
        .insert(failing.to_string());

    let mut selection = SelectionCoordinator::new(notes.iter().filter_map(|n| n.id.clone()));
    selection.select_all();

    let result = apply_bulk_action(&service, &mut selection, &mut notes, BulkAction::Trash).await;

    match result {
        Err(AppError::BulkActionFailed { failed, total, .. }) => {
            assert_eq!(failed, 1);
            assert_eq!(total, 3);
        }
        other => panic!("expected bulk failure, got {:?}", other),
    }
    assert_eq!(notes.len(), 3);
    assert!(selection.is_active());
    assert_eq!(selection.selected_count(), 3);
}

#[tokio::test]
async fn test_autosave_coalesces_rapid_edits() {
    let (store, service, _) = create_test_services().await;
    let note = create_text_note(&service, "Draft", "body").await;

    let autosaver = Autosaver::spawn(service.clone(), Duration::from_millis(50));
    let mut editor = NoteEditor::open(note);
    for title in ["Draft 1", "Draft 2", "Final"] {
        editor.set_title(title);
        assert!(autosaver.schedule(editor.snapshot().unwrap()));
    }
    assert_eq!(autosaver.state(), SaveState::Dirty);

    tokio::time::timeout(Duration::from_secs(5), autosaver.wait_clean())
        .await
        .unwrap();

    let store = store.lock().unwrap();
    assert_eq!(store.puts, 1);
    assert_eq!(store.notes[0]["title"], json!("Final"));
    assert!(autosaver.last_error().is_none());
    assert_eq!(autosaver.last_saved().unwrap().title, "Final");
}

#[tokio::test]
async fn test_autosave_skips_unsaved_notes() {
    let (store, service, _) = create_test_services().await;
    let autosaver = Autosaver::spawn(service, Duration::from_millis(50));

    let mut editor = NoteEditor::new_note(NoteType::Note);
    editor.set_title("Not yet saved");
    assert!(!autosaver.schedule(editor.snapshot().unwrap()));
    assert_eq!(autosaver.state(), SaveState::Clean);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(store.lock().unwrap().notes.is_empty());
}

#[tokio::test]
async fn test_discarded_autosaver_drops_pending_edit() {
    let (store, service, _) = create_test_services().await;
    let note = create_text_note(&service, "Draft", "body").await;

    let autosaver = Autosaver::spawn(service, Duration::from_millis(200));
    let mut editor = NoteEditor::open(note);
    editor.set_title("Never saved");
    autosaver.schedule(editor.snapshot().unwrap());
    autosaver.discard();

    tokio::time::sleep(Duration::from_millis(400)).await;
    let store = store.lock().unwrap();
    assert_eq!(store.puts, 0);
    assert_eq!(store.notes[0]["title"], json!("Draft"));
}

#[tokio::test]
async fn test_image_note_round_trip() {
    let (_store, service, _) = create_test_services().await;
    let dir = TempDir::new().unwrap();

    let mut paths = Vec::new();
    for name in ["a.png", "b.gif"] {
        let path = dir.path().join(name);
        tokio::fs::write(&path, name.as_bytes()).await.unwrap();
        paths.push(path);
    }

    let mut editor = NoteEditor::new_note(NoteType::Image);
    let results = editor.attach_image_files(paths).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(editor.blocks().len(), 2);

    let saved = service.save_editor(&mut editor).await.unwrap();
    let fetched = service.get_note(saved.id.as_ref().unwrap()).await.unwrap();

    let reopened = NoteEditor::open(fetched);
    let kinds: Vec<BlockKind> = reopened.blocks().iter().map(|b| b.kind()).collect();
    assert_eq!(kinds, vec![BlockKind::Image, BlockKind::Image]);
}

#[tokio::test]
async fn test_client_from_env_config() {
    let client = NotesClient::new(&Config::from_env()).unwrap();
    assert!(!client.base_url().ends_with('/'));
}
