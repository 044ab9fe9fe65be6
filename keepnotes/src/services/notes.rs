//! Notes service
//!
//! High-level business logic for notes operations.
//! Handles save validation and note lifecycle transitions.

use serde_json::json;

use crate::api::{Note, NoteFilter, NoteStatus, NoteType, NotesClient, RecordId};
use crate::editor::NoteEditor;
use crate::error::{AppError, Result};

/// Reject saves that would persist nothing.
///
/// Text and list notes need a title or some body; media notes are
/// always accepted.
pub fn validate_for_save(note: &Note) -> Result<()> {
    match note.note_type {
        NoteType::Note | NoteType::List if note.is_blank() => Err(AppError::Validation(
            "Note has no title and no content".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Service for managing notes
#[derive(Clone)]
pub struct NotesService {
    client: NotesClient,
}

impl NotesService {
    pub fn new(client: NotesClient) -> Self {
        Self { client }
    }

    /// List notes matching a filter
    pub async fn list_notes(&self, filter: &NoteFilter) -> Result<Vec<Note>> {
        let notes = self.client.list_notes(filter).await?;
        tracing::debug!("Fetched {} notes", notes.len());
        Ok(notes)
    }

    /// Get a note by ID
    pub async fn get_note(&self, id: &RecordId) -> Result<Note> {
        self.client.get_note(id).await
    }

    /// Create or update a serialized note.
    ///
    /// Notes without an id are created; the returned record carries the id
    /// assigned by the service.
    pub async fn save_note(&self, note: &Note) -> Result<Note> {
        validate_for_save(note)?;

        match note.id.as_ref().filter(|id| !id.is_empty()) {
            Some(id) => {
                tracing::debug!("Updating note: {}", id);
                let saved = self.client.update_note(id, note).await?;
                tracing::debug!("Note updated successfully: {}", id);
                Ok(saved)
            }
            None => {
                tracing::info!("Creating new {} note: {}", note.note_type.as_str(), note.title);
                let saved = self.client.create_note(note).await?;
                tracing::info!("Note created successfully: {:?}", saved.id);
                Ok(saved)
            }
        }
    }

    /// Serialize an editor session, save it and record the result
    pub async fn save_editor(&self, editor: &mut NoteEditor) -> Result<Note> {
        let snapshot = editor.snapshot()?;
        let saved = self.save_note(&snapshot).await?;
        editor.mark_saved(&saved, &snapshot);
        Ok(saved)
    }

    async fn set_status(&self, id: &RecordId, status: NoteStatus) -> Result<Note> {
        tracing::info!("Moving note {} to {}", id, status.as_str());
        self.client
            .patch_note(id, &json!({ "status": status.as_str() }))
            .await
    }

    /// Move a note to the trash (soft delete)
    pub async fn trash_note(&self, id: &RecordId) -> Result<()> {
        tracing::info!("Deleting note: {}", id);
        self.client.delete_note(id, false).await?;
        tracing::info!("Note deleted successfully: {}", id);
        Ok(())
    }

    /// Bring a trashed or archived note back to the active list
    pub async fn restore_note(&self, id: &RecordId) -> Result<Note> {
        self.set_status(id, NoteStatus::Active).await
    }

    pub async fn archive_note(&self, id: &RecordId) -> Result<Note> {
        self.set_status(id, NoteStatus::Archived).await
    }

    pub async fn unarchive_note(&self, id: &RecordId) -> Result<Note> {
        self.set_status(id, NoteStatus::Active).await
    }

    pub async fn set_pinned(&self, id: &RecordId, pinned: bool) -> Result<Note> {
        tracing::debug!("Setting pinned={} on note {}", pinned, id);
        self.client.patch_note(id, &json!({ "pinned": pinned })).await
    }

    /// Remove a note entirely
    pub async fn delete_permanently(&self, id: &RecordId) -> Result<()> {
        tracing::info!("Permanently deleting note: {}", id);
        self.client.delete_note(id, true).await
    }

    /// Permanently delete everything in the trash; returns how many notes went
    pub async fn empty_trash(&self) -> Result<usize> {
        let trashed = self.list_notes(&NoteFilter::status(NoteStatus::Trashed)).await?;

        let mut removed = 0;
        for id in trashed.iter().filter_map(|n| n.id.as_ref()) {
            self.delete_permanently(id).await?;
            removed += 1;
        }

        tracing::info!("Emptied trash: {} notes removed", removed);
        Ok(removed)
    }

    /// Search active notes by title, text content or checklist items
    pub async fn search_notes(&self, query: &str) -> Result<Vec<Note>> {
        let all_notes = self.list_notes(&NoteFilter::status(NoteStatus::Active)).await?;

        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return Ok(all_notes);
        }

        let filtered: Vec<Note> = all_notes
            .into_iter()
            .filter(|note| {
                note.title.to_lowercase().contains(&query_lower)
                    || note.content.to_lowercase().contains(&query_lower)
                    || note
                        .list_items
                        .iter()
                        .any(|item| item.text.to_lowercase().contains(&query_lower))
            })
            .collect();

        Ok(filtered)
    }
}
