//! Editor session
//!
//! One open note: its metadata, its block list and a dirty flag. Every
//! change that actually modifies the note sets the flag; the autosaver
//! and explicit saves consume `snapshot()`.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

use super::block::{
    Block, BlockId, BlockKind, BlockPayload, DrawingPayload, FormatFlag, ImagePayload,
};
use super::media::{read_data_url, spawn_image_reads};
use super::ops::BlockList;
use super::reconstruct::reconstruct;
use super::serialize::serialize;
use crate::api::{LabelRef, Note, NoteType, RecordId};
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct NoteEditor {
    note: Note,
    blocks: BlockList,
    dirty: bool,
}

impl NoteEditor {
    /// Start editing a brand-new note of the given type
    pub fn new_note(note_type: NoteType) -> Self {
        Self {
            note: Note::draft(note_type),
            blocks: reconstruct(None, note_type),
            dirty: false,
        }
    }

    /// Open an existing note record
    pub fn open(note: Note) -> Self {
        let blocks = reconstruct(Some(&note), note.note_type);
        tracing::debug!("Opened note {:?} with {} blocks", note.id, blocks.len());
        Self {
            note,
            blocks,
            dirty: false,
        }
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_persisted(&self) -> bool {
        self.note.is_persisted()
    }

    fn touch(&mut self, changed: bool) -> bool {
        self.dirty |= changed;
        changed
    }

    /// Flatten the current state into a record ready to send
    pub fn snapshot(&self) -> Result<Note> {
        serialize(&self.note, &self.blocks)
    }

    /// Absorb the record returned by the service after a save.
    ///
    /// Only server-owned fields (id, timestamps) are taken so that edits made
    /// while the save was in flight are not lost. The dirty flag is cleared
    /// only when `snapshot` still matches the saved state.
    pub fn mark_saved(&mut self, saved: &Note, snapshot: &Note) {
        self.note.id = saved.id.clone().or_else(|| self.note.id.take());
        self.note.created_at = saved.created_at.or(self.note.created_at);
        self.note.last_modified = saved.last_modified.or(self.note.last_modified);

        let current = self.snapshot().ok();
        let mut expected = snapshot.clone();
        expected.id = self.note.id.clone();
        expected.created_at = self.note.created_at;
        expected.last_modified = self.note.last_modified;
        if current.as_ref() == Some(&expected) {
            self.dirty = false;
        }
    }

    // ===== Metadata =====

    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        let title = title.into();
        let changed = self.note.title != title;
        self.note.title = title;
        self.touch(changed)
    }

    pub fn set_color(&mut self, color: impl Into<String>) -> bool {
        let color = color.into();
        let changed = self.note.color != color;
        self.note.color = color;
        self.touch(changed)
    }

    pub fn set_pinned(&mut self, pinned: bool) -> bool {
        let changed = self.note.pinned != pinned;
        self.note.pinned = pinned;
        self.touch(changed)
    }

    pub fn set_reminder(&mut self, reminder: Option<DateTime<Utc>>) -> bool {
        let changed = self.note.reminder != reminder;
        self.note.reminder = reminder;
        self.touch(changed)
    }

    pub fn add_label(&mut self, label: LabelRef) -> bool {
        if self.note.labels.iter().any(|l| l.id() == label.id()) {
            return false;
        }
        self.note.labels.push(label);
        self.touch(true)
    }

    pub fn remove_label(&mut self, id: &RecordId) -> bool {
        let before = self.note.labels.len();
        self.note.labels.retain(|l| l.id() != id);
        let changed = self.note.labels.len() != before;
        self.touch(changed)
    }

    // ===== Blocks =====

    pub fn update_block(&mut self, id: &BlockId, payload: BlockPayload) -> bool {
        let changed = self.blocks.update_block(id, payload);
        self.touch(changed)
    }

    pub fn insert_block(&mut self, kind: BlockKind, after_index: usize) -> BlockId {
        let id = self.blocks.insert_block(kind, after_index);
        self.touch(true);
        id
    }

    pub fn remove_block(&mut self, id: &BlockId) -> bool {
        let changed = self.blocks.remove_block(id);
        self.touch(changed)
    }

    pub fn split_text_block(
        &mut self,
        index: usize,
        before: impl Into<String>,
        remainder: impl Into<String>,
    ) -> Option<BlockId> {
        let id = self.blocks.split_text_block(index, before, remainder);
        self.touch(id.is_some());
        id
    }

    pub fn toggle_formatting(&mut self, id: &BlockId, flag: FormatFlag) -> bool {
        let changed = self.blocks.toggle_formatting(id, flag);
        self.touch(changed)
    }

    pub fn add_checklist_item(&mut self, id: &BlockId, text: impl Into<String>) -> Option<RecordId> {
        let item = self.blocks.add_checklist_item(id, text);
        self.touch(item.is_some());
        item
    }

    pub fn toggle_checklist_item(&mut self, id: &BlockId, item_id: &RecordId) -> bool {
        let changed = self.blocks.toggle_checklist_item(id, item_id);
        self.touch(changed)
    }

    pub fn remove_checklist_item(&mut self, id: &BlockId, item_id: &RecordId) -> bool {
        let changed = self.blocks.remove_checklist_item(id, item_id);
        self.touch(changed)
    }

    // ===== Media =====

    /// Append an image block, replacing a lone empty placeholder block
    pub fn append_image(&mut self, src: impl Into<String>) -> BlockId {
        self.append_media(BlockPayload::Image(ImagePayload {
            src: Some(src.into()),
        }))
    }

    /// Append a freshly drawn canvas snapshot
    pub fn append_drawing(
        &mut self,
        data_url: impl Into<String>,
        background: Option<String>,
    ) -> BlockId {
        self.append_media(BlockPayload::Drawing(DrawingPayload::drawn(
            data_url, background,
        )))
    }

    fn append_media(&mut self, payload: BlockPayload) -> BlockId {
        let kind = payload.kind();
        let placeholder = match self.blocks.blocks() {
            [only] if only.kind() == kind && only.payload.is_empty() => Some(only.id.clone()),
            _ => None,
        };

        let id = match placeholder {
            Some(id) => {
                self.blocks.update_block(&id, payload);
                id
            }
            None => self.blocks.push(Block::new(payload)),
        };
        self.touch(true);
        id
    }

    /// Read an image file and append it once the read completes
    pub async fn attach_image_file(&mut self, path: &Path) -> Result<BlockId> {
        let data_url = read_data_url(path).await?;
        Ok(self.append_image(data_url))
    }

    /// Read several image files concurrently, appending each as it completes
    pub async fn attach_image_files(&mut self, paths: Vec<PathBuf>) -> Vec<Result<BlockId>> {
        self.append_images_as_read(spawn_image_reads(paths)).await
    }

    /// Append images from in-flight reads in completion order.
    ///
    /// Results come back in that same order; a failed read appends nothing.
    pub async fn append_images_as_read(
        &mut self,
        mut reads: JoinSet<Result<String>>,
    ) -> Vec<Result<BlockId>> {
        let mut results = Vec::with_capacity(reads.len());
        while let Some(joined) = reads.join_next().await {
            let result = match joined {
                Ok(Ok(data_url)) => Ok(self.append_image(data_url)),
                Ok(Err(e)) => {
                    tracing::warn!("Skipping image that could not be read: {}", e);
                    Err(e)
                }
                Err(e) => Err(AppError::Generic(format!("Image read task failed: {}", e))),
            };
            results.push(result);
        }
        results
    }
}
