//! Bulk actions over a selection
//!
//! One request per selected note, dispatched concurrently. The batch is
//! all-or-nothing from the caller's point of view: any failure reports the
//! whole batch as failed and the optimistic list change is rolled back.
//! Requests that did succeed are not reconciled; the next refresh from the
//! Notes Service shows the true state.

use std::collections::HashSet;
use tokio::task::JoinSet;

use super::NotesService;
use crate::api::{Note, RecordId};
use crate::error::{AppError, Result};
use crate::selection::SelectionCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Soft delete into the trash
    Trash,
    /// Back to the active list
    Restore,
    Archive,
    /// Remove entirely
    DeletePermanently,
}

impl BulkAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BulkAction::Trash => "trash",
            BulkAction::Restore => "restore",
            BulkAction::Archive => "archive",
            BulkAction::DeletePermanently => "delete",
        }
    }
}

impl NotesService {
    async fn apply_one(&self, action: BulkAction, id: &RecordId) -> Result<()> {
        match action {
            BulkAction::Trash => self.trash_note(id).await,
            BulkAction::Restore => self.restore_note(id).await.map(|_| ()),
            BulkAction::Archive => self.archive_note(id).await.map(|_| ()),
            BulkAction::DeletePermanently => self.delete_permanently(id).await,
        }
    }

    /// Run `action` for every id concurrently and wait for all to settle
    pub async fn run_bulk(&self, action: BulkAction, ids: &[RecordId]) -> Result<()> {
        tracing::info!("Running bulk {} on {} notes", action.as_str(), ids.len());

        let mut tasks = JoinSet::new();
        for id in ids.iter().cloned() {
            let service = self.clone();
            tasks.spawn(async move {
                let result = service.apply_one(action, &id).await;
                (id, result)
            });
        }

        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((id, Err(e))) => {
                    tracing::warn!("Bulk {} failed for note {}: {}", action.as_str(), id, e);
                    failed += 1;
                }
                Err(e) => {
                    tracing::error!("Bulk {} task aborted: {}", action.as_str(), e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(AppError::BulkActionFailed {
                action: action.as_str().to_string(),
                failed,
                total: ids.len(),
            });
        }

        tracing::info!("Bulk {} completed for {} notes", action.as_str(), ids.len());
        Ok(())
    }
}

/// Apply a bulk action to the current selection of a visible note list.
///
/// The selected notes are removed from `notes` up front. On success the
/// selection is cleared and selection mode exited; on failure `notes` is
/// restored and the selection is left as it was so the user can retry.
/// Returns how many notes the action covered.
pub async fn apply_bulk_action(
    service: &NotesService,
    selection: &mut SelectionCoordinator,
    notes: &mut Vec<Note>,
    action: BulkAction,
) -> Result<usize> {
    let ids = selection.selected_ids();
    if ids.is_empty() {
        return Ok(0);
    }

    let previous = notes.clone();
    {
        let selected: HashSet<&RecordId> = ids.iter().collect();
        notes.retain(|note| note.id.as_ref().map_or(true, |id| !selected.contains(id)));
    }

    match service.run_bulk(action, &ids).await {
        Ok(()) => {
            selection.set_collection(notes.iter().filter_map(|n| n.id.clone()));
            selection.exit_selection_mode();
            Ok(ids.len())
        }
        Err(e) => {
            *notes = previous;
            Err(e)
        }
    }
}
