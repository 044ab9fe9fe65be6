//! Selection coordinator
//!
//! Tracks which notes of one visible collection are selected for a bulk
//! action. The selection belongs to the view that created it and is
//! discarded when that view switches collection.

use std::collections::HashSet;

use crate::api::RecordId;

/// Derived selection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    None,
    Partial,
    All,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    collection: Vec<RecordId>,
    selected: HashSet<RecordId>,
    active: bool,
}

impl SelectionCoordinator {
    pub fn new(collection: impl IntoIterator<Item = RecordId>) -> Self {
        Self {
            collection: collection.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Refresh the collection (e.g. after a reload); ids that disappeared
    /// are dropped from the selection
    pub fn set_collection(&mut self, collection: impl IntoIterator<Item = RecordId>) {
        self.collection = collection.into_iter().collect();
        let present: HashSet<&RecordId> = self.collection.iter().collect();
        self.selected.retain(|id| present.contains(id));
    }

    /// Switch to a different collection (tab/filter change); the selection is discarded
    pub fn reset_collection(&mut self, collection: impl IntoIterator<Item = RecordId>) {
        self.collection = collection.into_iter().collect();
        self.exit_selection_mode();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn enter_selection_mode(&mut self) {
        self.active = true;
    }

    /// Leave selection mode; always empties the selection
    pub fn exit_selection_mode(&mut self) {
        self.active = false;
        self.selected.clear();
    }

    /// Flip membership of `id`, or set it explicitly with `force`.
    /// Selecting a note enters selection mode.
    pub fn toggle_selection(&mut self, id: &RecordId, force: Option<bool>) {
        let select = force.unwrap_or_else(|| !self.selected.contains(id));
        if select {
            self.selected.insert(id.clone());
            self.active = true;
        } else {
            self.selected.remove(id);
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.collection.iter().cloned().collect();
        self.active = true;
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in collection order
    pub fn selected_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self
            .collection
            .iter()
            .filter(|id| self.selected.contains(*id))
            .cloned()
            .collect();
        // Selected ids not (yet) in the collection go last, in a stable order
        let mut extra: Vec<RecordId> = self
            .selected
            .iter()
            .filter(|id| !self.collection.contains(id))
            .cloned()
            .collect();
        extra.sort();
        ids.extend(extra);
        ids
    }

    pub fn selection_mode(&self) -> SelectionMode {
        if self.selected.is_empty() {
            SelectionMode::None
        } else if self.collection.iter().all(|id| self.selected.contains(id))
            && self.selected.len() == self.collection.len()
        {
            SelectionMode::All
        } else {
            SelectionMode::Partial
        }
    }
}
