//! Services module
//!
//! Business logic services that coordinate between editor sessions and the
//! Notes Service client.

pub mod autosave;
pub mod bulk;
pub mod labels;
pub mod notes;

pub use autosave::{Autosaver, SaveState};
pub use bulk::{apply_bulk_action, BulkAction};
pub use labels::LabelsService;
pub use notes::NotesService;
