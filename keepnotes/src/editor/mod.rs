//! Block-based note editor
//!
//! This module provides the note content model:
//! - Block model (text, checklist, image, drawing)
//! - Reconstruction of blocks from a persisted record
//! - Pure editing operations over the block list
//! - Serialization back to the persisted record
//! - The editor session tying these together

pub mod block;
pub mod checklist;
pub mod compositor;
pub mod html;
pub mod media;
pub mod ops;
pub mod reconstruct;
pub mod serialize;
pub mod session;

pub use block::{
    Block, BlockId, BlockKind, BlockPayload, DrawingPayload, FormatFlag, ImagePayload, TextFormat,
    TextPayload,
};
pub use ops::BlockList;
pub use reconstruct::reconstruct;
pub use serialize::serialize;
pub use session::NoteEditor;
