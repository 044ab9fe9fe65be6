//! Note serialization
//!
//! Flattens a block list back into the persisted record shape: one field
//! per content kind, multi-value media packed as JSON arrays.

use super::block::{BlockPayload, TextFormat};
use super::checklist::to_checklist_text;
use super::compositor;
use super::html::render_paragraph;
use super::media::pack_media_values;
use super::ops::BlockList;
use crate::api::{LabelRef, ListItem, Note, NoteType};
use crate::error::Result;

/// Produce the record to send to the Notes Service.
///
/// Metadata (id, title, type, colour, pin, reminder, status) is carried
/// over from `base`; body fields are rebuilt from `blocks`.
pub fn serialize(base: &Note, blocks: &BlockList) -> Result<Note> {
    let mut texts: Vec<(&str, TextFormat)> = Vec::new();
    let mut list_items: Vec<ListItem> = Vec::new();
    let mut drawings: Vec<String> = Vec::new();
    let mut images: Vec<String> = Vec::new();

    for block in blocks {
        match &block.payload {
            BlockPayload::Text(text) => texts.push((text.text.as_str(), text.format)),
            BlockPayload::Checklist(items) => list_items.extend(items.iter().cloned()),
            BlockPayload::Drawing(drawing) => drawings.extend(compositor::bake(drawing)),
            BlockPayload::Image(image) => images.extend(
                image
                    .src
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string),
            ),
        }
    }

    let mut content = texts
        .iter()
        .map(|(text, _)| *text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    let content_html = if content.is_empty() {
        String::new()
    } else {
        texts
            .iter()
            .filter(|(text, _)| !text.trim().is_empty())
            .map(|(text, format)| render_paragraph(text, *format))
            .collect::<String>()
    };

    // List notes keep a plain-text mirror of their filled-in items
    if base.note_type == NoteType::List && content.is_empty() {
        let filled: Vec<ListItem> = list_items
            .iter()
            .filter(|item| !item.text.trim().is_empty())
            .cloned()
            .collect();
        content = to_checklist_text(&filled);
    }

    let mut note = base.clone();
    note.content = content;
    note.content_html = content_html;
    note.list_items = list_items;
    note.drawing_data = pack_media_values(&drawings)?;
    note.image_url = pack_media_values(&images)?;
    note.labels = base
        .labels
        .iter()
        .map(|label| LabelRef::Id(label.id().clone()))
        .collect();
    note.blocks = None;

    tracing::debug!(
        "Serialized {} blocks: {} chars text, {} items, {} drawings, {} images",
        blocks.len(),
        note.content.len(),
        note.list_items.len(),
        drawings.len(),
        images.len()
    );

    Ok(note)
}
