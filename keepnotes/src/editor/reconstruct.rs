//! Block reconstruction
//!
//! Rebuilds the ordered block list of a note from its persisted record.
//! An explicit block list from an earlier session wins; otherwise blocks
//! are synthesized from the flat fields. This is best-effort: the flat
//! shape cannot always tell two text blocks from one with a blank line.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::block::{
    Block, BlockId, BlockKind, BlockPayload, DrawingPayload, ImagePayload, TextFormat, TextPayload,
};
use super::checklist;
use super::html;
use super::media::decode_media_field;
use super::ops::BlockList;
use crate::api::{ListItem, Note, NoteType, RecordId};

/// The block kind a brand-new note of this type starts with
pub fn default_block_kind(note_type: NoteType) -> BlockKind {
    match note_type {
        NoteType::Note => BlockKind::Text,
        NoteType::List => BlockKind::Checklist,
        NoteType::Image => BlockKind::Image,
        NoteType::Drawing => BlockKind::Drawing,
    }
}

/// Build the block list for a note, or for a new note of `default_type`
pub fn reconstruct(note: Option<&Note>, default_type: NoteType) -> BlockList {
    let Some(note) = note else {
        return BlockList::with_empty(default_block_kind(default_type));
    };

    if let Some(raw) = note.blocks.as_deref() {
        let blocks = normalize_blocks(raw);
        if !blocks.is_empty() {
            tracing::debug!("Restored {} blocks from saved block list", blocks.len());
            return BlockList::new(blocks);
        }
    }

    let blocks = blocks_from_fields(note);
    tracing::debug!(
        "Reconstructed {} blocks for {} note {:?}",
        blocks.len(),
        note.note_type.as_str(),
        note.id
    );

    if blocks.is_empty() {
        BlockList::with_empty(default_block_kind(note.note_type))
    } else {
        BlockList::new(blocks)
    }
}

fn blocks_from_fields(note: &Note) -> Vec<Block> {
    let mut blocks = Vec::new();
    let checklist_text =
        note.note_type == NoteType::List && checklist::is_checklist_text(&note.content);

    if !note.content_html.trim().is_empty() {
        blocks.extend(html::parse_paragraphs(&note.content_html).into_iter().map(|p| {
            Block::new(BlockPayload::Text(TextPayload {
                text: p.text,
                format: p.format,
            }))
        }));
    }
    let from_html = !blocks.is_empty();

    if !from_html && !checklist_text && !note.content.trim().is_empty() {
        blocks.push(Block::text(note.content.clone()));
    }

    if !note.list_items.is_empty() {
        blocks.push(Block::new(BlockPayload::Checklist(normalize_items(
            note.list_items.clone(),
        ))));
    } else if checklist_text && !from_html {
        let items = checklist::parse_checklist_text(&note.content);
        if !items.is_empty() {
            blocks.push(Block::new(BlockPayload::Checklist(items)));
        }
    }

    blocks.extend(
        decode_media_field(&note.drawing_data)
            .into_iter()
            .map(|d| Block::new(BlockPayload::Drawing(DrawingPayload::baked(d)))),
    );

    blocks.extend(decode_media_field(&note.image_url).into_iter().map(|src| {
        Block::new(BlockPayload::Image(ImagePayload { src: Some(src) }))
    }));

    blocks
}

/// Give every item an id; the service may have dropped them
fn normalize_items(items: Vec<ListItem>) -> Vec<ListItem> {
    items
        .into_iter()
        .map(|mut item| {
            if item.id.is_empty() {
                item.id = RecordId::Text(Uuid::new_v4().to_string());
            }
            item
        })
        .collect()
}

// ===== Saved block lists =====

fn normalize_blocks(raw: &[Value]) -> Vec<Block> {
    raw.iter()
        .filter_map(Value::as_object)
        .map(normalize_block)
        .collect()
}

fn normalize_block(obj: &Map<String, Value>) -> Block {
    let id = obj
        .get("id")
        .and_then(scalar_string)
        .filter(|s| !s.is_empty())
        .map(BlockId::from)
        .unwrap_or_else(BlockId::generate);

    let kind = first_of(obj, &["type", "kind"])
        .and_then(Value::as_str)
        .map(BlockKind::parse_or_default)
        .unwrap_or(BlockKind::Text);

    let payload = match kind {
        BlockKind::Text => BlockPayload::Text(TextPayload {
            text: first_string(obj, &["content", "text"]).unwrap_or_default(),
            format: normalize_format(obj),
        }),
        BlockKind::Checklist => {
            let items = first_of(obj, &["items", "content", "listItems"])
                .and_then(Value::as_array)
                .map(|entries| entries.iter().filter_map(normalize_item).collect())
                .unwrap_or_default();
            BlockPayload::Checklist(normalize_items(items))
        }
        BlockKind::Image => BlockPayload::Image(ImagePayload {
            src: first_string(obj, &["content", "src", "url", "image_url"]),
        }),
        BlockKind::Drawing => BlockPayload::Drawing(DrawingPayload {
            data_url: first_string(obj, &["content", "data", "dataUrl", "drawing_data"]),
            background: first_string(obj, &["background", "bgColor", "backgroundColor"]),
        }),
    };

    Block { id, payload }
}

fn normalize_item(value: &Value) -> Option<ListItem> {
    match value {
        Value::String(text) => Some(ListItem {
            text: text.clone(),
            ..ListItem::default()
        }),
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

fn normalize_format(obj: &Map<String, Value>) -> TextFormat {
    let source = first_of(obj, &["formatting", "format"])
        .and_then(Value::as_object)
        .unwrap_or(obj);
    TextFormat {
        bold: source.get("bold").is_some_and(truthy),
        italic: source.get("italic").is_some_and(truthy),
        underline: source.get("underline").is_some_and(truthy),
    }
}

fn first_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_of(obj, keys)
        .and_then(scalar_string)
        .filter(|s| !s.is_empty())
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
        _ => false,
    }
}
