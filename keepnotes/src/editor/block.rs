//! Block model
//!
//! A block is the in-memory editing unit of a note. Blocks only exist
//! while a note is open; what gets persisted is their flattened projection.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::ListItem;
use crate::config::{BLOCK_ID_LENGTH, DEFAULT_DRAWING_BACKGROUND};

/// Session-local block identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(String);

impl BlockId {
    /// Short random token, unique enough within one editing session
    pub fn generate() -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(BLOCK_ID_LENGTH)
            .map(char::from)
            .collect();
        BlockId(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        BlockId(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        BlockId(s)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Checklist,
    Image,
    Drawing,
}

impl BlockKind {
    /// Unknown kinds become text blocks
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "checklist" | "list" => BlockKind::Checklist,
            "image" => BlockKind::Image,
            "drawing" => BlockKind::Drawing,
            _ => BlockKind::Text,
        }
    }
}

/// Formatting flags of a text block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatFlag {
    Bold,
    Italic,
    Underline,
}

impl TextFormat {
    pub fn toggle(&mut self, flag: FormatFlag) {
        match flag {
            FormatFlag::Bold => self.bold = !self.bold,
            FormatFlag::Italic => self.italic = !self.italic,
            FormatFlag::Underline => self.underline = !self.underline,
        }
    }

    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
    pub format: TextFormat,
}

impl TextPayload {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Remote URL or base64 data URL
    pub src: Option<String>,
}

/// A canvas snapshot.
///
/// `background` is the colour the strokes were drawn over. Snapshots loaded
/// from a record were baked when they were saved and carry `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawingPayload {
    pub data_url: Option<String>,
    pub background: Option<String>,
}

impl DrawingPayload {
    /// A fresh canvas snapshot over the given background (white if none)
    pub fn drawn(data_url: impl Into<String>, background: Option<String>) -> Self {
        Self {
            data_url: Some(data_url.into()),
            background: Some(background.unwrap_or_else(|| DEFAULT_DRAWING_BACKGROUND.to_string())),
        }
    }

    /// A snapshot that already has its background baked in
    pub fn baked(data_url: impl Into<String>) -> Self {
        Self {
            data_url: Some(data_url.into()),
            background: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum BlockPayload {
    Text(TextPayload),
    Checklist(Vec<ListItem>),
    Image(ImagePayload),
    Drawing(DrawingPayload),
}

impl BlockPayload {
    pub fn empty(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Text => BlockPayload::Text(TextPayload::default()),
            BlockKind::Checklist => BlockPayload::Checklist(Vec::new()),
            BlockKind::Image => BlockPayload::Image(ImagePayload::default()),
            BlockKind::Drawing => BlockPayload::Drawing(DrawingPayload::default()),
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            BlockPayload::Text(_) => BlockKind::Text,
            BlockPayload::Checklist(_) => BlockKind::Checklist,
            BlockPayload::Image(_) => BlockKind::Image,
            BlockPayload::Drawing(_) => BlockKind::Drawing,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BlockPayload::Text(t) => t.text.is_empty(),
            BlockPayload::Checklist(items) => items.is_empty(),
            BlockPayload::Image(img) => img.src.as_deref().map_or(true, str::is_empty),
            BlockPayload::Drawing(d) => d.data_url.as_deref().map_or(true, str::is_empty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub payload: BlockPayload,
}

impl Block {
    pub fn new(payload: BlockPayload) -> Self {
        Self {
            id: BlockId::generate(),
            payload,
        }
    }

    pub fn empty(kind: BlockKind) -> Self {
        Self::new(BlockPayload::empty(kind))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(BlockPayload::Text(TextPayload::plain(text)))
    }

    pub fn kind(&self) -> BlockKind {
        self.payload.kind()
    }
}
