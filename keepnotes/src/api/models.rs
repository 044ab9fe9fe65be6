//! Notes Service models
//!
//! Rust structs mirroring the records exchanged with the Notes Service.
//! Deserialization is deliberately lenient: the service has emitted
//! several shapes over time (numeric vs string ids, `0/1` flags, media
//! fields as JSON strings or arrays) and all of them must load.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::config::DEFAULT_NOTE_COLOR;

/// Opaque identifier assigned by the Notes Service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    pub fn is_empty(&self) -> bool {
        matches!(self, RecordId::Text(s) if s.is_empty())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        RecordId::Text(String::new())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

/// Content kind chosen once when a note is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    #[default]
    Note,
    List,
    Image,
    Drawing,
}

impl NoteType {
    /// Parse a wire value; anything unknown is a plain note
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" | "checklist" => NoteType::List,
            "image" => NoteType::Image,
            "drawing" => NoteType::Drawing,
            _ => NoteType::Note,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteType::Note => "note",
            NoteType::List => "list",
            NoteType::Image => "image",
            NoteType::Drawing => "drawing",
        }
    }
}

impl<'de> Deserialize<'de> for NoteType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(NoteType::parse_or_default).unwrap_or_default())
    }
}

/// Lifecycle state of a note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    #[default]
    Active,
    Archived,
    Trashed,
}

impl NoteStatus {
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "archived" => NoteStatus::Archived,
            "trashed" | "deleted" => NoteStatus::Trashed,
            _ => NoteStatus::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteStatus::Active => "active",
            NoteStatus::Archived => "archived",
            NoteStatus::Trashed => "trashed",
        }
    }
}

impl<'de> Deserialize<'de> for NoteStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(NoteStatus::parse_or_default).unwrap_or_default())
    }
}

/// One checklist entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default, deserialize_with = "de::record_id_or_default")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::string_or_null")]
    pub text: String,
    #[serde(default, deserialize_with = "de::flexible_bool")]
    pub checked: bool,
}

impl ListItem {
    pub fn new(id: impl Into<RecordId>, text: impl Into<String>, checked: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            checked,
        }
    }
}

/// A label as served by the labels resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: RecordId,
    #[serde(default, deserialize_with = "de::string_or_null")]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Create/rename label request
#[derive(Debug, Clone, Serialize)]
pub struct LabelInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Reference to a label held by a note: either a bare id or an embedded label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelRef {
    Id(RecordId),
    Embedded(Label),
}

impl LabelRef {
    pub fn id(&self) -> &RecordId {
        match self {
            LabelRef::Id(id) => id,
            LabelRef::Embedded(label) => &label.id,
        }
    }
}

/// A note record in its persisted, flat shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "de::string_or_null")]
    pub title: String,
    #[serde(rename = "type", default)]
    pub note_type: NoteType,
    /// Plain-text body; a checklist mirror for list notes, a caption for media notes
    #[serde(default, deserialize_with = "de::string_or_null")]
    pub content: String,
    #[serde(default, deserialize_with = "de::string_or_null")]
    pub content_html: String,
    #[serde(rename = "listItems", default, deserialize_with = "de::vec_or_null")]
    pub list_items: Vec<ListItem>,
    /// Single data URL, or a JSON-encoded array of data URLs
    #[serde(default, deserialize_with = "de::media_field")]
    pub drawing_data: String,
    /// Single URL/base64 payload, or a JSON-encoded array of them
    #[serde(default, deserialize_with = "de::media_field")]
    pub image_url: String,
    #[serde(default = "default_color", deserialize_with = "de::color")]
    pub color: String,
    #[serde(default, deserialize_with = "de::flexible_bool")]
    pub pinned: bool,
    #[serde(default, deserialize_with = "de::vec_or_null")]
    pub labels: Vec<LabelRef>,
    #[serde(default, deserialize_with = "de::flexible_datetime")]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: NoteStatus,
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "de::flexible_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "lastModified",
        default,
        deserialize_with = "de::flexible_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<DateTime<Utc>>,
    /// Block list left behind by an earlier editing session, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<serde_json::Value>>,
}

fn default_color() -> String {
    DEFAULT_NOTE_COLOR.to_string()
}

impl Default for Note {
    fn default() -> Self {
        Self::draft(NoteType::Note)
    }
}

impl Note {
    /// An unsaved note of the given type
    pub fn draft(note_type: NoteType) -> Self {
        Self {
            id: None,
            title: String::new(),
            note_type,
            content: String::new(),
            content_html: String::new(),
            list_items: Vec::new(),
            drawing_data: String::new(),
            image_url: String::new(),
            color: default_color(),
            pinned: false,
            labels: Vec::new(),
            reminder: None,
            status: NoteStatus::Active,
            created_at: None,
            last_modified: None,
            blocks: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.as_ref().is_some_and(|id| !id.is_empty())
    }

    /// True when the note carries no title and no body of any kind
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
            && self.content.trim().is_empty()
            && self.list_items.iter().all(|i| i.text.trim().is_empty())
            && self.drawing_data.trim().is_empty()
            && self.image_url.trim().is_empty()
    }
}

/// Query filters for `GET /notes`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub status: Option<NoteStatus>,
    pub label: Option<RecordId>,
    pub note_type: Option<NoteType>,
    pub search: Option<String>,
}

impl NoteFilter {
    pub fn status(status: NoteStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(label) = &self.label {
            query.push(("label", label.to_string()));
        }
        if let Some(note_type) = self.note_type {
            query.push(("type", note_type.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query.push(("search", search.trim().to_string()));
        }
        query
    }
}

/// Lenient field deserializers
mod de {
    use super::*;
    use serde_json::Value;

    pub fn string_or_null<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    pub fn color<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let color = string_or_null(d)?;
        Ok(if color.trim().is_empty() {
            default_color()
        } else {
            color
        })
    }

    pub fn vec_or_null<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
    }

    pub fn record_id_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<RecordId, D::Error> {
        Ok(Option::<RecordId>::deserialize(d)?.unwrap_or_default())
    }

    pub fn flexible_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
            _ => false,
        })
    }

    /// Media fields are kept as the string the flattening rules produce.
    /// An array sent as a real JSON value is re-encoded as its JSON text.
    pub fn media_field<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    pub fn flexible_datetime<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => parse_timestamp(&s),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        })
    }

    fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_note_loads_lenient_shapes() {
        let note: Note = serde_json::from_value(json!({
            "id": 42,
            "title": null,
            "type": "list",
            "content": "[x] Milk",
            "listItems": [
                {"id": 1, "text": "Milk", "checked": 1},
                {"text": "Bread", "checked": "0"},
                {"id": "c", "text": "Eggs", "checked": "1"}
            ],
            "drawing_data": ["data:a", "data:b"],
            "image_url": null,
            "color": "",
            "pinned": "1",
            "labels": [3, "work", {"id": 7, "name": "Home", "color": "#ff0"}],
            "reminder": "2024-05-01 09:30:00",
            "status": "archived",
            "createdAt": "2024-04-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(note.id, Some(RecordId::Int(42)));
        assert_eq!(note.title, "");
        assert_eq!(note.note_type, NoteType::List);
        assert!(note.list_items[0].checked);
        assert!(!note.list_items[1].checked);
        assert!(note.list_items[1].id.is_empty());
        assert!(note.list_items[2].checked);
        assert_eq!(note.drawing_data, r#"["data:a","data:b"]"#);
        assert_eq!(note.image_url, "");
        assert_eq!(note.color, "default");
        assert!(note.pinned);
        assert_eq!(
            note.labels.iter().map(|l| l.id().clone()).collect::<Vec<_>>(),
            vec![RecordId::Int(3), RecordId::from("work"), RecordId::Int(7)]
        );
        assert!(note.reminder.is_some());
        assert_eq!(note.status, NoteStatus::Archived);
        assert!(note.created_at.is_some());
        assert!(note.last_modified.is_none());
    }

    #[test]
    fn test_unknown_enums_fall_back() {
        let note: Note = serde_json::from_value(json!({"type": "sketch", "status": "weird"})).unwrap();
        assert_eq!(note.note_type, NoteType::Note);
        assert_eq!(note.status, NoteStatus::Active);
    }

    #[test]
    fn test_draft_serializes_without_id() {
        let value = serde_json::to_value(Note::draft(NoteType::Drawing)).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["type"], "drawing");
        assert_eq!(value["status"], "active");
        assert_eq!(value["listItems"], json!([]));
        assert!(value.get("blocks").is_none());
    }

    #[test]
    fn test_filter_query() {
        let filter = NoteFilter {
            status: Some(NoteStatus::Trashed),
            label: Some(RecordId::Int(5)),
            note_type: None,
            search: Some("  ".to_string()),
        };
        assert_eq!(
            filter.to_query(),
            vec![("status", "trashed".to_string()), ("label", "5".to_string())]
        );
    }
}
