//! Media fields and data URLs
//!
//! `drawing_data` and `image_url` hold either a single value or, for notes
//! with several drawings/images, a JSON array of values encoded as a string.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

use crate::error::{AppError, Result};

/// Decode a media field into its individual values.
///
/// A JSON array yields its non-empty string entries. Anything else,
/// including malformed JSON, is a single plain value.
pub fn decode_media_field(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(entries)) => {
                return entries
                    .into_iter()
                    .filter_map(|entry| match entry {
                        Value::String(s) if !s.trim().is_empty() => Some(s),
                        _ => None,
                    })
                    .collect();
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Media field is not valid JSON, keeping it as one value: {}", e),
        }
    }

    vec![raw.to_string()]
}

/// Pack values back into a media field: `""`, the value itself, or a JSON array
pub fn pack_media_values(values: &[String]) -> Result<String> {
    Ok(match values {
        [] => String::new(),
        [single] => single.clone(),
        many => serde_json::to_string(many)?,
    })
}

/// A decoded `data:<mime>;base64,<payload>` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a base64 data URL; `None` for anything else
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.trim().strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime_type = meta.strip_suffix(";base64")?;
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        Some(Self {
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
    }
}

/// Guess an image MIME type from a file extension
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Read an image file into a base64 data URL
pub async fn read_data_url(path: &Path) -> Result<String> {
    let mime_type = mime_type_for(path);
    if !mime_type.starts_with("image/") {
        return Err(AppError::Image(format!(
            "Unsupported image file: {}",
            path.display()
        )));
    }

    let bytes = tokio::fs::read(path).await?;
    tracing::debug!("Read image {:?} ({} bytes)", path, bytes.len());

    Ok(DataUrl::encode(mime_type, &bytes))
}

/// Start reading several image files at once; each read yields its data URL
pub fn spawn_image_reads(paths: impl IntoIterator<Item = PathBuf>) -> JoinSet<Result<String>> {
    let mut reads = JoinSet::new();
    for path in paths {
        reads.spawn(async move { read_data_url(&path).await });
    }
    reads
}
