//! HTTP client for the Notes Service
//!
//! Thin typed layer over the REST surface. Business rules (validation,
//! optimistic updates, bulk semantics) live in the services.

use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::models::{Label, LabelInput, Note, NoteFilter, RecordId};
use crate::config::Config;
use crate::error::{AppError, Result};

/// HTTP client for the Notes Service
#[derive(Debug, Clone)]
pub struct NotesClient {
    base_url: String,
    client: Client,
}

impl NotesClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("keepnotes/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL from the base plus path segments, each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Generic(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Generic(format!("Base URL cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<reqwest::RequestBuilder> {
        Ok(self.client.request(method, self.url(segments)?))
    }

    /// Convert HTTP failures into AppError and decode the body
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Notes Service returned {}: {}", status, body);
        match status {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(body)),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(AppError::Validation(body))
            }
            _ => Err(AppError::Service {
                status: status.as_u16(),
                message: body,
            }),
        }
    }

    // ===== Notes =====

    /// List notes matching the filter
    pub async fn list_notes(&self, filter: &NoteFilter) -> Result<Vec<Note>> {
        let response = self
            .request(Method::GET, &["notes"])?
            .query(&filter.to_query())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Get a note by ID
    pub async fn get_note(&self, id: &RecordId) -> Result<Note> {
        let id = id.to_string();
        let response = self.request(Method::GET, &["notes", &id])?.send().await?;
        Self::handle_response(response).await
    }

    /// Create a note; the service assigns its id
    pub async fn create_note(&self, note: &Note) -> Result<Note> {
        let response = self
            .request(Method::POST, &["notes"])?
            .json(note)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Replace a note with its full serialized record
    pub async fn update_note(&self, id: &RecordId, note: &Note) -> Result<Note> {
        let id = id.to_string();
        let response = self
            .request(Method::PUT, &["notes", &id])?
            .json(note)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Send a partial record (e.g. `{"status": "active"}`)
    pub async fn patch_note(&self, id: &RecordId, fields: &serde_json::Value) -> Result<Note> {
        let id = id.to_string();
        let response = self
            .request(Method::PUT, &["notes", &id])?
            .json(fields)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Soft delete (moves to trash) or, with `permanent`, remove entirely
    pub async fn delete_note(&self, id: &RecordId, permanent: bool) -> Result<()> {
        let id = id.to_string();
        let mut request = self.request(Method::DELETE, &["notes", &id])?;
        if permanent {
            request = request.query(&[("permanent", "1")]);
        }
        Self::check_status(request.send().await?).await?;
        Ok(())
    }

    // ===== Labels =====

    pub async fn list_labels(&self) -> Result<Vec<Label>> {
        let response = self.request(Method::GET, &["labels"])?.send().await?;
        Self::handle_response(response).await
    }

    pub async fn create_label(&self, input: &LabelInput) -> Result<Label> {
        let response = self
            .request(Method::POST, &["labels"])?
            .json(input)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn update_label(&self, id: &RecordId, input: &LabelInput) -> Result<Label> {
        let id = id.to_string();
        let response = self
            .request(Method::PUT, &["labels", &id])?
            .json(input)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn delete_label(&self, id: &RecordId) -> Result<()> {
        let id = id.to_string();
        let response = self.request(Method::DELETE, &["labels", &id])?.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
