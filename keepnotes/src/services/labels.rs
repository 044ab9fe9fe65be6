//! Labels service
//!
//! Label management plus resolution of whatever label representation an
//! editor holds (bare ids, names, embedded labels) into identifiers.

use crate::api::{Label, LabelInput, LabelRef, NotesClient, RecordId};
use crate::config::MAX_LABEL_NAME_LENGTH;
use crate::error::{AppError, Result};

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Label name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_LABEL_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Label name exceeds {} characters",
            MAX_LABEL_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

/// Map label references onto ids of known labels.
///
/// A reference matches a known label by id, or (for string references)
/// by case-insensitive name. References to unknown labels are dropped;
/// duplicates collapse to the first occurrence.
pub fn resolve_label_ids(refs: &[LabelRef], known: &[Label]) -> Vec<RecordId> {
    let mut ids: Vec<RecordId> = Vec::new();

    for label_ref in refs {
        let found = known.iter().find(|label| &label.id == label_ref.id()).or_else(|| {
            match label_ref {
                LabelRef::Id(RecordId::Text(name)) => known
                    .iter()
                    .find(|label| label.name.eq_ignore_ascii_case(name.trim())),
                _ => None,
            }
        });

        match found {
            Some(label) if !ids.contains(&label.id) => ids.push(label.id.clone()),
            Some(_) => {}
            None => tracing::debug!("Dropping unknown label reference {}", label_ref.id()),
        }
    }

    ids
}

/// Service for managing labels
#[derive(Clone)]
pub struct LabelsService {
    client: NotesClient,
}

impl LabelsService {
    pub fn new(client: NotesClient) -> Self {
        Self { client }
    }

    pub async fn list_labels(&self) -> Result<Vec<Label>> {
        self.client.list_labels().await
    }

    /// Create a label; names are unique case-insensitively
    pub async fn create_label(&self, name: &str, color: Option<String>) -> Result<Label> {
        let name = validate_name(name)?;

        let existing = self.list_labels().await?;
        if existing.iter().any(|l| l.name.eq_ignore_ascii_case(&name)) {
            return Err(AppError::Validation(format!("Label already exists: {}", name)));
        }

        tracing::info!("Creating label: {}", name);
        self.client.create_label(&LabelInput { name, color }).await
    }

    pub async fn rename_label(
        &self,
        id: &RecordId,
        name: &str,
        color: Option<String>,
    ) -> Result<Label> {
        let name = validate_name(name)?;
        tracing::info!("Updating label {}: {}", id, name);
        self.client.update_label(id, &LabelInput { name, color }).await
    }

    pub async fn delete_label(&self, id: &RecordId) -> Result<()> {
        tracing::info!("Deleting label: {}", id);
        self.client.delete_label(id).await
    }

    /// Resolve label references against the labels currently on the service
    pub async fn resolve(&self, refs: &[LabelRef]) -> Result<Vec<LabelRef>> {
        let known = self.list_labels().await?;
        Ok(resolve_label_ids(refs, &known)
            .into_iter()
            .map(LabelRef::Id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(id: i64, name: &str) -> Label {
        Label {
            id: RecordId::Int(id),
            name: name.to_string(),
            color: None,
        }
    }

    #[test]
    fn test_resolve_by_id_name_and_embedded() {
        let known = vec![label(1, "Work"), label(2, "Home")];
        let refs = vec![
            LabelRef::Id(RecordId::Int(2)),
            LabelRef::Id(RecordId::from("work")),
            LabelRef::Embedded(label(2, "Home")),
            LabelRef::Id(RecordId::Int(99)),
        ];

        assert_eq!(
            resolve_label_ids(&refs, &known),
            vec![RecordId::Int(2), RecordId::Int(1)]
        );
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_LABEL_NAME_LENGTH + 1)).is_err());
        assert_eq!(validate_name("  Travel ").unwrap(), "Travel");
    }
}
