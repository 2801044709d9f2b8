use chrono::Utc;
use serde_json::Value;

use super::artifact::{ArtifactKind, Flashcard, entries_from_value};
use crate::errors::AppError;
use crate::storage::ArtifactStore;

/// A user edit replacing the payload of an existing artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEdit {
    Summary(String),
    Flashcards(Vec<Flashcard>),
}

impl ContentEdit {
    /// Build an edit from the raw `{type, content}` request fields.
    pub fn from_request(kind: Option<&str>, content: Option<Value>) -> Result<Self, AppError> {
        let kind = match kind {
            Some("summary") => ArtifactKind::Summary,
            Some("flashcards") => ArtifactKind::Flashcards,
            _ => return Err(AppError::InvalidInput("Invalid type".to_string())),
        };
        let content = content.ok_or_else(|| AppError::InvalidInput("Missing content".to_string()))?;

        match (kind, content) {
            (ArtifactKind::Summary, Value::String(summary)) => Ok(ContentEdit::Summary(summary)),
            (ArtifactKind::Summary, _) => {
                Err(AppError::InvalidInput("Summary content must be a string".to_string()))
            }
            (_, content @ Value::Array(_)) => Ok(ContentEdit::Flashcards(entries_from_value(content))),
            (_, _) => Err(AppError::InvalidInput("Flashcards content must be an array".to_string())),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            ContentEdit::Summary(_) => ArtifactKind::Summary,
            ContentEdit::Flashcards(_) => ArtifactKind::Flashcards,
        }
    }
}

/// Overwrite the payload of a cached artifact and stamp `updatedAt`.
/// The artifact has to exist already; edits never create one. Every other
/// field of the stored document is kept as it is.
pub async fn apply_edit(store: &dyn ArtifactStore, deck_id: &str, edit: ContentEdit) -> Result<Value, AppError> {
    let kind = edit.kind();
    let mut artifact = store
        .get(deck_id, kind)
        .await?
        .filter(Value::is_object)
        .ok_or_else(|| AppError::NotFound("Failed to save content. Generate content first.".to_string()))?;

    let (field, payload) = match edit {
        ContentEdit::Summary(summary) => ("summary", Value::String(summary)),
        ContentEdit::Flashcards(flashcards) => ("flashcards", serde_json::to_value(flashcards)?),
    };
    if let Some(fields) = artifact.as_object_mut() {
        fields.insert(field.to_string(), payload);
        fields.insert("updatedAt".to_string(), serde_json::to_value(Utc::now())?);
    }

    store.put(deck_id, kind, &artifact).await?;
    Ok(artifact)
}
