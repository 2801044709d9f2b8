//! Study artifacts produced from a deck and persisted in the artifact cache.
//!
//! Model output is only checked for its top-level shape. Entries that cannot
//! be read as a flashcard or exam question are dropped instead of failing the
//! whole artifact, and loosely typed fields (numeric ids, string slide refs)
//! are coerced.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The three kinds of artifact a deck can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Summary,
    Flashcards,
    Exam,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Summary, ArtifactKind::Flashcards, ArtifactKind::Exam];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Summary => "summary",
            ArtifactKind::Flashcards => "flashcards",
            ArtifactKind::Exam => "exam",
        }
    }

    /// Whether the model is asked for a JSON object rather than free text.
    pub fn wants_json(&self) -> bool {
        !matches!(self, ArtifactKind::Summary)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(ArtifactKind::Summary),
            "flashcards" => Ok(ArtifactKind::Flashcards),
            "exam" => Ok(ArtifactKind::Exam),
            other => Err(format!("Unsupported type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl From<Value> for Difficulty {
    fn from(value: Value) -> Self {
        match value.as_str().unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Flashcard {
    #[serde(deserialize_with = "lenient_string")]
    pub q: String,
    #[serde(deserialize_with = "lenient_string")]
    pub a: String,
    #[serde(deserialize_with = "lenient_refs")]
    pub refs: Vec<u32>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum QuestionKind {
    Mcq,
    #[default]
    Short,
}

impl From<Value> for QuestionKind {
    fn from(value: Value) -> Self {
        match value.as_str().unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "mcq" | "multiple-choice" | "multiple_choice" => QuestionKind::Mcq,
            _ => QuestionKind::Short,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamQuestion {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_string")]
    pub answer: String,
    #[serde(deserialize_with = "lenient_string")]
    pub explanation: String,
    #[serde(deserialize_with = "lenient_refs")]
    pub refs: Vec<u32>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Exam {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub instructions: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub questions: Vec<ExamQuestion>,
}

/// Type-specific payload. Serialized inline next to the envelope fields,
/// with `type` as the tag: `{"type":"summary","summary":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactBody {
    Summary {
        #[serde(default)]
        summary: String,
    },
    Flashcards {
        #[serde(default, deserialize_with = "lenient_vec")]
        flashcards: Vec<Flashcard>,
    },
    Exam {
        #[serde(default)]
        exam: Option<Exam>,
    },
}

impl ArtifactBody {
    /// Payload returned for a kind that has not been generated yet.
    pub fn empty(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Summary => ArtifactBody::Summary { summary: String::new() },
            ArtifactKind::Flashcards => ArtifactBody::Flashcards { flashcards: Vec::new() },
            ArtifactKind::Exam => ArtifactBody::Exam { exam: None },
        }
    }
}

/// A newly generated artifact: `{deckId, type, <payload>, createdAt, model}`.
/// Stored documents are read back as plain JSON, not through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub deck_id: String,
    #[serde(flatten)]
    pub body: ArtifactBody,
    pub created_at: DateTime<Utc>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Artifact {
    pub fn new(deck_id: &str, body: ArtifactBody, model: &str) -> Self {
        Self {
            deck_id: deck_id.to_string(),
            body,
            created_at: Utc::now(),
            model: model.to_string(),
            updated_at: None,
        }
    }
}

/// Placeholder returned by the read endpoint before anything was generated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyArtifact {
    pub deck_id: String,
    #[serde(flatten)]
    pub body: ArtifactBody,
}

/// Keep the array entries that parse as `T`; anything that is not an array
/// yields an empty list.
pub fn entries_from_value<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if parsed.len() < total {
        log::warn!("Dropped {} malformed entries out of {}", total - parsed.len(), total);
    }
    parsed
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(entries_from_value(value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Slide references: numbers or numeric strings. Anything else is skipped.
fn lenient_refs<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect())
}
