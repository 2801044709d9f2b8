use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::checked_id;
use crate::errors::AppError;
use crate::generation::artifact::entries_from_value;

/// One extracted slide. Empty strings from the extractor count as absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Slide {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Slide {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref().filter(|n| !n.is_empty())
    }

    pub fn bullets(&self) -> &[String] {
        self.bullets.as_deref().unwrap_or_default()
    }
}

/// Deck source file: `{"slides": [...]}`. A missing or non-array `slides`
/// reads as an empty deck.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeckSource {
    #[serde(default, deserialize_with = "slide_list")]
    pub slides: Vec<Slide>,
}

fn slide_list<'de, D>(deserializer: D) -> Result<Vec<Slide>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(entries_from_value(Value::deserialize(deserializer)?))
}

/// Read access to extracted decks.
#[async_trait]
pub trait SlideSource: Send + Sync {
    /// `Ok(None)` when no source file exists for the deck.
    async fn load(&self, deck_id: &str) -> Result<Option<DeckSource>, AppError>;
}

#[derive(Debug, Clone)]
pub struct FileSlideSource {
    dir: PathBuf,
}

impl FileSlideSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, deck_id: &str) -> io::Result<PathBuf> {
        Ok(self.dir.join(format!("{}.json", checked_id(deck_id)?)))
    }

    /// Write a deck source file in the extractor's `{slides: [...]}` layout.
    #[cfg(test)]
    pub async fn save(&self, deck_id: &str, source: &DeckSource) -> Result<(), AppError> {
        let path = self.path_for(deck_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, serde_json::to_vec_pretty(source)?).await?;
        Ok(())
    }

    /// Copy a deck's source file under a new id (saving a shared deck).
    /// Returns `false` when the original has no source file.
    pub async fn copy(&self, from_id: &str, to_id: &str) -> Result<bool, AppError> {
        let from = self.path_for(from_id)?;
        let to = self.path_for(to_id)?;
        match tokio::fs::copy(&from, &to).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a deck's source file. A file that is already gone is not an error.
    pub async fn remove(&self, deck_id: &str) -> Result<(), AppError> {
        let path = self.path_for(deck_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SlideSource for FileSlideSource {
    async fn load(&self, deck_id: &str) -> Result<Option<DeckSource>, AppError> {
        let path = self.path_for(deck_id)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extractor_output() {
        let source: DeckSource = serde_json::from_str(
            r#"{"slides":[{"index":1,"title":"Intro","bullets":["A","B"],"notes":""},{"index":2,"title":""}]}"#,
        )
        .unwrap();
        assert_eq!(source.slides.len(), 2);
        assert_eq!(source.slides[0].title(), Some("Intro"));
        assert_eq!(source.slides[0].bullets(), ["A".to_string(), "B".to_string()]);
        assert_eq!(source.slides[0].notes(), None);
        assert_eq!(source.slides[1].title(), None);
        assert!(source.slides[1].bullets().is_empty());
    }

    #[test]
    fn non_array_slides_is_empty_deck() {
        let source: DeckSource = serde_json::from_str(r#"{"slides":"nope"}"#).unwrap();
        assert!(source.slides.is_empty());
        let source: DeckSource = serde_json::from_str("{}").unwrap();
        assert!(source.slides.is_empty());
    }

    #[tokio::test]
    async fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let slides = FileSlideSource::new(dir.path());
        assert!(slides.load("missing-deck").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn copy_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let slides = FileSlideSource::new(dir.path());
        let source = DeckSource {
            slides: vec![Slide { index: 1, title: Some("T".into()), ..Default::default() }],
        };
        slides.save("orig", &source).await.unwrap();
        assert!(slides.copy("orig", "copy").await.unwrap());
        assert!(!slides.copy("missing", "copy2").await.unwrap());
        assert_eq!(slides.load("copy").await.unwrap(), Some(source));

        slides.remove("copy").await.unwrap();
        slides.remove("copy").await.unwrap();
        assert!(slides.load("copy").await.unwrap().is_none());
    }
}
