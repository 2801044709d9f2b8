use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use super::checked_id;
use crate::errors::AppError;
use crate::generation::artifact::ArtifactKind;

/// Keyed store for generated artifacts, one entry per (deck id, kind).
///
/// Entries are plain JSON documents. A hit is handed back exactly as it was
/// stored so fields this crate does not model survive reads and edits.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get(&self, deck_id: &str, kind: ArtifactKind) -> Result<Option<Value>, AppError>;

    /// Store an artifact document under (deck id, kind), replacing any entry.
    async fn put(&self, deck_id: &str, kind: ArtifactKind, artifact: &Value) -> Result<(), AppError>;
}

/// Artifact cache kept as pretty-printed JSON files in the data directory.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, deck_id: &str, kind: ArtifactKind) -> io::Result<PathBuf> {
        Ok(self.dir.join(format!("output_{}_{}.json", checked_id(deck_id)?, kind)))
    }
}

/// The `type` a stored document declares, if it declares one.
fn declared_kind(artifact: &Value) -> Option<&str> {
    artifact.get("type").and_then(Value::as_str)
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn get(&self, deck_id: &str, kind: ArtifactKind) -> Result<Option<Value>, AppError> {
        let path = self.path_for(deck_id, kind)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let artifact: Value = match serde_json::from_str(&raw) {
            Ok(artifact) => artifact,
            Err(e) => {
                log::warn!("Unreadable cache file {}: {e}, treating as miss", path.display());
                return Ok(None);
            }
        };
        match declared_kind(&artifact) {
            Some(other) if other != kind.as_str() => {
                log::warn!("Cache file {} holds a {other} artifact, treating as miss", path.display());
                Ok(None)
            }
            _ => Ok(Some(artifact)),
        }
    }

    async fn put(&self, deck_id: &str, kind: ArtifactKind, artifact: &Value) -> Result<(), AppError> {
        let path = self.path_for(deck_id, kind)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, serde_json::to_vec_pretty(artifact)?).await?;
        log::info!("Wrote {kind} artifact for deck {deck_id}");
        Ok(())
    }
}
