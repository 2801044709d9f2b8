//! Content generation: deck slides in, study artifact out.
//!
//! ```text
//! access check -> cache lookup -> load slides -> prompt -> model -> parse -> persist
//! ```
//!
//! The artifact cache is authoritative: once an artifact exists for a
//! (deck, kind) pair the model is never called for it again. Concurrent first
//! requests for the same pair are serialized by an in-process lock, so only
//! one of them reaches the model. There is no lock across processes.

pub mod artifact;
pub mod edit;
pub mod extract;
pub mod prompt;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::errors::AppError;
use crate::llm::LanguageModel;
use crate::storage::{ArtifactStore, SlideSource};

pub use artifact::{Artifact, ArtifactBody, ArtifactKind, Difficulty, Exam, ExamQuestion, Flashcard, QuestionKind};
pub use edit::ContentEdit;
pub use extract::extract_json_object;

/// Who is asking: a logged-in user, a share-link holder, both or neither.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requester {
    pub user_id: Option<i64>,
    pub share_code: Option<String>,
}

/// Deck permission lookups the generator depends on.
#[async_trait]
pub trait DeckAccess: Send + Sync {
    /// Owner, team member, or holder of the deck's active share code.
    /// `Ok(false)` for decks that do not exist.
    async fn can_view(&self, deck_id: &str, requester: &Requester) -> Result<bool, AppError>;

    /// Owner or team member. Share links never grant edit rights.
    async fn can_edit(&self, deck_id: &str, user_id: i64) -> Result<bool, AppError>;
}

type LockKey = (String, ArtifactKind);

/// A lock plus the number of callers holding or waiting on it.
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

/// Per-(deck, kind) async locks. Entries are dropped once nobody holds or
/// waits on them, including when a holder or waiter is cancelled.
#[derive(Default)]
struct KeyLocks {
    slots: Mutex<HashMap<LockKey, Slot>>,
}

/// One caller's claim on a slot. Dropping it releases the claim and removes
/// the slot when it was the last one.
struct SlotClaim<'a> {
    locks: &'a KeyLocks,
    key: LockKey,
}

impl Drop for SlotClaim<'_> {
    fn drop(&mut self) {
        let mut slots = self.locks.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Held lock for one key. The mutex guard is released before the claim
/// (fields drop in declaration order).
struct KeyGuard<'a> {
    _guard: OwnedMutexGuard<()>,
    _claim: SlotClaim<'a>,
}

impl KeyLocks {
    async fn acquire(&self, key: LockKey) -> KeyGuard<'_> {
        let lock = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot { lock: Arc::default(), users: 0 });
            slot.users += 1;
            Arc::clone(&slot.lock)
        };
        let claim = SlotClaim { locks: self, key };
        let guard = lock.lock_owned().await;
        KeyGuard { _guard: guard, _claim: claim }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

pub struct ContentGenerator {
    access: Arc<dyn DeckAccess>,
    slides: Arc<dyn SlideSource>,
    artifacts: Arc<dyn ArtifactStore>,
    /// `None` when no API key is configured.
    model: Option<Arc<dyn LanguageModel>>,
    locks: KeyLocks,
}

impl ContentGenerator {
    pub fn new(
        access: Arc<dyn DeckAccess>,
        slides: Arc<dyn SlideSource>,
        artifacts: Arc<dyn ArtifactStore>,
        model: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        Self { access, slides, artifacts, model, locks: KeyLocks::default() }
    }

    /// Fails with `MissingApiKey` when no model is configured.
    pub fn ensure_model(&self) -> Result<(), AppError> {
        self.model.as_ref().map(|_| ()).ok_or(AppError::MissingApiKey)
    }

    pub fn access(&self) -> &dyn DeckAccess {
        self.access.as_ref()
    }

    pub fn artifacts(&self) -> &dyn ArtifactStore {
        self.artifacts.as_ref()
    }

    /// Return the cached artifact for (deck, kind), generating and caching it
    /// on the first request. A cached document is returned as stored.
    pub async fn generate(
        &self,
        deck_id: &str,
        kind: ArtifactKind,
        requester: &Requester,
    ) -> Result<Value, AppError> {
        let model = self.model.as_ref().ok_or(AppError::MissingApiKey)?;

        if !self.access.can_view(deck_id, requester).await? {
            return Err(AppError::AccessDenied);
        }

        let _guard = self.locks.acquire((deck_id.to_string(), kind)).await;
        self.generate_locked(deck_id, kind, model.as_ref()).await
    }

    async fn generate_locked(
        &self,
        deck_id: &str,
        kind: ArtifactKind,
        model: &dyn LanguageModel,
    ) -> Result<Value, AppError> {
        if let Some(cached) = self.artifacts.get(deck_id, kind).await? {
            log::info!("Cache hit for {kind} of deck {deck_id}");
            return Ok(cached);
        }
        log::info!("Cache miss for {kind} of deck {deck_id}, calling {}", model.model_name());

        let source = self
            .slides
            .load(deck_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Deck not found".to_string()))?;

        let request = prompt::build_request(kind, &source.slides);
        let content = model.complete(&request).await?;

        let body = parse_response(kind, content)?;
        let artifact = serde_json::to_value(Artifact::new(deck_id, body, model.model_name()))?;
        self.artifacts.put(deck_id, kind, &artifact).await?;
        Ok(artifact)
    }
}

/// Turn raw model text into an artifact payload. Only the top-level shape is
/// checked: a missing `flashcards` array is empty, a missing `exam` is null.
pub fn parse_response(kind: ArtifactKind, content: String) -> Result<ArtifactBody, AppError> {
    if kind == ArtifactKind::Summary {
        return Ok(ArtifactBody::Summary { summary: content });
    }

    let mut parsed = extract_json_object(&content).map_err(AppError::MalformedModelOutput)?;
    let body = match kind {
        ArtifactKind::Flashcards => ArtifactBody::Flashcards {
            flashcards: artifact::entries_from_value(parsed.get_mut("flashcards").map(Value::take).unwrap_or_default()),
        },
        _ => {
            let exam = match parsed.get_mut("exam").map(Value::take) {
                None | Some(Value::Null) => None,
                Some(value) => serde_json::from_value(value)
                    .map_err(|e| log::warn!("Ignoring unreadable exam object: {e}"))
                    .ok(),
            };
            ArtifactBody::Exam { exam }
        }
    };
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn summary_is_raw_text() {
        let body = parse_response(ArtifactKind::Summary, "# Overview\n(Slide 1)".into()).unwrap();
        assert_eq!(body, ArtifactBody::Summary { summary: "# Overview\n(Slide 1)".into() });
    }

    #[test]
    fn flashcards_missing_or_wrong_shape_is_empty() {
        let body = parse_response(ArtifactKind::Flashcards, r#"{"cards": []}"#.into()).unwrap();
        assert_eq!(body, ArtifactBody::Flashcards { flashcards: vec![] });

        let body = parse_response(ArtifactKind::Flashcards, r#"{"flashcards": "none"}"#.into()).unwrap();
        assert_eq!(body, ArtifactBody::Flashcards { flashcards: vec![] });
    }

    #[test]
    fn flashcards_recovered_from_prose() {
        let text = "Sure!\n{\"flashcards\":[{\"q\":\"Q\",\"a\":\"A\",\"refs\":[1],\"difficulty\":\"easy\"}]}\nDone.";
        let ArtifactBody::Flashcards { flashcards } = parse_response(ArtifactKind::Flashcards, text.into()).unwrap()
        else {
            panic!("expected flashcards");
        };
        assert_eq!(flashcards.len(), 1);
        assert_eq!(flashcards[0].q, "Q");
        assert_eq!(flashcards[0].refs, vec![1]);
        assert_eq!(flashcards[0].difficulty, Difficulty::Easy);
    }

    #[test]
    fn exam_missing_is_null() {
        let body = parse_response(ArtifactKind::Exam, "{}".into()).unwrap();
        assert_eq!(body, ArtifactBody::Exam { exam: None });
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_response(ArtifactKind::Exam, r#"{"exam": {"title": "x""#.into()).unwrap_err();
        assert!(matches!(err, AppError::MalformedModelOutput(_)));
    }

    fn key() -> LockKey {
        ("deck".to_string(), ArtifactKind::Summary)
    }

    #[tokio::test]
    async fn lock_slot_is_removed_after_release() {
        let locks = KeyLocks::default();
        let guard = locks.acquire(key()).await;
        assert_eq!(locks.len(), 1);
        drop(guard);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn cancelled_waiter_leaves_no_slot() {
        let locks = KeyLocks::default();
        let guard = locks.acquire(key()).await;

        let waited = tokio::time::timeout(Duration::from_millis(20), locks.acquire(key())).await;
        assert!(waited.is_err());
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn cancelled_holder_releases_lock_and_slot() {
        let locks = KeyLocks::default();
        let held = async {
            let _guard = locks.acquire(key()).await;
            std::future::pending::<()>().await;
        };
        assert!(tokio::time::timeout(Duration::from_millis(20), held).await.is_err());
        assert_eq!(locks.len(), 0);

        // The key is usable again right away.
        let again = tokio::time::timeout(Duration::from_millis(20), locks.acquire(key())).await;
        assert!(again.is_ok());
    }
}
