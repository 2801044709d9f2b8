//! Shared test doubles for generation and handler tests.
//!
//! - `FakeAccess`: fixed view/edit answers
//! - `CountingSlides`: in-memory decks that count loads
//! - `FakeModel`: canned replies that count calls and keep the last request
//! - `setup_generator()`: real file-backed artifact store in a temp dir

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use deckstudy::errors::AppError;
use deckstudy::generation::{ContentGenerator, DeckAccess, Requester};
use deckstudy::llm::{CompletionRequest, LanguageModel};
use deckstudy::storage::{DeckSource, FileArtifactStore, Slide, SlideSource};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const DECK_ID: &str = "deck-1";
pub const MODEL_NAME: &str = "gpt-4o-mini";

// ============================================================================
// FAKES
// ============================================================================

pub struct FakeAccess {
    pub view: bool,
    pub edit: bool,
}

impl FakeAccess {
    pub fn allow_all() -> Arc<Self> {
        Arc::new(Self { view: true, edit: true })
    }

    pub fn deny_all() -> Arc<Self> {
        Arc::new(Self { view: false, edit: false })
    }
}

#[async_trait]
impl DeckAccess for FakeAccess {
    async fn can_view(&self, _deck_id: &str, _requester: &Requester) -> Result<bool, AppError> {
        Ok(self.view)
    }

    async fn can_edit(&self, _deck_id: &str, _user_id: i64) -> Result<bool, AppError> {
        Ok(self.edit)
    }
}

#[derive(Default)]
pub struct CountingSlides {
    decks: HashMap<String, DeckSource>,
    loads: AtomicUsize,
}

impl CountingSlides {
    pub fn with_deck(deck_id: &str, slides: Vec<Slide>) -> Arc<Self> {
        let mut decks = HashMap::new();
        decks.insert(deck_id.to_string(), DeckSource { slides });
        Arc::new(Self { decks, loads: AtomicUsize::new(0) })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlideSource for CountingSlides {
    async fn load(&self, deck_id: &str) -> Result<Option<DeckSource>, AppError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.decks.get(deck_id).cloned())
    }
}

pub struct FakeModel {
    reply: String,
    delay: Duration,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Self::slow(reply, Duration::ZERO)
    }

    /// Sleeps before answering so concurrent callers overlap.
    pub fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            delay,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.clone())
    }
}

// ============================================================================
// SETUP
// ============================================================================

pub fn slide(index: u32, title: &str, bullets: &[&str]) -> Slide {
    Slide {
        index,
        title: Some(title.to_string()),
        bullets: Some(bullets.iter().map(|b| b.to_string()).collect()),
        notes: None,
    }
}

pub fn sample_slides() -> Vec<Slide> {
    vec![
        slide(1, "Intro", &["a", "b"]),
        slide(2, "Cells", &["Mitochondria produce ATP"]),
    ]
}

/// Generator over a temp-dir artifact store. Keep the `TempDir` alive for
/// the duration of the test.
pub fn setup_generator(
    access: Arc<dyn DeckAccess>,
    slides: Arc<dyn SlideSource>,
    model: Option<Arc<dyn LanguageModel>>,
) -> (TempDir, FileArtifactStore, ContentGenerator) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileArtifactStore::new(dir.path());
    let generator = ContentGenerator::new(access, slides, Arc::new(store.clone()), model);
    (dir, store, generator)
}
