//! Flat-file storage under the data directory.
//!
//! ```text
//! {data_dir}/{deckId}.json                  deck source written by the extractor
//! {data_dir}/output_{deckId}_{type}.json    cached artifact
//! ```

pub mod artifacts;
pub mod slides;

pub use artifacts::{ArtifactStore, FileArtifactStore};
pub use slides::{DeckSource, FileSlideSource, Slide, SlideSource};

use std::io;

/// Deck ids become file names, so only `[A-Za-z0-9_-]` is accepted.
pub(crate) fn checked_id(deck_id: &str) -> io::Result<&str> {
    let valid = !deck_id.is_empty()
        && deck_id.len() <= 64
        && deck_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(deck_id)
    } else {
        Err(io::Error::new(io::ErrorKind::InvalidInput, format!("invalid deck id: {deck_id:?}")))
    }
}
