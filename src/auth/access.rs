//! Deck-scoped access checks.
//!
//! ```text
//! view/generate:  owner | member of deck.team_id | holder of the deck's active share code
//! edit content:   owner | member of deck.team_id
//! manage deck:    owner only (delete, share links)
//! ```
//!
//! A deck that does not exist is reported the same way as a deck the caller
//! may not see.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::generation::{DeckAccess, Requester};
use crate::models::{deck, share, team};

/// Resolves deck permissions against Postgres.
#[derive(Clone)]
pub struct PgDeckAccess {
    pool: PgPool,
}

impl PgDeckAccess {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn is_owner_or_member(pool: &PgPool, d: &deck::Deck, user_id: i64) -> Result<bool, AppError> {
    if d.user_id == user_id {
        return Ok(true);
    }
    match d.team_id {
        Some(team_id) => team::is_member(pool, team_id, user_id).await,
        None => Ok(false),
    }
}

#[async_trait]
impl DeckAccess for PgDeckAccess {
    async fn can_view(&self, deck_id: &str, requester: &Requester) -> Result<bool, AppError> {
        let Some(d) = deck::find_by_id(&self.pool, deck_id).await? else {
            return Ok(false);
        };

        if let Some(user_id) = requester.user_id {
            if is_owner_or_member(&self.pool, &d, user_id).await? {
                return Ok(true);
            }
        }

        match &requester.share_code {
            Some(code) => Ok(share::find_active_by_code(&self.pool, code)
                .await?
                .is_some_and(|s| s.deck_id == d.id)),
            None => Ok(false),
        }
    }

    async fn can_edit(&self, deck_id: &str, user_id: i64) -> Result<bool, AppError> {
        match deck::find_by_id(&self.pool, deck_id).await? {
            Some(d) => is_owner_or_member(&self.pool, &d, user_id).await,
            None => Ok(false),
        }
    }
}
