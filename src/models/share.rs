use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::random_code;

pub const SHARE_CODE_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeckShare {
    pub id: i64,
    pub deck_id: String,
    pub share_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Active and not past its optional expiry.
const ACTIVE: &str = "is_active AND (expires_at IS NULL OR expires_at > NOW())";

const SELECT_SHARE: &str =
    "SELECT id, deck_id, share_code, is_active, created_at, expires_at FROM deck_shares";

pub async fn find_active_for_deck(pool: &PgPool, deck_id: &str) -> Result<Option<DeckShare>, AppError> {
    let share = sqlx::query_as::<_, DeckShare>(&format!(
        "{SELECT_SHARE} WHERE deck_id = $1 AND {ACTIVE} ORDER BY created_at LIMIT 1"
    ))
    .bind(deck_id)
    .fetch_optional(pool)
    .await?;
    Ok(share)
}

pub async fn find_active_by_code(pool: &PgPool, code: &str) -> Result<Option<DeckShare>, AppError> {
    let share = sqlx::query_as::<_, DeckShare>(&format!(
        "{SELECT_SHARE} WHERE share_code = $1 AND {ACTIVE}"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(share)
}

/// Reuse the deck's active link, or create one. Keeps at most one active
/// link per deck under sequential use; concurrent callers may both insert.
pub async fn get_or_create_active(pool: &PgPool, deck_id: &str) -> Result<DeckShare, AppError> {
    if let Some(existing) = find_active_for_deck(pool, deck_id).await? {
        return Ok(existing);
    }

    let share = sqlx::query_as::<_, DeckShare>(
        "INSERT INTO deck_shares (deck_id, share_code) VALUES ($1, $2) \
         RETURNING id, deck_id, share_code, is_active, created_at, expires_at",
    )
    .bind(deck_id)
    .bind(random_code(SHARE_CODE_LEN))
    .fetch_one(pool)
    .await?;
    log::info!("Created share link for deck {deck_id}");
    Ok(share)
}

/// Deactivate every link of the deck. Returns how many were active.
pub async fn deactivate_all(pool: &PgPool, deck_id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("UPDATE deck_shares SET is_active = FALSE WHERE deck_id = $1 AND is_active")
        .bind(deck_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
