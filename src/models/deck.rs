use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::errors::AppError;

/// Where a deck's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Manual,
    Pdf,
    Pptx,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Manual => "manual",
            FileType::Pdf => "pdf",
            FileType::Pptx => "pptx",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(FileType::Manual),
            "pdf" => Ok(FileType::Pdf),
            "pptx" => Ok(FileType::Pptx),
            other => Err(format!("unknown file type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub user_id: i64,
    pub team_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub original_file_name: Option<String>,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn source_type(&self) -> Option<FileType> {
        self.file_type.parse().ok()
    }
}

pub struct NewDeck {
    pub user_id: i64,
    pub team_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub original_file_name: Option<String>,
    pub file_type: FileType,
}

const SELECT_DECK: &str = "SELECT id, user_id, team_id, title, description, original_file_name, \
                           file_type, created_at, updated_at FROM decks";

pub fn new_deck_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Insert a deck under a fresh id and return that id.
pub async fn create(pool: &PgPool, deck: &NewDeck) -> Result<String, AppError> {
    let id = new_deck_id();
    insert(pool, &id, deck).await?;
    Ok(id)
}

/// Insert a deck under a caller-chosen id.
pub async fn insert(pool: &PgPool, id: &str, deck: &NewDeck) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO decks (id, user_id, team_id, title, description, original_file_name, file_type) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(id)
    .bind(deck.user_id)
    .bind(deck.team_id)
    .bind(&deck.title)
    .bind(&deck.description)
    .bind(&deck.original_file_name)
    .bind(deck.file_type.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Deck>, AppError> {
    let deck = sqlx::query_as::<_, Deck>(&format!("{SELECT_DECK} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(deck)
}

/// The deck, only if `user_id` owns it.
pub async fn find_owned(pool: &PgPool, id: &str, user_id: i64) -> Result<Option<Deck>, AppError> {
    let deck = sqlx::query_as::<_, Deck>(&format!("{SELECT_DECK} WHERE id = $1 AND user_id = $2"))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(deck)
}

/// Personal decks plus decks of every team the user belongs to, newest first.
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Deck>, AppError> {
    let decks = sqlx::query_as::<_, Deck>(&format!(
        "{SELECT_DECK} WHERE user_id = $1 \
            OR team_id IN (SELECT team_id FROM team_members WHERE user_id = $1) \
         ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(decks)
}

/// Delete a deck; share links go with it via `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM decks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
