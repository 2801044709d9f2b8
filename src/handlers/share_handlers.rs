use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::session::require_user;
use crate::errors::AppError;
use crate::models::deck::{self, FileType, NewDeck};
use crate::models::share;
use crate::storage::{FileSlideSource, SlideSource};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSharedRequest {
    pub share_code: Option<String>,
}

async fn require_owned(pool: &PgPool, deck_id: &str, user_id: i64) -> Result<deck::Deck, AppError> {
    deck::find_owned(pool, deck_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deck not found".to_string()))
}

/// POST /api/decks/{id}/share - Return the deck's active share code,
/// creating one if there is none. Owner only.
pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let deck_id = path.into_inner();
    require_owned(&pool, &deck_id, user_id).await?;

    let link = share::get_or_create_active(&pool, &deck_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "shareCode": link.share_code })))
}

/// GET /api/decks/{id}/share - The active share link, or null.
pub async fn get(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let deck_id = path.into_inner();
    require_owned(&pool, &deck_id, user_id).await?;

    let link = share::find_active_for_deck(&pool, &deck_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "share": link })))
}

/// DELETE /api/decks/{id}/share - Deactivate all of the deck's links.
pub async fn deactivate(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let deck_id = path.into_inner();
    require_owned(&pool, &deck_id, user_id).await?;

    let count = share::deactivate_all(&pool, &deck_id).await?;
    log::info!("Deactivated {count} share link(s) for deck {deck_id}");
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// GET /api/share/{code} - Public view of a shared deck.
pub async fn view_shared(
    pool: web::Data<PgPool>,
    slides: web::Data<FileSlideSource>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let code = path.into_inner();
    let link = share::find_active_by_code(&pool, &code)
        .await?
        .ok_or_else(|| AppError::NotFound("Share link not found or inactive".to_string()))?;
    let shared = deck::find_by_id(&pool, &link.deck_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deck not found".to_string()))?;
    let source = slides.load(&shared.id).await?.unwrap_or_default();

    Ok(HttpResponse::Ok().json(json!({
        "deck": {
            "id": shared.id,
            "title": shared.title,
            "description": shared.description,
            "fileType": shared.file_type,
        },
        "shareCode": link.share_code,
        "slides": source.slides,
    })))
}

/// POST /api/decks/save-shared - Copy a shared deck into the caller's account.
pub async fn save_shared(
    pool: web::Data<PgPool>,
    session: Session,
    slides: web::Data<FileSlideSource>,
    body: web::Json<SaveSharedRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let code = body
        .into_inner()
        .share_code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Share code required".to_string()))?;

    let link = share::find_active_by_code(&pool, &code)
        .await?
        .ok_or_else(|| AppError::NotFound("Share link not found or inactive".to_string()))?;
    let original = deck::find_by_id(&pool, &link.deck_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Original deck not found".to_string()))?;

    let new_id = deck::new_deck_id();
    if !slides.copy(&original.id, &new_id).await? {
        log::warn!("Shared deck {} has no source file, saving an empty copy", original.id);
    }

    let copy = NewDeck {
        user_id,
        team_id: None,
        title: original.title.clone(),
        description: original.description.clone(),
        original_file_name: original.original_file_name.clone(),
        file_type: original.source_type().unwrap_or(FileType::Manual),
    };
    if let Err(e) = deck::insert(&pool, &new_id, &copy).await {
        let _ = slides.remove(&new_id).await;
        return Err(e);
    }
    log::info!("User {user_id} saved shared deck {} as {new_id}", original.id);

    Ok(HttpResponse::Ok().json(json!({ "deckId": new_id })))
}
