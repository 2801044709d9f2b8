use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use super::{ShareQuery, requester};
use crate::auth::session::require_user;
use crate::auth::validate;
use crate::errors::AppError;
use crate::generation::ContentGenerator;
use crate::models::deck::{self, FileType, NewDeck};
use crate::models::team;
use crate::storage::{FileSlideSource, SlideSource};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeckRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub team_id: Option<i64>,
}

/// GET /api/decks - Personal decks and decks of the user's teams.
pub async fn list(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let decks = deck::list_for_user(&pool, user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "decks": decks })))
}

/// POST /api/decks - Create an empty manual deck.
pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<CreateDeckRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;

    if let Some(msg) = validate::validate_required(&body.title, "Title is required", 200) {
        return Err(AppError::InvalidInput(msg));
    }
    if let Some(team_id) = body.team_id {
        if !team::is_member(&pool, team_id, user_id).await? {
            return Err(AppError::AccessDenied);
        }
    }

    let new_deck = NewDeck {
        user_id,
        team_id: body.team_id,
        title: body.title.trim().to_string(),
        description: body.description.clone(),
        original_file_name: None,
        file_type: FileType::Manual,
    };
    let id = deck::create(&pool, &new_deck).await?;
    log::info!("User {user_id} created deck {id}");

    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

/// GET /api/decks/{id} - Deck record with its extracted slides.
/// Readable by owner, team members and share-link holders (`?share=`).
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    generator: web::Data<ContentGenerator>,
    slides: web::Data<FileSlideSource>,
    path: web::Path<String>,
    query: web::Query<ShareQuery>,
) -> Result<HttpResponse, AppError> {
    let deck_id = path.into_inner();
    let requester = requester(&session, query.into_inner().share);

    if !generator.access().can_view(&deck_id, &requester).await? {
        return Err(AppError::AccessDenied);
    }

    let found = deck::find_by_id(&pool, &deck_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deck not found".to_string()))?;
    let source = slides.load(&deck_id).await?.unwrap_or_default();

    Ok(HttpResponse::Ok().json(json!({ "deck": found, "slides": source.slides })))
}

/// DELETE /api/decks/{id} - Owner only. Removes the record, its share links
/// and the deck source file.
pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    slides: web::Data<FileSlideSource>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let deck_id = path.into_inner();

    deck::find_owned(&pool, &deck_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deck not found".to_string()))?;

    deck::delete(&pool, &deck_id).await?;
    if let Err(e) = slides.remove(&deck_id).await {
        log::warn!("Deck {deck_id} deleted but its source file was not removed: {e}");
    }
    log::info!("User {user_id} deleted deck {deck_id}");

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
