use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ShareQuery, requester};
use crate::auth::session::require_user;
use crate::errors::AppError;
use crate::generation::artifact::EmptyArtifact;
use crate::generation::edit::{self, ContentEdit};
use crate::generation::{ArtifactBody, ArtifactKind, ContentGenerator};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub deck_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub share_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentUpdateRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<Value>,
}

/// POST /api/generate - Return the cached artifact or generate it.
/// Body: `{deckId, type?, shareCode?}`; `type` defaults to "summary".
/// The model configuration is checked before the body is parsed.
pub async fn generate(
    session: Session,
    generator: web::Data<ContentGenerator>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    generator.ensure_model()?;

    let body: GenerateRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {e}")))?;
    let deck_id = body
        .deck_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing deckId".to_string()))?;
    let kind: ArtifactKind = body
        .kind
        .as_deref()
        .unwrap_or("summary")
        .parse()
        .map_err(|_| AppError::InvalidInput("Unsupported type".to_string()))?;

    let requester = requester(&session, body.share_code);
    let artifact = generator.generate(&deck_id, kind, &requester).await?;
    Ok(HttpResponse::Ok().json(artifact))
}

/// GET /api/decks/{id}/content/{type} - Cached artifact, or its empty shape
/// when nothing was generated yet.
pub async fn read(
    session: Session,
    generator: web::Data<ContentGenerator>,
    path: web::Path<(String, String)>,
    query: web::Query<ShareQuery>,
) -> Result<HttpResponse, AppError> {
    let (deck_id, kind) = path.into_inner();
    let kind: ArtifactKind = kind
        .parse()
        .map_err(|_| AppError::InvalidInput("Invalid type".to_string()))?;

    let requester = requester(&session, query.into_inner().share);
    if !generator.access().can_view(&deck_id, &requester).await? {
        return Err(AppError::AccessDenied);
    }

    match generator.artifacts().get(&deck_id, kind).await? {
        Some(artifact) => Ok(HttpResponse::Ok().json(artifact)),
        None => Ok(HttpResponse::Ok().json(EmptyArtifact {
            deck_id,
            body: ArtifactBody::empty(kind),
        })),
    }
}

/// PATCH /api/decks/{id}/content - Replace the summary or flashcards of an
/// existing artifact. Owner or team member only.
pub async fn update(
    session: Session,
    generator: web::Data<ContentGenerator>,
    path: web::Path<String>,
    body: web::Json<ContentUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let deck_id = path.into_inner();

    if !generator.access().can_edit(&deck_id, user_id).await? {
        return Err(AppError::AccessDenied);
    }

    let body = body.into_inner();
    let content_edit = ContentEdit::from_request(body.kind.as_deref(), body.content)?;
    edit::apply_edit(generator.artifacts(), &deck_id, content_edit).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
