use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::session::require_user;
use crate::auth::validate;
use crate::errors::AppError;
use crate::models::team::{self, TeamPreview};

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    #[serde(default)]
    pub name: String,
}

pub async fn list(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let teams = team::list_for_user(&pool, user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "teams": teams })))
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<CreateTeamRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    if let Some(msg) = validate::validate_required(&body.name, "Team name is required", 100) {
        return Err(AppError::InvalidInput(msg));
    }

    let created = team::create(&pool, body.name.trim(), user_id).await?;
    log::info!("User {user_id} created team {}", created.id);
    Ok(HttpResponse::Created().json(json!({ "team": created })))
}

/// GET /api/teams/join/{code} - Public preview before joining.
pub async fn preview(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let code = path.into_inner();
    let found = team::find_by_invite_code(&pool, &code)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;
    let member_count = team::member_count(&pool, found.id).await?;

    let preview = TeamPreview {
        id: found.id,
        name: found.name,
        member_count,
    };
    Ok(HttpResponse::Ok().json(json!({ "team": preview })))
}

/// POST /api/teams/join/{code} - Joining twice is not an error.
pub async fn join(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let code = path.into_inner();
    let found = team::find_by_invite_code(&pool, &code)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid invite code".to_string()))?;

    if !team::add_member(&pool, found.id, user_id).await? {
        return Ok(HttpResponse::Ok().json(json!({ "team": found, "alreadyMember": true })));
    }
    log::info!("User {user_id} joined team {}", found.id);
    Ok(HttpResponse::Ok().json(json!({ "team": found, "joined": true })))
}
