use std::net::{IpAddr, Ipv4Addr};

use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::rate_limit::LoginLimiter;
use crate::auth::session::{require_user, sign_in, sign_out};
use crate::auth::{password, validate};
use crate::errors::{ApiErrorResponse, AppError};
use crate::models::user::{self, NewUser, UserProfile};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/register
pub async fn register(
    pool: web::Data<PgPool>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let email = body.email.trim().to_lowercase();

    if let Some(msg) = validate::validate_email(&email) {
        return Err(AppError::InvalidInput(msg));
    }
    if let Some(msg) = validate::validate_password(&body.password) {
        return Err(AppError::InvalidInput(msg));
    }
    if user::email_exists(&pool, &email).await? {
        return Err(AppError::InvalidInput(
            "An account with this email already exists".to_string(),
        ));
    }

    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| user::default_name(&email));

    let new_user = NewUser {
        hashed_password: password::hash_password(&body.password)?,
        email,
        name,
    };
    let user_id = user::create(&pool, &new_user).await?;
    log::info!("Registered user {user_id}");

    Ok(HttpResponse::Created().json(json!({ "success": true, "userId": user_id })))
}

/// POST /api/login
pub async fn login(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    limiter: web::Data<LoginLimiter>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check before any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}");
        return Err(AppError::RateLimited);
    }
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::InvalidInput("Email and password required".to_string()));
    }

    let email = body.email.trim().to_lowercase();
    let found = user::find_by_email(&pool, &email).await?;

    let verified = match &found {
        Some(u) => password::verify_password(&body.password, &u.hashed_password)?,
        None => false,
    };

    match found {
        Some(u) if verified => {
            limiter.clear(ip);
            sign_in(&session, u.id, &u.email)?;
            Ok(HttpResponse::Ok().json(json!({ "user": UserProfile::from(u) })))
        }
        _ => {
            limiter.record_failure(ip);
            Ok(HttpResponse::Unauthorized().json(ApiErrorResponse {
                error: "Invalid email or password".to_string(),
            }))
        }
    }
}

/// POST /api/logout
pub async fn logout(session: Session) -> Result<HttpResponse, AppError> {
    sign_out(&session);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// GET /api/me
pub async fn me(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let user_id = require_user(&session)?;
    let profile: UserProfile = user::find_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?
        .into();
    Ok(HttpResponse::Ok().json(json!({ "user": profile })))
}
