use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    error::InternalError,
    http::Method,
    middleware::{Next, from_fn},
    web,
};

use super::{auth_handlers, content_handlers, deck_handlers, share_handlers, team_handlers};
use crate::auth::middleware::require_auth;
use crate::errors::ApiErrorResponse;

const JSON_LIMIT: usize = 10 * 1024 * 1024;

/// CSRF protection for cookie-authenticated mutations.
///
/// Rejects POST/PUT/PATCH/DELETE requests whose Content-Type is not
/// `application/json`. A cross-site form post cannot set that header, so
/// no token is needed. GET requests pass through.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method();
    let mutating = method == Method::POST
        || method == Method::PUT
        || method == Method::PATCH
        || method == Method::DELETE;

    if mutating {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest().json(ApiErrorResponse {
                error: "Content-Type must be application/json for mutation requests".to_string(),
            });
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// JSON extractor settings: 10 MB bodies, parse failures as `{error}` 400s.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            let response = HttpResponse::BadRequest().json(ApiErrorResponse {
                error: format!("Invalid request body: {err}"),
            });
            InternalError::from_response(err, response).into()
        })
}

/// Register every `/api` route.
///
/// Routes reachable without a session (share links, generation, content
/// reads) come first and check deck access themselves; everything after
/// the inner scope requires a logged-in user.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config());
    cfg.app_data(web::PayloadConfig::new(JSON_LIMIT));
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_json_content_type))
            .route("/register", web::post().to(auth_handlers::register))
            .route("/login", web::post().to(auth_handlers::login))
            .route("/logout", web::post().to(auth_handlers::logout))
            .route("/generate", web::post().to(content_handlers::generate))
            .route("/share/{code}", web::get().to(share_handlers::view_shared))
            .route("/teams/join/{code}", web::get().to(team_handlers::preview))
            .route("/decks/{id}/content/{type}", web::get().to(content_handlers::read))
            .route("/decks/{id}", web::get().to(deck_handlers::read))
            .service(
                web::scope("")
                    .wrap(from_fn(require_auth))
                    .route("/me", web::get().to(auth_handlers::me))
                    // /decks/save-shared BEFORE /decks/{id}
                    .route("/decks/save-shared", web::post().to(share_handlers::save_shared))
                    .route("/decks", web::get().to(deck_handlers::list))
                    .route("/decks", web::post().to(deck_handlers::create))
                    .route("/decks/{id}", web::delete().to(deck_handlers::delete))
                    .route("/decks/{id}/content", web::patch().to(content_handlers::update))
                    .route("/decks/{id}/share", web::get().to(share_handlers::get))
                    .route("/decks/{id}/share", web::post().to(share_handlers::create))
                    .route("/decks/{id}/share", web::delete().to(share_handlers::deactivate))
                    .route("/teams", web::get().to(team_handlers::list))
                    .route("/teams", web::post().to(team_handlers::create))
                    .route("/teams/join/{code}", web::post().to(team_handlers::join)),
            ),
    );
}
