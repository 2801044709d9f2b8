use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Session(String),
    Hash(String),
    /// No authenticated user on a route that needs one.
    Unauthorized,
    AccessDenied,
    RateLimited,
    NotFound(String),
    InvalidInput(String),
    MissingApiKey,
    Upstream(String),
    MalformedModelOutput(String),
}

/// JSON body returned for every error response.
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Io(e) => write!(f, "IO error: {e}"),
            AppError::Json(e) => write!(f, "JSON error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::AccessDenied => write!(f, "Access denied"),
            AppError::RateLimited => write!(f, "Too many failed login attempts. Please try again later."),
            AppError::NotFound(what) => write!(f, "{what}"),
            AppError::InvalidInput(msg) => write!(f, "{msg}"),
            AppError::MissingApiKey => write!(f, "Missing OPENAI_API_KEY. Set it in the environment"),
            AppError::Upstream(e) => write!(f, "Language model request failed: {e}"),
            AppError::MalformedModelOutput(e) => write!(f, "Model did not return valid JSON: {e}"),
        }
    }
}

impl AppError {
    /// Message exposed to the client. Internal failures get a generic body.
    fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized
            | AppError::AccessDenied
            | AppError::RateLimited
            | AppError::NotFound(_)
            | AppError::InvalidInput(_)
            | AppError::MissingApiKey => self.to_string(),
            AppError::MalformedModelOutput(_) => "Model did not return valid JSON.".to_string(),
            _ => "Internal Server Error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }
        HttpResponse::build(status).json(ApiErrorResponse {
            error: self.public_message(),
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json(e)
    }
}
