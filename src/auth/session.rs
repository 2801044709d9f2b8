use actix_session::Session;

use crate::errors::AppError;

const USER_ID_KEY: &str = "user_id";
const EMAIL_KEY: &str = "email";

/// The logged-in user's id, if any. Unreadable session data counts as logged out.
pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID_KEY).unwrap_or(None)
}

/// The logged-in user's id, or `Unauthorized`.
pub fn require_user(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or(AppError::Unauthorized)
}

/// Start an authenticated session. The session id is renewed to avoid fixation.
pub fn sign_in(session: &Session, user_id: i64, email: &str) -> Result<(), AppError> {
    session.renew();
    session
        .insert(USER_ID_KEY, user_id)
        .and_then(|_| session.insert(EMAIL_KEY, email))
        .map_err(|e| AppError::Session(format!("Failed to store session: {e}")))
}

pub fn sign_out(session: &Session) {
    session.purge();
}
