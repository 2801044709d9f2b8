pub mod api;
pub mod auth_handlers;
pub mod content_handlers;
pub mod deck_handlers;
pub mod share_handlers;
pub mod team_handlers;

use actix_session::Session;
use serde::Deserialize;

use crate::auth::session::get_user_id;
use crate::generation::Requester;

/// Optional `?share=CODE` on read endpoints reachable through a share link.
#[derive(Debug, Default, Deserialize)]
pub struct ShareQuery {
    pub share: Option<String>,
}

pub(crate) fn requester(session: &Session, share_code: Option<String>) -> Requester {
    Requester {
        user_id: get_user_id(session),
        share_code,
    }
}
