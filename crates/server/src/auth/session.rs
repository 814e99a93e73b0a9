use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{async_trait, RequestPartsExt};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::error::SessionError;
use crate::models::user::UserId;
use crate::server::state::AppState;

pub const SESSION_COOKIE: &str = "devshelf_session";

/// The authenticated caller, resolved from the session cookie against the
/// sessions table. Extracting this guards a handler behind login.
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub user_id: UserId,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = parts
            .extract::<CookieJar>()
            .await
            .map_err(|_| SessionError::Internal)?;
        let cookie = jar.get(SESSION_COOKIE).ok_or_else(|| {
            debug!("request without session cookie");
            SessionError::NoSession
        })?;
        let session = state.db_connection.resolve_session(cookie.value()).await?;
        Ok(SessionUser {
            user_id: session.user_id,
            username: session.username,
        })
    }
}
