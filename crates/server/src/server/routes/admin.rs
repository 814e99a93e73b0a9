use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::auth::session::SessionUser;
use crate::error::RequestError;
use crate::models::user::{User, UserId};
use crate::server::state::AppState;

pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
) -> Result<Json<Vec<User>>, RequestError> {
    let users = state.db_connection.list_users().await?;
    Ok(Json(users))
}

/// Deletes a user along with their resources and sessions.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<Value>, RequestError> {
    state.db_connection.remove_user(user_id).await?;
    Ok(Json(
        json!({ "msg": "User has been successfully deleted." }),
    ))
}
