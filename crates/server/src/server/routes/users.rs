use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Form, Json};
use serde_json::{json, Value};

use crate::auth::session::SessionUser;
use crate::error::{RequestError, ValidationError};
use crate::models::user::{ChangePasswordForm, UpdateProfileForm, User, UserId};
use crate::server::state::AppState;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
) -> Result<Json<Vec<User>>, RequestError> {
    let users = state.db_connection.list_users().await?;
    if users.is_empty() {
        return Err(ValidationError::NotFound.into());
    }
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, RequestError> {
    let user = state
        .db_connection
        .get_user_by_id(user_id)
        .await?
        .ok_or(ValidationError::NotFound)?;
    Ok(Json(user))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
) -> Result<Json<User>, RequestError> {
    let user = state
        .db_connection
        .get_user_by_id(session.user_id)
        .await?
        .ok_or(ValidationError::NotFound)?;
    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Form(form): Form<UpdateProfileForm>,
) -> Result<Json<User>, RequestError> {
    let user = state
        .db_connection
        .update_profile(session.user_id, &form)
        .await?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Json<Value>, RequestError> {
    state
        .db_connection
        .change_password(session.user_id, &form.current_password, &form.new_password)
        .await?;
    Ok(Json(json!({ "msg": "Password changed successfully!" })))
}
