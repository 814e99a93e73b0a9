use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::session::{SessionUser, SESSION_COOKIE};
use crate::error::{RequestError, ValidationError};
use crate::models::user::{
    ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm, User, UserId,
};
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<(StatusCode, Json<User>), RequestError> {
    let user = state.db_connection.register_user(&form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<LoginResponse>), RequestError> {
    let session = state
        .db_connection
        .login(&form.username, &form.password)
        .await?;
    let cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true);
    let response = LoginResponse {
        user_id: session.user_id,
        username: session.username,
        expires_at: session.expires_at,
    };
    Ok((jar.add(cookie), Json(response)))
}

/// Step one of the reset flow: confirm the email belongs to an account.
/// An unknown email is a 404.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Json<Value>, RequestError> {
    let user = state
        .db_connection
        .get_user_by_email(&form.email.to_lowercase())
        .await?
        .ok_or(ValidationError::NotFound)?;
    Ok(Json(
        json!({ "msg": "proceed to reset your password", "email": user.email }),
    ))
}

/// Step two: set the new password, re-entered for confirmation. No session
/// is required; the account is addressed by email.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Json<Value>, RequestError> {
    if form.new_password != form.confirm_password {
        return Err(ValidationError::InvalidInput {
            value: "<password>".to_string(),
            reason: "passwords do not match".to_string(),
        }
        .into());
    }
    state
        .db_connection
        .reset_password(&form.email.to_lowercase(), &form.new_password)
        .await?;
    Ok(Json(json!({ "msg": "Password changed successfully!" })))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), RequestError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.db_connection.logout(cookie.value()).await?;
    }
    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    Ok((jar, Json(json!({ "msg": "logged out" }))))
}
