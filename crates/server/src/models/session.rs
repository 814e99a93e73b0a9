use chrono::{DateTime, Utc};

use crate::models::user::UserId;

pub type SessionToken = String;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
