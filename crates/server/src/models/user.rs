use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub type UserId = i64;

const USERNAME_LENGTH_LIMIT: usize = 30;
const PASSWORD_MIN_LENGTH: usize = 8;
const PASSWORD_MAX_LENGTH: usize = 80;

/// Public view of a user row, password hash excluded.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub fullname: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

#[derive(Clone, Debug)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub fullname: Option<String>,
    pub password_hash: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub fullname: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Profile changes; `None` fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateProfileForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub fullname: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
}

/// First step of the password-reset flow: resolve an account by email.
#[derive(Clone, Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    for ch in username.chars() {
        if !(ch.is_alphanumeric() || ch == '_') {
            return Err(ValidationError::InvalidInput {
                value: username.to_string(),
                reason: "username can only contain letters, numbers and underscores".to_string(),
            });
        }
    }
    if username.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: username.to_string(),
            reason: "username cannot be empty".to_string(),
        });
    }
    if username.len() > USERNAME_LENGTH_LIMIT {
        return Err(ValidationError::InvalidInput {
            value: username.to_string(),
            reason: format!("username cannot be longer than {} chars", USERNAME_LENGTH_LIMIT),
        });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !email.contains('@') || !email.contains('.') {
        return Err(ValidationError::InvalidInput {
            value: email.to_string(),
            reason: "invalid email format".to_string(),
        });
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < PASSWORD_MIN_LENGTH || password.len() > PASSWORD_MAX_LENGTH {
        return Err(ValidationError::InvalidInput {
            value: "<password>".to_string(),
            reason: format!(
                "password should be at least {} and at most {} characters long",
                PASSWORD_MIN_LENGTH, PASSWORD_MAX_LENGTH
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_requires_at_and_dot() {
        assert!(validate_email("dev@example.com").is_ok());
        assert!(validate_email("dev.example.com").is_err());
        assert!(validate_email("dev@example-com").is_err());
    }

    #[test]
    fn username_rejects_symbols() {
        assert!(validate_username("dev_123").is_ok());
        assert!(validate_username("dev 123").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(81)).is_err());
    }
}
