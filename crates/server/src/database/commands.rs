use chrono::{Duration, Utc};
use sqlx::{Error as SqlxError, QueryBuilder, Row, Sqlite, SqliteExecutor};
use tracing::{info, instrument};

use crate::auth::utils::{generate_session_token, hash_password, verify_password};
use crate::database::connection::DbConnection;
use crate::database::queries;
use crate::error::{RequestError, SessionError, ValidationError};
use crate::models::resource::{CreateResource, Resource, ResourceId, UpdateResource};
use crate::models::session::Session;
use crate::models::user::{
    validate_email, validate_password, validate_username, CreateUser, RegisterForm,
    UpdateProfileForm, User, UserId,
};
use crate::server::constants::SESSION_TTL_DAYS;

impl DbConnection {
    /// Registers a new user, enforcing username/email uniqueness. The email
    /// is lowercased before storage; lookups are case-insensitive anyway.
    pub async fn register_user(&self, form: &RegisterForm) -> Result<User, RequestError> {
        validate_username(&form.username)?;
        validate_email(&form.email)?;
        validate_password(&form.password)?;

        if queries::get_user_by_username(self.pool(), &form.username)
            .await?
            .is_some()
        {
            return Err(ValidationError::InvalidInput {
                value: form.username.clone(),
                reason: "username is already taken".to_string(),
            }
            .into());
        }
        let email = form.email.to_lowercase();
        if queries::get_user_by_email(self.pool(), &email)
            .await?
            .is_some()
        {
            return Err(ValidationError::InvalidInput {
                value: email,
                reason: "email already exists".to_string(),
            }
            .into());
        }

        let user = CreateUser {
            username: form.username.clone(),
            email,
            fullname: form.fullname.clone(),
            password_hash: hash_password(&form.password)?,
        };
        let user_id = create_user(self.pool(), &user).await?;
        queries::get_user_by_id(self.pool(), user_id)
            .await?
            .ok_or(ValidationError::NotFound.into())
    }

    /// Verifies credentials, bumps `last_login_at` and opens a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, RequestError> {
        let credentials = queries::get_user_credentials(self.pool(), username)
            .await?
            .ok_or(RequestError::BadCredentials)?;
        if !verify_password(password, &credentials.password_hash) {
            return Err(RequestError::BadCredentials);
        }

        let now = Utc::now();
        let session = Session {
            token: generate_session_token(),
            user_id: credentials.id,
            username: credentials.username,
            created_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };

        let mut transaction = self.pool().begin().await?;
        touch_last_login(transaction.as_mut(), credentials.id).await?;
        create_session(transaction.as_mut(), &session).await?;
        transaction.commit().await?;
        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> Result<u64, RequestError> {
        Ok(delete_session(self.pool(), token).await?)
    }

    /// Applies profile changes after re-running the registration uniqueness
    /// checks against other users.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        form: &UpdateProfileForm,
    ) -> Result<User, RequestError> {
        let current = queries::get_user_by_id(self.pool(), user_id)
            .await?
            .ok_or(ValidationError::NotFound)?;

        if let Some(username) = &form.username {
            validate_username(username)?;
            if let Some(other) = queries::get_user_by_username(self.pool(), username).await? {
                if other.id != current.id {
                    return Err(ValidationError::InvalidInput {
                        value: username.clone(),
                        reason: "username is already taken".to_string(),
                    }
                    .into());
                }
            }
        }
        let email = match &form.email {
            Some(email) => {
                validate_email(email)?;
                let email = email.to_lowercase();
                if let Some(other) = queries::get_user_by_email(self.pool(), &email).await? {
                    if other.id != current.id {
                        return Err(ValidationError::InvalidInput {
                            value: email,
                            reason: "email already exists".to_string(),
                        }
                        .into());
                    }
                }
                Some(email)
            }
            None => None,
        };

        let changes = UpdateProfileForm {
            username: form.username.clone(),
            email,
            fullname: form.fullname.clone(),
        };
        update_user(self.pool(), user_id, &changes)
            .await?
            .ok_or(ValidationError::NotFound.into())
    }

    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), RequestError> {
        let credentials = queries::get_user_credentials_by_id(self.pool(), user_id)
            .await?
            .ok_or(ValidationError::NotFound)?;
        if !verify_password(current_password, &credentials.password_hash) {
            return Err(RequestError::BadCredentials);
        }
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;
        update_user_password(self.pool(), user_id, &hash).await?;
        Ok(())
    }

    /// Sets a fresh password for the account behind `email`. Backs the
    /// reset flow, which runs without a session; callers have already
    /// confirmed the new password with the user.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), RequestError> {
        let user = queries::get_user_by_email(self.pool(), email)
            .await?
            .ok_or(ValidationError::NotFound)?;
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;
        update_user_password(self.pool(), user.id, &hash).await?;
        Ok(())
    }

    /// Removes a user with their resources and sessions in one transaction.
    pub async fn remove_user(&self, user_id: UserId) -> Result<(), RequestError> {
        if queries::get_user_by_id(self.pool(), user_id)
            .await?
            .is_none()
        {
            return Err(ValidationError::NotFound.into());
        }
        let mut transaction = self.pool().begin().await?;
        delete_sessions_for_user(transaction.as_mut(), user_id).await?;
        let resources = delete_resources_by_user(transaction.as_mut(), user_id).await?;
        delete_user(transaction.as_mut(), user_id).await?;
        transaction.commit().await?;
        info!("removed user {user_id} and {resources} of their resources");
        Ok(())
    }

    /// Creates a resource after confirming the owning user exists and that
    /// no other upload of theirs carries the same original filename.
    pub async fn add_resource(&self, request: &CreateResource) -> Result<Resource, RequestError> {
        if queries::get_user_by_id(self.pool(), request.user_id)
            .await?
            .is_none()
        {
            return Err(ValidationError::InvalidInput {
                value: request.user_id.to_string(),
                reason: "user does not exist".to_string(),
            }
            .into());
        }
        if let Some(filename) = &request.original_filename {
            if queries::get_resource_by_original_filename(self.pool(), request.user_id, filename)
                .await?
                .is_some()
            {
                return Err(ValidationError::AlreadyExists.into());
            }
        }
        let resource_id = create_resource(self.pool(), request).await?;
        queries::get_resource_by_id(self.pool(), resource_id)
            .await?
            .ok_or(ValidationError::NotFound.into())
    }

    /// Applies an edit to an owned resource. Returns the resulting row and
    /// whether anything actually changed.
    pub async fn edit_resource(
        &self,
        resource_id: ResourceId,
        user_id: UserId,
        changes: &UpdateResource,
    ) -> Result<(Resource, bool), RequestError> {
        let current = queries::get_resource_by_id(self.pool(), resource_id)
            .await?
            .filter(|r| r.user_id == user_id)
            .ok_or(ValidationError::NotFound)?;

        let differs = |submitted: &Option<String>, stored: &str| {
            submitted.as_deref().is_some_and(|v| v != stored)
        };
        let differs_opt = |submitted: &Option<String>, stored: &Option<String>| {
            submitted.is_some() && submitted != stored
        };
        let changed = differs(&changes.title, &current.title)
            || differs_opt(&changes.description, &current.description)
            || differs_opt(&changes.tags, &current.tags)
            || differs(&changes.kind, &current.kind)
            || differs(&changes.url, &current.url)
            || differs(&changes.source, &current.source);
        if !changed {
            return Ok((current, false));
        }

        let updated = update_resource(self.pool(), resource_id, changes)
            .await?
            .ok_or(ValidationError::NotFound)?;
        Ok((updated, true))
    }

    pub async fn remove_resource(&self, resource_id: ResourceId) -> Result<(), RequestError> {
        if queries::get_resource_by_id(self.pool(), resource_id)
            .await?
            .is_none()
        {
            return Err(ValidationError::NotFound.into());
        }
        delete_resource(self.pool(), resource_id).await?;
        Ok(())
    }

    /// Idempotent: marking an already-read resource is a no-op update.
    pub async fn mark_read(&self, resource_id: ResourceId) -> Result<Resource, RequestError> {
        mark_resource_as_read(self.pool(), resource_id)
            .await?
            .ok_or(ValidationError::NotFound.into())
    }

    pub async fn toggle_star(&self, resource_id: ResourceId) -> Result<Resource, RequestError> {
        toggle_star_resource(self.pool(), resource_id)
            .await?
            .ok_or(ValidationError::NotFound.into())
    }

    /// Bulk flag update over an explicit id list. Missing ids are silently
    /// skipped; the affected count is returned.
    pub async fn bulk_update(
        &self,
        ids: &[ResourceId],
        read_status: Option<bool>,
        starred: Option<bool>,
    ) -> Result<u64, RequestError> {
        Ok(bulk_update_resources(self.pool(), ids, read_status, starred).await?)
    }

    pub async fn bulk_delete(&self, ids: &[ResourceId]) -> Result<u64, RequestError> {
        Ok(bulk_delete_resources(self.pool(), ids).await?)
    }

    pub async fn resolve_session(&self, token: &str) -> Result<Session, SessionError> {
        let session = queries::get_session_by_token(self.pool(), token)
            .await
            .map_err(|_| SessionError::Internal)?
            .ok_or(SessionError::SessionNotFound)?;
        if session.expires_at < Utc::now() {
            let _ = delete_session(self.pool(), token).await;
            return Err(SessionError::SessionExpired);
        }
        Ok(session)
    }
}

#[instrument(skip_all)]
pub async fn create_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user: &CreateUser,
) -> Result<UserId, SqlxError> {
    let now = Utc::now();
    let result = sqlx::query(
        "
            INSERT INTO users (username, email, fullname, password_hash, created_at, updated_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $5, $5) RETURNING id;
        ",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(user.fullname.as_ref())
    .bind(&user.password_hash)
    .bind(now)
    .fetch_one(executor)
    .await?
    .try_get("id")?;
    info!("created user with id: {}", result);
    Ok(result)
}

#[instrument(skip(executor))]
pub async fn update_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    changes: &UpdateProfileForm,
) -> Result<Option<User>, SqlxError> {
    sqlx::query_as(
        "
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                fullname = COALESCE($4, fullname),
                updated_at = $5
            WHERE id = $1
            RETURNING id, username, email, fullname, created_at, updated_at, last_login_at, deleted_at;
        ",
    )
    .bind(user_id)
    .bind(changes.username.as_ref())
    .bind(changes.email.as_ref())
    .bind(changes.fullname.as_ref())
    .bind(Utc::now())
    .fetch_optional(executor)
    .await
}

#[instrument(skip(executor, password_hash))]
pub async fn update_user_password<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    password_hash: &str,
) -> Result<u64, SqlxError> {
    let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1;")
        .bind(user_id)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[instrument(skip(executor))]
pub async fn touch_last_login<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<(), SqlxError> {
    sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1;")
        .bind(user_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;
    Ok(())
}

#[instrument(skip(executor))]
pub async fn delete_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<u64, SqlxError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1;")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[instrument(skip_all)]
pub async fn create_resource<'a, E: SqliteExecutor<'a>>(
    executor: E,
    resource: &CreateResource,
) -> Result<ResourceId, SqlxError> {
    let now = Utc::now();
    sqlx::query(
        "
            INSERT INTO resources (title, description, tags, type, url, original_filename, source, created_at, updated_at, read_status, starred, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, 0, 0, $9) RETURNING id;
        ",
    )
    .bind(&resource.title)
    .bind(resource.description.as_ref())
    .bind(resource.tags.as_ref())
    .bind(&resource.kind)
    .bind(&resource.url)
    .bind(resource.original_filename.as_ref())
    .bind(&resource.source)
    .bind(now)
    .bind(resource.user_id)
    .fetch_one(executor)
    .await?
    .try_get("id")
}

#[instrument(skip(executor))]
pub async fn update_resource<'a, E: SqliteExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
    changes: &UpdateResource,
) -> Result<Option<Resource>, SqlxError> {
    sqlx::query_as(
        "
            UPDATE resources SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                tags = COALESCE($4, tags),
                type = COALESCE($5, type),
                url = COALESCE($6, url),
                source = COALESCE($7, source),
                updated_at = $8
            WHERE id = $1
            RETURNING *;
        ",
    )
    .bind(resource_id)
    .bind(changes.title.as_ref())
    .bind(changes.description.as_ref())
    .bind(changes.tags.as_ref())
    .bind(changes.kind.as_ref())
    .bind(changes.url.as_ref())
    .bind(changes.source.as_ref())
    .bind(Utc::now())
    .fetch_optional(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn delete_resource<'a, E: SqliteExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
) -> Result<u64, SqlxError> {
    let result = sqlx::query("DELETE FROM resources WHERE id = $1;")
        .bind(resource_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[instrument(skip(executor))]
pub async fn mark_resource_as_read<'a, E: SqliteExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
) -> Result<Option<Resource>, SqlxError> {
    sqlx::query_as(
        "UPDATE resources SET read_status = 1, updated_at = $2 WHERE id = $1 RETURNING *;",
    )
    .bind(resource_id)
    .bind(Utc::now())
    .fetch_optional(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn toggle_star_resource<'a, E: SqliteExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
) -> Result<Option<Resource>, SqlxError> {
    sqlx::query_as(
        "
            UPDATE resources
            SET starred = CASE WHEN starred = 0 THEN 1 ELSE 0 END, updated_at = $2
            WHERE id = $1
            RETURNING *;
        ",
    )
    .bind(resource_id)
    .bind(Utc::now())
    .fetch_optional(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn bulk_update_resources<'a, E: SqliteExecutor<'a>>(
    executor: E,
    ids: &[ResourceId],
    read_status: Option<bool>,
    starred: Option<bool>,
) -> Result<u64, SqlxError> {
    if ids.is_empty() || (read_status.is_none() && starred.is_none()) {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE resources SET updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(read_status) = read_status {
        builder.push(", read_status = ").push_bind(read_status);
    }
    if let Some(starred) = starred {
        builder.push(", starred = ").push_bind(starred);
    }
    builder.push(" WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(");");
    let result = builder.build().execute(executor).await?;
    Ok(result.rows_affected())
}

#[instrument(skip(executor))]
pub async fn bulk_delete_resources<'a, E: SqliteExecutor<'a>>(
    executor: E,
    ids: &[ResourceId],
) -> Result<u64, SqlxError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM resources WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(");");
    let result = builder.build().execute(executor).await?;
    Ok(result.rows_affected())
}

#[instrument(skip(executor))]
pub async fn delete_resources_by_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<u64, SqlxError> {
    let result = sqlx::query("DELETE FROM resources WHERE user_id = $1;")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[instrument(skip_all)]
pub async fn create_session<'a, E: SqliteExecutor<'a>>(
    executor: E,
    session: &Session,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            INSERT INTO sessions (token, user_id, username, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5);
        ",
    )
    .bind(&session.token)
    .bind(session.user_id)
    .bind(&session.username)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn delete_session<'a, E: SqliteExecutor<'a>>(
    executor: E,
    token: &str,
) -> Result<u64, SqlxError> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = $1;")
        .bind(token)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[instrument(skip(executor))]
pub async fn delete_sessions_for_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<u64, SqlxError> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1;")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
