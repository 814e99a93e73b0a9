use sqlx::{Error as SqlxError, SqliteExecutor};
use tracing::instrument;

use crate::database::connection::DbConnection;
use crate::models::listing::Page;
use crate::models::resource::{DateRange, Resource, ResourceId};
use crate::models::session::Session;
use crate::models::tags::{split_tags, LabelCounter};
use crate::models::user::{User, UserCredentials, UserId};

const USER_COLUMNS: &str =
    "id, username, email, fullname, created_at, updated_at, last_login_at, deleted_at";

impl DbConnection {
    pub async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<User>, SqlxError> {
        get_user_by_id(self.pool(), user_id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SqlxError> {
        get_user_by_email(self.pool(), email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, SqlxError> {
        list_users(self.pool()).await
    }

    pub async fn get_resource_by_id(
        &self,
        resource_id: ResourceId,
    ) -> Result<Option<Resource>, SqlxError> {
        get_resource_by_id(self.pool(), resource_id).await
    }

    pub async fn get_resources_by_user(&self, user_id: UserId) -> Result<Vec<Resource>, SqlxError> {
        get_resources_by_user(self.pool(), user_id).await
    }

    pub async fn get_all_resources(&self) -> Result<Vec<Resource>, SqlxError> {
        get_all_resources(self.pool()).await
    }

    pub async fn get_resources_by_type(
        &self,
        user_id: UserId,
        resource_type: &str,
    ) -> Result<Vec<Resource>, SqlxError> {
        get_resources_by_type(self.pool(), user_id, resource_type).await
    }

    pub async fn get_resources_by_tag(
        &self,
        user_id: UserId,
        tag: &str,
    ) -> Result<Vec<Resource>, SqlxError> {
        get_resources_by_tag(self.pool(), user_id, tag).await
    }

    pub async fn get_resources_by_source(
        &self,
        user_id: UserId,
        source: &str,
    ) -> Result<Vec<Resource>, SqlxError> {
        get_resources_by_source(self.pool(), user_id, source).await
    }

    pub async fn get_starred_resources(&self, user_id: UserId) -> Result<Vec<Resource>, SqlxError> {
        get_starred_resources(self.pool(), user_id).await
    }

    pub async fn get_unread_resources(&self, user_id: UserId) -> Result<Vec<Resource>, SqlxError> {
        get_unread_resources(self.pool(), user_id).await
    }

    pub async fn get_resources_by_date_range(
        &self,
        user_id: UserId,
        range: &DateRange,
    ) -> Result<Vec<Resource>, SqlxError> {
        get_resources_by_date_range(self.pool(), user_id, range).await
    }

    pub async fn search_resources(
        &self,
        user_id: UserId,
        query: &str,
    ) -> Result<Vec<Resource>, SqlxError> {
        search_resources(self.pool(), user_id, query).await
    }

    pub async fn get_recent_resources(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Resource>, SqlxError> {
        get_recent_resources(self.pool(), user_id, limit).await
    }

    pub async fn get_resources_paginated(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<Vec<Resource>, SqlxError> {
        get_resources_paginated(self.pool(), user_id, page).await
    }

    pub async fn count_resources_by_user(&self, user_id: UserId) -> Result<i64, SqlxError> {
        count_resources_by_user(self.pool(), user_id).await
    }

    pub async fn count_starred_resources_by_user(&self, user_id: UserId) -> Result<i64, SqlxError> {
        count_starred_resources_by_user(self.pool(), user_id).await
    }

    pub async fn count_unread_resources_by_user(&self, user_id: UserId) -> Result<i64, SqlxError> {
        count_unread_resources_by_user(self.pool(), user_id).await
    }

    pub async fn count_resources_by_tag(
        &self,
        user_id: UserId,
        tag: &str,
    ) -> Result<i64, SqlxError> {
        count_resources_by_tag(self.pool(), user_id, tag).await
    }

    pub async fn count_resources_by_type(
        &self,
        user_id: UserId,
        resource_type: &str,
    ) -> Result<i64, SqlxError> {
        count_resources_by_type(self.pool(), user_id, resource_type).await
    }

    pub async fn count_resources_by_source(
        &self,
        user_id: UserId,
        source: &str,
    ) -> Result<i64, SqlxError> {
        count_resources_by_source(self.pool(), user_id, source).await
    }

    pub async fn get_distinct_tags_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<String>, SqlxError> {
        get_distinct_tags_by_user(self.pool(), user_id).await
    }

    pub async fn get_distinct_types_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<String>, SqlxError> {
        get_distinct_types_by_user(self.pool(), user_id).await
    }

    pub async fn get_distinct_sources_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<String>, SqlxError> {
        get_distinct_sources_by_user(self.pool(), user_id).await
    }

    pub async fn get_most_common_tags(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<String>, SqlxError> {
        get_most_common_tags(self.pool(), user_id, limit).await
    }

    pub async fn get_most_common_types(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<String>, SqlxError> {
        get_most_common_types(self.pool(), user_id, limit).await
    }

}

#[instrument(skip(executor))]
pub async fn get_user_by_id<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<Option<User>, SqlxError> {
    sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1;"
    ))
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_user_by_username<'a, E: SqliteExecutor<'a>>(
    executor: E,
    username: &str,
) -> Result<Option<User>, SqlxError> {
    sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1;"
    ))
    .bind(username)
    .fetch_optional(executor)
    .await
}

// The email column carries COLLATE NOCASE, so the match is case-insensitive.
#[instrument(skip(executor))]
pub async fn get_user_by_email<'a, E: SqliteExecutor<'a>>(
    executor: E,
    email: &str,
) -> Result<Option<User>, SqlxError> {
    sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1;"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_user_credentials<'a, E: SqliteExecutor<'a>>(
    executor: E,
    username: &str,
) -> Result<Option<UserCredentials>, SqlxError> {
    sqlx::query_as("SELECT id, username, password_hash FROM users WHERE username = $1;")
        .bind(username)
        .fetch_optional(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_user_credentials_by_id<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<Option<UserCredentials>, SqlxError> {
    sqlx::query_as("SELECT id, username, password_hash FROM users WHERE id = $1;")
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn list_users<'a, E: SqliteExecutor<'a>>(executor: E) -> Result<Vec<User>, SqlxError> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id;"))
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_resource_by_id<'a, E: SqliteExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
) -> Result<Option<Resource>, SqlxError> {
    sqlx::query_as("SELECT * FROM resources WHERE id = $1;")
        .bind(resource_id)
        .fetch_optional(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_resources_by_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as("SELECT * FROM resources WHERE user_id = $1 ORDER BY id;")
        .bind(user_id)
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_all_resources<'a, E: SqliteExecutor<'a>>(
    executor: E,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as("SELECT * FROM resources ORDER BY id;")
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_resources_by_type<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    resource_type: &str,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as("SELECT * FROM resources WHERE user_id = $1 AND type = $2 ORDER BY id;")
        .bind(user_id)
        .bind(resource_type)
        .fetch_all(executor)
        .await
}

/// Substring containment over the raw tag string, so a filter of "python"
/// also matches "micropython". Kept for parity with how tags are stored.
#[instrument(skip(executor))]
pub async fn get_resources_by_tag<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    tag: &str,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as(
        "SELECT * FROM resources WHERE user_id = $1 AND instr(tags, $2) > 0 ORDER BY id;",
    )
    .bind(user_id)
    .bind(tag)
    .fetch_all(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_resources_by_source<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    source: &str,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as("SELECT * FROM resources WHERE user_id = $1 AND source = $2 ORDER BY id;")
        .bind(user_id)
        .bind(source)
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_starred_resources<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as("SELECT * FROM resources WHERE user_id = $1 AND starred = 1 ORDER BY id;")
        .bind(user_id)
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_unread_resources<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as("SELECT * FROM resources WHERE user_id = $1 AND read_status = 0 ORDER BY id;")
        .bind(user_id)
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_resources_by_date_range<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    range: &DateRange,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as(
        "
    SELECT * FROM resources
    WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3
    ORDER BY id;
    ",
    )
    .bind(user_id)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(executor)
    .await
}

/// Case-sensitive substring match against title or description.
#[instrument(skip(executor))]
pub async fn search_resources<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    query: &str,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as(
        "
    SELECT * FROM resources
    WHERE user_id = $1 AND (instr(title, $2) > 0 OR instr(description, $2) > 0)
    ORDER BY id;
    ",
    )
    .bind(user_id)
    .bind(query)
    .fetch_all(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_recent_resources<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    limit: i64,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as(
        "SELECT * FROM resources WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2;",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_resources_paginated<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    page: Page,
) -> Result<Vec<Resource>, SqlxError> {
    sqlx::query_as(
        "SELECT * FROM resources WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3;",
    )
    .bind(user_id)
    .bind(page.size)
    .bind(page.offset())
    .fetch_all(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn count_resources_by_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<i64, SqlxError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE user_id = $1;")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn count_starred_resources_by_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<i64, SqlxError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE user_id = $1 AND starred = 1;")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn count_unread_resources_by_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<i64, SqlxError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE user_id = $1 AND read_status = 0;")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn count_resources_by_tag<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    tag: &str,
) -> Result<i64, SqlxError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE user_id = $1 AND instr(tags, $2) > 0;")
        .bind(user_id)
        .bind(tag)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn count_resources_by_type<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    resource_type: &str,
) -> Result<i64, SqlxError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE user_id = $1 AND type = $2;")
        .bind(user_id)
        .bind(resource_type)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn count_resources_by_source<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    source: &str,
) -> Result<i64, SqlxError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE user_id = $1 AND source = $2;")
        .bind(user_id)
        .bind(source)
        .fetch_one(executor)
        .await
}

/// Tag strings are split client-side; SQL never sees individual tags.
#[instrument(skip(executor))]
pub async fn get_distinct_tags_by_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<String>, SqlxError> {
    let raw: Vec<Option<String>> =
        sqlx::query_scalar("SELECT tags FROM resources WHERE user_id = $1 ORDER BY id;")
            .bind(user_id)
            .fetch_all(executor)
            .await?;
    let mut distinct = Vec::new();
    for tag_string in raw.into_iter().flatten() {
        for tag in split_tags(&tag_string) {
            if !distinct.iter().any(|seen| seen == tag) {
                distinct.push(tag.to_string());
            }
        }
    }
    Ok(distinct)
}

#[instrument(skip(executor))]
pub async fn get_distinct_types_by_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<String>, SqlxError> {
    sqlx::query_scalar("SELECT DISTINCT type FROM resources WHERE user_id = $1 ORDER BY type;")
        .bind(user_id)
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_distinct_sources_by_user<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<String>, SqlxError> {
    sqlx::query_scalar("SELECT DISTINCT source FROM resources WHERE user_id = $1 ORDER BY source;")
        .bind(user_id)
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_most_common_tags<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    limit: usize,
) -> Result<Vec<String>, SqlxError> {
    let raw: Vec<Option<String>> =
        sqlx::query_scalar("SELECT tags FROM resources WHERE user_id = $1 ORDER BY id;")
            .bind(user_id)
            .fetch_all(executor)
            .await?;
    let mut counter = LabelCounter::new();
    for tag_string in raw.into_iter().flatten() {
        counter.observe_tag_string(&tag_string);
    }
    Ok(counter.into_ranked(limit))
}

#[instrument(skip(executor))]
pub async fn get_most_common_types<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    limit: usize,
) -> Result<Vec<String>, SqlxError> {
    let raw: Vec<String> =
        sqlx::query_scalar("SELECT type FROM resources WHERE user_id = $1 ORDER BY id;")
            .bind(user_id)
            .fetch_all(executor)
            .await?;
    let mut counter = LabelCounter::new();
    for kind in &raw {
        counter.observe(kind);
    }
    Ok(counter.into_ranked(limit))
}

#[instrument(skip(executor))]
pub async fn get_resource_by_original_filename<'a, E: SqliteExecutor<'a>>(
    executor: E,
    user_id: UserId,
    filename: &str,
) -> Result<Option<Resource>, SqlxError> {
    sqlx::query_as("SELECT * FROM resources WHERE user_id = $1 AND original_filename = $2;")
        .bind(user_id)
        .bind(filename)
        .fetch_optional(executor)
        .await
}

#[instrument(skip(executor, token))]
pub async fn get_session_by_token<'a, E: SqliteExecutor<'a>>(
    executor: E,
    token: &str,
) -> Result<Option<Session>, SqlxError> {
    sqlx::query_as("SELECT * FROM sessions WHERE token = $1;")
        .bind(token)
        .fetch_optional(executor)
        .await
}
