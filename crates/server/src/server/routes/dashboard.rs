use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::session::SessionUser;
use crate::error::RequestError;
use crate::models::resource::{Resource, ResourceId};
use crate::models::tags::split_tags;
use crate::server::constants::DEFAULT_RANKING_LIMIT;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub filter: Option<String>,
    pub tags: Option<String>,
    pub msg: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: String,
    pub active_type: String,
    pub msg: Option<String>,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: i64,
    pub starred: i64,
    pub unread: i64,
    pub distinct_tags: Vec<String>,
    pub distinct_types: Vec<String>,
    pub distinct_sources: Vec<String>,
    pub most_common_tags: Vec<String>,
    pub most_common_types: Vec<String>,
}

/// Short codes arriving via redirect query params become user-facing text.
fn decode_msg(msg: Option<String>) -> Option<String> {
    msg.map(|msg| {
        match msg.as_str() {
            "uploaded" => "Resource uploaded successfully!",
            "updated" => "Resource updated successfully!",
            "no-change" => "No changes detected.",
            "password_changed" => "Password changed successfully!",
            other => other,
        }
        .to_string()
    })
}

/// Uppercases the first char and lowercases the rest, so `filter=VIDEO`
/// and `filter=video` both query the "Video" type.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

/// The logged-in user's resources. Tag search takes priority over the type
/// filter; a missing or "all" filter lists everything.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, RequestError> {
    let (resources, active_type) = match (&query.tags, &query.filter) {
        (Some(tags), _) if !tags.trim().is_empty() => {
            let mut found: Vec<Resource> = Vec::new();
            let mut seen: Vec<ResourceId> = Vec::new();
            for tag in split_tags(tags) {
                for resource in state
                    .db_connection
                    .get_resources_by_tag(session.user_id, tag)
                    .await?
                {
                    if !seen.contains(&resource.id) {
                        seen.push(resource.id);
                        found.push(resource);
                    }
                }
            }
            (found, "Tag".to_string())
        }
        (_, Some(filter)) if !filter.eq_ignore_ascii_case("all") => {
            let kind = capitalize(filter);
            let resources = state
                .db_connection
                .get_resources_by_type(session.user_id, &kind)
                .await?;
            (resources, kind)
        }
        _ => {
            let resources = state
                .db_connection
                .get_resources_by_user(session.user_id)
                .await?;
            (resources, "All".to_string())
        }
    };

    Ok(Json(DashboardResponse {
        user: session.username,
        active_type,
        msg: decode_msg(query.msg),
        resources,
    }))
}

/// Aggregated view backing the dashboard sidebar: counts, distinct labels
/// and frequency rankings.
pub async fn stats(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, RequestError> {
    let db = &state.db_connection;
    let user_id = session.user_id;
    let limit = query.limit.unwrap_or(DEFAULT_RANKING_LIMIT);

    Ok(Json(StatsResponse {
        total: db.count_resources_by_user(user_id).await?,
        starred: db.count_starred_resources_by_user(user_id).await?,
        unread: db.count_unread_resources_by_user(user_id).await?,
        distinct_tags: db.get_distinct_tags_by_user(user_id).await?,
        distinct_types: db.get_distinct_types_by_user(user_id).await?,
        distinct_sources: db.get_distinct_sources_by_user(user_id).await?,
        most_common_tags: db.get_most_common_tags(user_id, limit).await?,
        most_common_types: db.get_most_common_types(user_id, limit).await?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_uppercases_first_letter_and_lowercases_rest() {
        assert_eq!(capitalize("video"), "Video");
        assert_eq!(capitalize("VIDEO"), "Video");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn decode_known_msg_codes() {
        assert_eq!(
            decode_msg(Some("uploaded".to_string())).as_deref(),
            Some("Resource uploaded successfully!")
        );
        assert_eq!(
            decode_msg(Some("custom text".to_string())).as_deref(),
            Some("custom text")
        );
        assert_eq!(decode_msg(None), None);
    }
}
