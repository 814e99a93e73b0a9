use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::session::SessionUser;
use crate::error::{RequestError, ValidationError};
use crate::models::listing::{ListingQuery, Page};
use crate::models::resource::{
    BulkDeleteRequest, BulkOutcome, BulkUpdateRequest, CreateResource, DateRange, Resource,
    ResourceId, UpdateResource,
};
use crate::server::constants::DEFAULT_RECENT_LIMIT;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadForm {
    pub title: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
    pub original_filename: Option<String>,
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub source: Option<String>,
    pub starred: Option<bool>,
    pub unread: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub msg: String,
    pub resource: Resource,
}

/// Browser forms post empty strings for untouched optional fields.
fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Form(form): Form<UploadForm>,
) -> Result<(StatusCode, Json<Resource>), RequestError> {
    let original_filename = none_if_empty(form.original_filename);
    let url = match none_if_empty(form.url) {
        Some(url) => url,
        None => match &original_filename {
            // No external link: mint a collision-free path for the upload.
            Some(filename) => {
                let extension = std::path::Path::new(filename)
                    .extension()
                    .map(|ext| format!(".{}", ext.to_string_lossy()))
                    .unwrap_or_default();
                format!("/uploads/devshelf-{}{}", Uuid::new_v4().simple(), extension)
            }
            None => {
                return Err(ValidationError::InvalidInput {
                    value: "<url>".to_string(),
                    reason: "either a url or an uploaded file is required".to_string(),
                }
                .into())
            }
        },
    };

    let request = CreateResource {
        title: form.title,
        description: none_if_empty(form.description),
        tags: none_if_empty(form.tags),
        kind: form.kind,
        url,
        original_filename,
        source: form.source,
        user_id: session.user_id,
    };
    let resource = state.db_connection.add_resource(&request).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

/// Filtered listing over the caller's resources. Exactly one filter applies,
/// checked in order: date range, source, starred, unread; otherwise a
/// paginated plain listing.
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Resource>>, RequestError> {
    let db = &state.db_connection;
    let user_id = session.user_id;

    let resources = if let (Some(start), Some(end)) = (query.start, query.end) {
        db.get_resources_by_date_range(user_id, &DateRange { start, end })
            .await?
    } else if let Some(source) = &query.source {
        db.get_resources_by_source(user_id, source).await?
    } else if query.starred == Some(true) {
        db.get_starred_resources(user_id).await?
    } else if query.unread == Some(true) {
        db.get_unread_resources(user_id).await?
    } else {
        let page = Page::from_query(ListingQuery {
            page: query.page,
            page_size: query.page_size,
        })?;
        db.get_resources_paginated(user_id, page).await?
    };
    Ok(Json(resources))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Resource>>, RequestError> {
    let resources = state
        .db_connection
        .search_resources(session.user_id, &query.q)
        .await?;
    Ok(Json(resources))
}

pub async fn recent(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Resource>>, RequestError> {
    let resources = state
        .db_connection
        .get_recent_resources(session.user_id, query.limit.unwrap_or(DEFAULT_RECENT_LIMIT))
        .await?;
    Ok(Json(resources))
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(resource_id): Path<ResourceId>,
) -> Result<Json<Resource>, RequestError> {
    let resource = state
        .db_connection
        .get_resource_by_id(resource_id)
        .await?
        .filter(|r| r.user_id == session.user_id)
        .ok_or(ValidationError::NotFound)?;
    Ok(Json(resource))
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(resource_id): Path<ResourceId>,
    Form(form): Form<UpdateResource>,
) -> Result<Json<EditResponse>, RequestError> {
    let changes = UpdateResource {
        title: none_if_empty(form.title),
        description: none_if_empty(form.description),
        tags: none_if_empty(form.tags),
        kind: none_if_empty(form.kind),
        url: none_if_empty(form.url),
        source: none_if_empty(form.source),
    };
    let (resource, changed) = state
        .db_connection
        .edit_resource(resource_id, session.user_id, &changes)
        .await?;
    let msg = if changed {
        "Resource updated successfully!"
    } else {
        "No changes detected."
    };
    Ok(Json(EditResponse {
        msg: msg.to_string(),
        resource,
    }))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    Path(resource_id): Path<ResourceId>,
) -> Result<Json<Value>, RequestError> {
    state.db_connection.remove_resource(resource_id).await?;
    Ok(Json(
        json!({ "msg": "Resource has been successfully deleted." }),
    ))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    Path(resource_id): Path<ResourceId>,
) -> Result<Json<Resource>, RequestError> {
    let resource = state.db_connection.mark_read(resource_id).await?;
    Ok(Json(resource))
}

pub async fn toggle_star(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    Path(resource_id): Path<ResourceId>,
) -> Result<Json<Resource>, RequestError> {
    let resource = state.db_connection.toggle_star(resource_id).await?;
    Ok(Json(resource))
}

pub async fn bulk_update(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<BulkOutcome>, RequestError> {
    let affected = state
        .db_connection
        .bulk_update(&request.ids, request.read_status, request.starred)
        .await?;
    Ok(Json(BulkOutcome { affected }))
}

pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<BulkOutcome>, RequestError> {
    let affected = state.db_connection.bulk_delete(&request.ids).await?;
    Ok(Json(BulkOutcome { affected }))
}

pub async fn rss_list(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
) -> Result<Json<Vec<Resource>>, RequestError> {
    let resources = state.db_connection.get_all_resources().await?;
    if resources.is_empty() {
        return Err(ValidationError::NotFound.into());
    }
    Ok(Json(resources))
}

pub async fn rss_get(
    State(state): State<Arc<AppState>>,
    _session: SessionUser,
    Path(resource_id): Path<ResourceId>,
) -> Result<Json<Resource>, RequestError> {
    let resource = state
        .db_connection
        .get_resource_by_id(resource_id)
        .await?
        .ok_or(ValidationError::NotFound)?;
    Ok(Json(resource))
}
