use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::UserId;

pub type ResourceId = i64;

/// A saved link/file record owned by a user. Tags are a denormalized
/// comma-separated string; consumers split/trim/dedupe themselves.
#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Resource {
    pub id: ResourceId,
    pub title: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub url: String,
    pub original_filename: Option<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub read_status: bool,
    pub starred: bool,
    pub user_id: UserId,
}

#[derive(Clone, Debug)]
pub struct CreateResource {
    pub title: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub kind: String,
    pub url: String,
    pub original_filename: Option<String>,
    pub source: String,
    pub user_id: UserId,
}

/// Edit payload; `None` fields keep their stored value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateResource {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
}

impl UpdateResource {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.kind.is_none()
            && self.url.is_none()
            && self.source.is_none()
    }
}

/// Flags applied uniformly to every id of a bulk update.
#[derive(Clone, Debug, Deserialize)]
pub struct BulkUpdateRequest {
    pub ids: Vec<ResourceId>,
    pub read_status: Option<bool>,
    pub starred: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<ResourceId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BulkOutcome {
    pub affected: u64,
}

/// Inclusive [start, end] filter over `created_at`.
#[derive(Clone, Debug, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
