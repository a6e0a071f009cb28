use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A comment on exactly one post. `post` and `user` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Comment {
    pub id: i64,
    #[serde(rename = "post")]
    pub post_id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Only the body is writable; post and user are read-only.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub comment: Option<String>,
}
