use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{required_field, Comment};
use crate::error::{AppError, Result};

pub const DEFAULT_CATEGORY_ID: i64 = 1;
const SLUG_MAX_LEN: usize = 250;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    #[default]
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

/// A blog post. `author_id` is set from the acting account at creation and
/// never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Post {
    pub id: i64,
    #[serde(rename = "category")]
    pub category_id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(rename = "author")]
    pub author_id: i64,
    pub status: PostStatus,
    pub published: DateTime<Utc>,
}

/// Post with its comments embedded, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comment: Vec<Comment>,
}

/// Writable post fields. `author` is deliberately absent: any value a client
/// sends for it is ignored.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct PostRequest {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub excerpt: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub category: Option<i64>,
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub category_id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub author_id: i64,
    pub status: PostStatus,
}

/// Field updates; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub category_id: Option<i64>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
}

impl PostRequest {
    pub fn into_new_post(self, author_id: i64) -> Result<NewPost> {
        self.validate()?;
        let title = self
            .title
            .ok_or_else(|| AppError::Validation(required_field("title")))?;
        let content = self
            .content
            .ok_or_else(|| AppError::Validation(required_field("content")))?;

        Ok(NewPost {
            category_id: self.category.unwrap_or(DEFAULT_CATEGORY_ID),
            slug: slugify(&title),
            title,
            excerpt: self.excerpt,
            content,
            author_id,
            status: self.status.unwrap_or_default(),
        })
    }

    /// `partial` is false for PUT, which needs every required field.
    pub fn into_changes(self, partial: bool) -> Result<PostChanges> {
        self.validate()?;
        if !partial {
            if self.title.is_none() {
                return Err(AppError::Validation(required_field("title")));
            }
            if self.content.is_none() {
                return Err(AppError::Validation(required_field("content")));
            }
        }

        Ok(PostChanges {
            category_id: self.category,
            slug: self.title.as_deref().map(slugify),
            title: self.title,
            excerpt: self.excerpt,
            content: self.content,
            status: self.status,
        })
    }
}

/// URL-safe slug: lowercase ASCII alphanumerics separated by single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    if slug.len() > SLUG_MAX_LEN {
        slug.truncate(SLUG_MAX_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}
