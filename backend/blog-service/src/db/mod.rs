/// Database access layer
///
/// Each table is reached through a repository trait so that services can be
/// driven by PostgreSQL in production and by in-memory stores in tests.
/// PostgreSQL implementations live in the `*_repo` modules.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::models::{
    Category, Comment, NewPost, NewUser, Post, PostChanges, User, UserChanges,
};

pub mod category_repo;
pub mod comment_repo;
pub mod post_repo;
pub mod token_repo;
pub mod user_repo;

pub use category_repo::PgCategoryRepository;
pub use comment_repo::PgCommentRepository;
pub use post_repo::PgPostRepository;
pub use token_repo::PgTokenBlacklist;
pub use user_repo::PgUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Duplicate username or email is a validation error.
    async fn create(&self, user: &NewUser) -> Result<User>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Page of accounts ordered by id, with the total count.
    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64)>;

    /// Case-insensitive match on first name or username.
    async fn search(&self, query: &str, limit: i64, offset: i64) -> Result<(Vec<User>, i64)>;

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<Option<User>>;

    async fn set_photo(&self, id: i64, photo: Option<&str>) -> Result<Option<User>>;

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, name: &str) -> Result<Category>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>>;

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Category>, i64)>;

    async fn update(&self, id: i64, name: &str) -> Result<Option<Category>>;

    /// Fails with `Conflict` while posts still reference the category.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &NewPost) -> Result<Post>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Page of posts, newest first, with the total count.
    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64)>;

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>>;

    /// Case-insensitive match on title or slug.
    async fn search(&self, query: &str) -> Result<Vec<Post>>;

    async fn count_in_category(&self, category_id: i64) -> Result<i64>;

    async fn update(&self, id: i64, changes: &PostChanges) -> Result<Option<Post>>;

    /// Deletes the post and its comments.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, post_id: i64, user_id: i64, comment: Option<&str>) -> Result<Comment>;

    /// Look up a comment, scoped to its parent post.
    async fn find_in_post(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>>;

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>>;

    /// Replace the body and refresh `updated_at`.
    async fn update(&self, comment_id: i64, comment: Option<&str>) -> Result<Option<Comment>>;

    async fn delete(&self, comment_id: i64) -> Result<bool>;
}

/// Revoked refresh tokens.
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    /// Idempotent: blacklisting the same jti twice is not an error.
    async fn blacklist(&self, jti: Uuid, user_id: i64, expires_at: DateTime<Utc>) -> Result<()>;

    async fn is_blacklisted(&self, jti: Uuid) -> Result<bool>;

    /// Drop entries whose token has expired anyway. Returns entries removed.
    async fn purge_expired(&self) -> Result<u64>;
}

/// Create the PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&config.url)
        .await
}

/// Apply embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Map constraint violations onto client errors; anything else stays a
/// database error.
pub(crate) fn map_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            // unique_violation
            Some("23505") => {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email",
                    Some(c) if c.contains("username") => "username",
                    _ => "value",
                };
                return AppError::Validation(format!("{field}: This {field} is already in use."));
            }
            // foreign_key_violation
            Some("23503") => {
                return AppError::Conflict(
                    "Operation blocked by records that still reference this resource".to_string(),
                )
            }
            _ => {}
        }
    }
    AppError::Database(err)
}

/// Escape LIKE wildcards in user input and wrap it for a contains match.
pub(crate) fn contains_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rust"), "%rust%");
        assert_eq!(contains_pattern("100%_a"), "%100\\%\\_a%");
    }
}
