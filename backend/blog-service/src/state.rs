use crypto_core::JwtKeys;
use sqlx::PgPool;
use std::sync::Arc;

use crate::db::{
    CategoryRepository, CommentRepository, PgCategoryRepository, PgCommentRepository,
    PgPostRepository, PgTokenBlacklist, PgUserRepository, PostRepository, TokenBlacklist,
    UserRepository,
};
use crate::storage::PhotoStorage;

/// Shared collaborators handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub token_blacklist: Arc<dyn TokenBlacklist>,
    pub photos: Arc<dyn PhotoStorage>,
    pub jwt: Arc<JwtKeys>,
    /// Prefix joined with a stored photo path to form its public URL
    pub media_url: String,
}

impl AppState {
    /// State backed by PostgreSQL repositories.
    pub fn postgres(
        pool: PgPool,
        jwt: JwtKeys,
        photos: Arc<dyn PhotoStorage>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            token_blacklist: Arc::new(PgTokenBlacklist::new(pool)),
            photos,
            jwt: Arc::new(jwt),
            media_url: media_url.into(),
        }
    }
}
