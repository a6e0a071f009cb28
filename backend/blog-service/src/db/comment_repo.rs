use async_trait::async_trait;
use sqlx::PgPool;

use super::{map_db_error, CommentRepository};
use crate::error::Result;
use crate::models::Comment;

#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, post_id: i64, user_id: i64, comment: Option<&str>) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, user_id, comment)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, user_id, comment, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn find_in_post(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, comment, created_at, updated_at
            FROM comments
            WHERE id = $1 AND post_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, comment, created_at, updated_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn update(&self, comment_id: i64, comment: Option<&str>) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET comment = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, post_id, user_id, comment, created_at, updated_at
            "#,
        )
        .bind(comment_id)
        .bind(comment)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
