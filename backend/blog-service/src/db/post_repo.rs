use async_trait::async_trait;
use sqlx::PgPool;

use super::{contains_pattern, map_db_error, PostRepository};
use crate::error::Result;
use crate::models::{NewPost, Post, PostChanges};

const POST_COLUMNS: &str =
    "id, category_id, title, slug, excerpt, content, author_id, status, published";

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: &NewPost) -> Result<Post> {
        let sql = format!(
            r#"
            INSERT INTO posts (category_id, title, slug, excerpt, content, author_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Post>(&sql)
            .bind(post.category_id)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.excerpt)
            .bind(&post.content)
            .bind(post.author_id)
            .bind(post.status)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64)> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY published DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok((posts, total))
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 ORDER BY published DESC, id DESC"
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn search(&self, query: &str) -> Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE title ILIKE $1 OR slug ILIKE $1
            ORDER BY published DESC, id DESC
            "#
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(contains_pattern(query))
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn count_in_category(&self, category_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update(&self, id: i64, changes: &PostChanges) -> Result<Option<Post>> {
        let sql = format!(
            r#"
            UPDATE posts
            SET category_id = COALESCE($2, category_id),
                title = COALESCE($3, title),
                slug = COALESCE($4, slug),
                excerpt = COALESCE($5, excerpt),
                content = COALESCE($6, content),
                status = COALESCE($7, status)
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(changes.category_id)
            .bind(&changes.title)
            .bind(&changes.slug)
            .bind(&changes.excerpt)
            .bind(&changes.content)
            .bind(changes.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // comments.post_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
