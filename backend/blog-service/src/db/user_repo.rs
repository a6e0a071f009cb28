use async_trait::async_trait;
use sqlx::PgPool;

use super::{contains_pattern, map_db_error, UserRepository};
use crate::error::Result;
use crate::models::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, about, photo, \
                            password_hash, is_staff, is_active, joined_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (email, username, first_name, password_hash, is_staff)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.password_hash)
            .bind(user.is_staff)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total))
    }

    async fn search(&self, query: &str, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let pattern = contains_pattern(query);
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE first_name ILIKE $1 OR username ILIKE $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE first_name ILIKE $1 OR username ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total))
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                username = COALESCE($5, username),
                about = COALESCE($6, about)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.email)
            .bind(&changes.username)
            .bind(&changes.about)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn set_photo(&self, id: i64, photo: Option<&str>) -> Result<Option<User>> {
        let sql = format!("UPDATE users SET photo = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(photo)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
