use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::required_field;
use crate::error::{AppError, Result};

/// Stored account row. Never serialized directly: it carries the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub about: Option<String>,
    pub photo: Option<String>,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub about: Option<String>,
    /// Public URL of the profile photo
    pub photo: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_user(user: &User, media_url: &str) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            about: user.about.clone(),
            photo: user
                .photo
                .as_deref()
                .map(|path| format!("{}{}", media_url, path)),
            is_staff: user.is_staff,
            is_active: user.is_active,
            joined_at: user.joined_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// Profile fields an owner may change. Password and photo have their own
/// endpoints.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UserUpdateRequest {
    #[validate(length(min = 1, max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub username: Option<String>,
    #[validate(length(max = 500))]
    pub about: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub about: Option<String>,
}

impl UserUpdateRequest {
    pub fn into_changes(self, partial: bool) -> Result<UserChanges> {
        self.validate()?;
        if !partial {
            for (field, present) in [
                ("first_name", self.first_name.is_some()),
                ("email", self.email.is_some()),
                ("username", self.username.is_some()),
            ] {
                if !present {
                    return Err(AppError::Validation(required_field(field)));
                }
            }
        }

        Ok(UserChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            username: self.username,
            about: self.about,
        })
    }
}

/// All three fields are optional on the wire so that a missing one can be
/// reported with the protocol's own message.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}
