/// User service - registration, profile management, photos and passwords
use std::future::Future;
use std::sync::Arc;

use crypto_core::{hash_password, verify_password};
use validator::Validate;

use crate::authz::{Action, ActionGate, Principal, ResourceKind};
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{
    ChangePasswordRequest, NewUser, RegisterRequest, RequestBody, User, UserProfile,
    UserUpdateRequest,
};
use crate::pagination::{Page, Paginated};
use crate::state::AppState;
use crate::storage::PhotoStorage;

const KIND: ResourceKind = ResourceKind::UserAccount;
const MIN_PASSWORD_LEN: usize = 8;

/// An uploaded file, already read from the request body.
#[derive(Debug)]
pub struct PhotoUpload {
    pub content_type: Option<mime::Mime>,
    pub bytes: Vec<u8>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    photos: Arc<dyn PhotoStorage>,
    media_url: String,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            photos: state.photos.clone(),
            media_url: state.media_url.clone(),
        }
    }

    fn profile(&self, user: &User) -> UserProfile {
        UserProfile::from_user(user, &self.media_url)
    }

    /// Open registration. The password is hashed and never returned.
    pub async fn register(&self, principal: &Principal, req: RegisterRequest) -> Result<UserProfile> {
        ActionGate::authorize_collection(principal, KIND, Action::Create)?;
        req.validate()?;

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .create(&NewUser {
                email: req.email,
                username: req.username,
                first_name: req.first_name,
                password_hash,
                is_staff: false,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "account registered");
        Ok(self.profile(&user))
    }

    /// Every account. Administrators only.
    pub async fn list(
        &self,
        principal: &Principal,
        page: Page,
        base: &str,
    ) -> Result<Paginated<UserProfile>> {
        ActionGate::authorize_collection(principal, KIND, Action::List)?;
        let (users, total) = self.users.list(page.limit(), page.offset()).await?;
        Ok(Paginated::new(users, total, page, base)?.map(|u| self.profile(&u)))
    }

    /// Authors whose first name or username contains the query.
    pub async fn search(
        &self,
        principal: &Principal,
        query: Option<&str>,
        page: Page,
        base: &str,
    ) -> Result<Paginated<UserProfile>> {
        ActionGate::authorize_authenticated(principal, KIND, Action::List)?;
        let query = query.map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(AppError::BadRequest(
                "search_query parameter is required".to_string(),
            ));
        }

        let (users, total) = self.users.search(query, page.limit(), page.offset()).await?;
        if total == 0 {
            return Err(AppError::NotFound("No similar authors found".to_string()));
        }
        Ok(Paginated::new(users, total, page, base)?.map(|u| self.profile(&u)))
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> Result<UserProfile> {
        let user = self.authorize(principal, id, Action::Retrieve).await?;
        Ok(self.profile(&user))
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        req: impl Into<RequestBody<UserUpdateRequest>>,
        partial: bool,
    ) -> Result<UserProfile> {
        let action = if partial {
            Action::PartialUpdate
        } else {
            Action::Update
        };
        self.authorize(principal, id, action).await?;

        let changes = req.into().parse()?.into_changes(partial)?;
        let user = self.users.update(id, &changes).await?.ok_or_else(not_found)?;
        tracing::info!(user_id = id, "account updated");
        Ok(self.profile(&user))
    }

    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<()> {
        let user = self.authorize(principal, id, Action::Destroy).await?;

        if !self.users.delete(id).await? {
            return Err(not_found());
        }
        if let Some(photo) = user.photo.as_deref() {
            if let Err(err) = self.photos.remove(photo).await {
                tracing::warn!(user_id = id, error = %err, "failed to remove photo of deleted account");
            }
        }
        tracing::info!(user_id = id, "account deleted");
        Ok(())
    }

    /// Replace the profile photo.
    ///
    /// `upload` is only awaited once the caller is authorized, so a denied
    /// request never has its body read. The new file is stored and recorded
    /// before the old one is removed; concurrent uploads for one account
    /// resolve last-write-wins.
    pub async fn add_photo<F>(&self, principal: &Principal, id: i64, upload: F) -> Result<UserProfile>
    where
        F: Future<Output = Result<Option<PhotoUpload>>>,
    {
        let user = self.authorize(principal, id, Action::AddPhoto).await?;

        let upload = upload
            .await?
            .ok_or_else(|| AppError::BadRequest("no photo added".to_string()))?;
        let content_type = upload
            .content_type
            .filter(|ct| ct.type_() == mime::IMAGE)
            .ok_or_else(|| {
                AppError::Validation(
                    "photo: Upload a valid image. The file you uploaded was either not an image or a corrupted image."
                        .to_string(),
                )
            })?;
        if upload.bytes.is_empty() {
            return Err(AppError::Validation("photo: The submitted file is empty.".to_string()));
        }

        let stored = self.photos.store(&content_type, &upload.bytes).await?;
        let updated = match self.users.set_photo(id, Some(&stored)).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.discard_photo(id, &stored).await;
                return Err(not_found());
            }
            Err(err) => {
                self.discard_photo(id, &stored).await;
                return Err(err);
            }
        };

        if let Some(old) = user.photo.as_deref().filter(|old| *old != stored) {
            self.discard_photo(id, old).await;
        }
        tracing::info!(user_id = id, photo = %stored, "profile photo replaced");
        Ok(self.profile(&updated))
    }

    /// Best-effort file removal once the database no longer points at it.
    async fn discard_photo(&self, id: i64, path: &str) {
        if let Err(err) = self.photos.remove(path).await {
            tracing::warn!(user_id = id, photo = path, error = %err, "failed to remove photo file");
        }
    }

    /// Remove the profile photo. No-op when there is none.
    pub async fn delete_photo(&self, principal: &Principal, id: i64) -> Result<()> {
        let user = self.authorize(principal, id, Action::DeletePhoto).await?;

        if let Some(photo) = user.photo.as_deref() {
            self.photos.remove(photo).await?;
            self.users.set_photo(id, None).await?;
            tracing::info!(user_id = id, "profile photo deleted");
        }
        Ok(())
    }

    pub async fn change_password(
        &self,
        principal: &Principal,
        id: i64,
        req: impl Into<RequestBody<ChangePasswordRequest>>,
    ) -> Result<()> {
        let user = self.authorize(principal, id, Action::ChangePassword).await?;

        let req = req.into().parse()?;
        let new_password = validate_password_change(&req, &user.password_hash)?;
        let password_hash = hash_password(new_password)?;

        if !self.users.set_password_hash(id, &password_hash).await? {
            return Err(not_found());
        }
        tracing::info!(user_id = id, "password changed");
        Ok(())
    }

    /// Collection check, lookup, object check.
    async fn authorize(&self, principal: &Principal, id: i64, action: Action) -> Result<User> {
        ActionGate::authorize_collection(principal, KIND, action)?;
        let user = self.users.find_by_id(id).await?.ok_or_else(not_found)?;
        ActionGate::authorize_object(principal, KIND, action, &user)?;
        Ok(user)
    }
}

/// Password-change preconditions, checked in order and stopping at the first
/// failure. Returns the new password on success.
pub fn validate_password_change<'a>(
    req: &'a ChangePasswordRequest,
    stored_hash: &str,
) -> Result<&'a str> {
    let present = |field: &'a Option<String>| field.as_deref().filter(|v| !v.is_empty());

    let (Some(old_password), Some(new_password), Some(confirm_password)) = (
        present(&req.old_password),
        present(&req.new_password),
        present(&req.confirm_password),
    ) else {
        return Err(AppError::Validation("All fields are required".to_string()));
    };

    if !verify_password(old_password, stored_hash)? {
        return Err(AppError::Validation(
            "Your old password is incorrect".to_string(),
        ));
    }

    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if new_password != confirm_password {
        return Err(AppError::Validation(
            "Confirm password does not match new password".to_string(),
        ));
    }

    Ok(new_password)
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}
