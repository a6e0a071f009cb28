/// Token service - obtain, refresh and revoke bearer tokens
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use crypto_core::{verify_password, Claims, JwtKeys, TokenResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::{TokenBlacklist, UserRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";
const INVALID_TOKEN: &str = "Token is invalid or expired";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    blacklist: Arc<dyn TokenBlacklist>,
    jwt: Arc<JwtKeys>,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            blacklist: state.token_blacklist.clone(),
            jwt: state.jwt.clone(),
        }
    }

    /// Exchange username and password for an access/refresh pair.
    pub async fn obtain_pair(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = user.id, "login rejected: wrong password");
            return Err(invalid_credentials());
        }

        let pair = self.jwt.generate_token_pair(user.id, &user.username)?;
        tracing::info!(user_id = user.id, "token pair issued");
        Ok(pair)
    }

    /// Issue a fresh access token for a valid, non-revoked refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let claims = self.decode_refresh(refresh_token)?;
        let jti = claims
            .token_id()
            .map_err(|_| AppError::Authentication(INVALID_TOKEN.to_string()))?;

        if self.blacklist.is_blacklisted(jti).await? {
            return Err(AppError::Authentication("Token is blacklisted".to_string()));
        }

        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Authentication(INVALID_TOKEN.to_string()))?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        let access_token = self.jwt.generate_access_token(user.id, &user.username)?;
        Ok(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.ttl().access_secs,
        })
    }

    /// Revoke a refresh token. Any problem with the token is a 400.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<()> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("refresh_token: This field is required.".into()))?;

        let claims = self
            .decode_refresh(token)
            .map_err(|_| AppError::BadRequest(INVALID_TOKEN.to_string()))?;
        let jti = claims
            .token_id()
            .map_err(|_| AppError::BadRequest(INVALID_TOKEN.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::BadRequest(INVALID_TOKEN.to_string()))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AppError::BadRequest(INVALID_TOKEN.to_string()))?;

        self.blacklist.blacklist(jti, user_id, expires_at).await?;
        tracing::info!(user_id, %jti, "refresh token blacklisted");
        Ok(())
    }

    fn decode_refresh(&self, token: &str) -> Result<Claims> {
        self.jwt.validate_refresh_token(token).map_err(|e| {
            tracing::debug!(error = %e, "refresh token rejected");
            AppError::Authentication(INVALID_TOKEN.to_string())
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Authentication(INVALID_CREDENTIALS.to_string())
}
