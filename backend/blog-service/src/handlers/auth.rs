/// Token handlers: obtain, refresh, logout
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ErrorResponse, MessageResponse};
use crate::error::Result;
use crate::services::{AuthService, RefreshResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenObtainRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// `refresh_token` is optional so its absence gets a field error instead of
/// a generic body error.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Access/refresh token pair
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<crypto_core::TokenResponse> for TokenPairResponse {
    fn from(tokens: crypto_core::TokenResponse) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/token",
    tag = "Auth",
    request_body = TokenObtainRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPairResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn obtain_token(
    state: web::Data<AppState>,
    payload: web::Json<TokenObtainRequest>,
) -> Result<HttpResponse> {
    let tokens = AuthService::new(&state)
        .obtain_pair(&payload.username, &payload.password)
        .await?;
    Ok(HttpResponse::Ok().json(TokenPairResponse::from(tokens)))
}

#[utoipa::path(
    post,
    path = "/api/v1/token/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Access token refreshed", body = RefreshResponse),
        (status = 401, description = "Invalid, expired or blacklisted token", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    state: web::Data<AppState>,
    payload: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    let refreshed = AuthService::new(&state)
        .refresh(&payload.refresh_token)
        .await?;
    Ok(HttpResponse::Ok().json(refreshed))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    tag = "Auth",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Refresh token blacklisted", body = MessageResponse),
        (status = 400, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn logout(
    state: web::Data<AppState>,
    payload: web::Json<LogoutRequest>,
) -> Result<HttpResponse> {
    AuthService::new(&state)
        .logout(payload.refresh_token.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out")))
}
