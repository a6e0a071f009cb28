/// Account handlers: registration, profile, photo and password
use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{ErrorResponse, MessageResponse};
use crate::authz::Principal;
use crate::error::{AppError, Result};
use crate::models::{
    ChangePasswordRequest, RegisterRequest, RequestBody, UserProfile, UserUpdateRequest,
};
use crate::pagination::{base_url, PageParams, Paginated};
use crate::services::{PhotoUpload, UserService};
use crate::state::AppState;

const PHOTO_FIELD: &str = "photo";
const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearchParams {
    /// Matched against first name and username
    pub search_query: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoResponse {
    pub message: String,
    pub user: UserProfile,
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfile),
        (status = 400, description = "Invalid input or duplicate username/email", body = ErrorResponse)
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    principal: Principal,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let user = UserService::new(&state)
        .register(&principal, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(PageParams),
    responses(
        (status = 200, description = "Page of accounts", body = Paginated<UserProfile>),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    req: HttpRequest,
    state: web::Data<AppState>,
    principal: Principal,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = UserService::new(&state)
        .list(&principal, query.into_inner().into(), &base_url(&req))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    tag = "Users",
    params(UserSearchParams),
    responses(
        (status = 200, description = "Matching authors", body = Paginated<UserProfile>),
        (status = 400, description = "Missing search_query", body = ErrorResponse),
        (status = 404, description = "No similar authors found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_users(
    req: HttpRequest,
    state: web::Data<AppState>,
    principal: Principal,
    query: web::Query<UserSearchParams>,
) -> Result<HttpResponse> {
    let UserSearchParams {
        search_query,
        page,
        page_size,
    } = query.into_inner();
    let page = PageParams { page, page_size }.into();

    let results = UserService::new(&state)
        .search(&principal, search_query.as_deref(), page, &base_url(&req))
        .await?;
    Ok(HttpResponse::Ok().json(results))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = UserProfile),
        (status = 403, description = "Not the account owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = UserService::new(&state)
        .get(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Account replaced", body = UserProfile),
        (status = 403, description = "Not the account owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let user = UserService::new(&state)
        .update(&principal, path.into_inner(), RequestBody::Raw(body), false)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UserUpdateRequest,
    responses((status = 200, description = "Account updated", body = UserProfile)),
    security(("bearer_auth" = []))
)]
pub async fn patch_user(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let user = UserService::new(&state)
        .update(&principal, path.into_inner(), RequestBody::Raw(body), true)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Not the account owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    UserService::new(&state)
        .delete(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/add-photo",
    tag = "Users",
    params(("id" = i64, Path, description = "Account id")),
    request_body(content_type = "multipart/form-data", description = "Image in the `photo` field"),
    responses(
        (status = 200, description = "Photo replaced", body = PhotoResponse),
        (status = 400, description = "No photo or not an image", body = ErrorResponse),
        (status = 403, description = "Not the account owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_photo(
    req: HttpRequest,
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse> {
    // A body that is not multipart cannot carry a photo
    let multipart = is_multipart(&req);
    let upload = async move {
        if multipart {
            read_photo(payload).await
        } else {
            Ok(None)
        }
    };
    let user = UserService::new(&state)
        .add_photo(&principal, path.into_inner(), upload)
        .await?;
    Ok(HttpResponse::Ok().json(PhotoResponse {
        message: "photo added successfully".to_string(),
        user,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/delete-photo",
    tag = "Users",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Photo removed"),
        (status = 403, description = "Not the account owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_photo(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    UserService::new(&state)
        .delete_photo(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/change-password",
    tag = "Users",
    params(("id" = i64, Path, description = "Account id")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Precondition failed", body = ErrorResponse),
        (status = 403, description = "Not the account owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    UserService::new(&state)
        .change_password(&principal, path.into_inner(), RequestBody::Raw(body))
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Your password changed successfully",
    )))
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Pull the `photo` field out of a multipart body. Other fields are drained
/// and ignored.
async fn read_photo(mut payload: Multipart) -> Result<Option<PhotoUpload>> {
    let mut upload = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;
        let is_photo = upload.is_none() && field.name() == Some(PHOTO_FIELD);
        let content_type = field.content_type().cloned();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Error reading upload: {e}")))?;
            if !is_photo {
                continue;
            }
            if bytes.len() + chunk.len() > MAX_PHOTO_BYTES {
                return Err(AppError::Validation(format!(
                    "photo: File exceeds the {} MB limit.",
                    MAX_PHOTO_BYTES / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if is_photo {
            upload = Some(PhotoUpload {
                content_type,
                bytes,
            });
        }
    }

    Ok(upload)
}
