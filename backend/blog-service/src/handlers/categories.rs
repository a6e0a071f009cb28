/// Category handlers (administrators only)
use actix_web::{web, HttpRequest, HttpResponse};

use super::ErrorResponse;
use crate::authz::Principal;
use crate::error::Result;
use crate::models::{Category, CategoryRequest, RequestBody};
use crate::pagination::{base_url, PageParams, Paginated};
use crate::services::CategoryService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "Categories",
    params(PageParams),
    responses(
        (status = 200, description = "Page of categories", body = Paginated<Category>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_categories(
    req: HttpRequest,
    state: web::Data<AppState>,
    principal: Principal,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = CategoryService::new(&state)
        .list(&principal, query.into_inner().into(), &base_url(&req))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "Categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let category = CategoryService::new(&state)
        .create(&principal, RequestBody::Raw(body))
        .await?;
    Ok(HttpResponse::Created().json(category))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_category(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let category = CategoryService::new(&state)
        .get(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category replaced", body = Category),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let category = CategoryService::new(&state)
        .update(&principal, path.into_inner(), RequestBody::Raw(body), false)
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

#[utoipa::path(
    patch,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses((status = 200, description = "Category updated", body = Category)),
    security(("bearer_auth" = []))
)]
pub async fn patch_category(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let category = CategoryService::new(&state)
        .update(&principal, path.into_inner(), RequestBody::Raw(body), true)
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 409, description = "Posts still reference the category", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    CategoryService::new(&state)
        .delete(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
