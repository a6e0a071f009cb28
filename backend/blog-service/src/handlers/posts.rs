/// Post handlers
use actix_web::{web, HttpRequest, HttpResponse};

use super::ErrorResponse;
use crate::authz::Principal;
use crate::error::Result;
use crate::models::{PostDetail, PostRequest, RequestBody};
use crate::pagination::{base_url, PageParams, Paginated};
use crate::services::PostService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    tag = "Posts",
    params(PageParams),
    responses(
        (status = 200, description = "Page of posts", body = Paginated<PostDetail>),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_posts(
    req: HttpRequest,
    state: web::Data<AppState>,
    principal: Principal,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = PostService::new(&state)
        .list(&principal, query.into_inner().into(), &base_url(&req))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "Posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post created", body = PostDetail),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let post = PostService::new(&state)
        .create(&principal, RequestBody::Raw(body))
        .await?;
    Ok(HttpResponse::Created().json(post))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post with comments", body = PostDetail),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_post(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = PostService::new(&state)
        .get(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    params(("id" = i64, Path, description = "Post id")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post replaced", body = PostDetail),
        (status = 403, description = "Not the author", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let post = PostService::new(&state)
        .update(&principal, path.into_inner(), RequestBody::Raw(body), false)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    params(("id" = i64, Path, description = "Post id")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostDetail),
        (status = 403, description = "Not the author", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn patch_post(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let post = PostService::new(&state)
        .update(&principal, path.into_inner(), RequestBody::Raw(body), true)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post and its comments deleted"),
        (status = 403, description = "Not the author", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    PostService::new(&state)
        .delete(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/mine",
    tag = "Posts",
    responses(
        (status = 200, description = "Posts by the caller", body = [PostDetail]),
        (status = 404, description = "Caller has no posts", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_posts(state: web::Data<AppState>, principal: Principal) -> Result<HttpResponse> {
    let posts = PostService::new(&state).mine(&principal).await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/search/{search_query}",
    tag = "Posts",
    params(("search_query" = String, Path, description = "Matched against title and slug")),
    responses((status = 200, description = "Matching posts", body = [PostDetail])),
    security(("bearer_auth" = []))
)]
pub async fn search_posts(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let posts = PostService::new(&state)
        .search(&principal, &path)
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}
