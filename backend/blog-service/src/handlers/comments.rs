/// Comment handlers, nested under a post
use actix_web::{web, HttpResponse};

use super::ErrorResponse;
use crate::authz::Principal;
use crate::error::Result;
use crate::models::{Comment, CommentRequest, RequestBody};
use crate::services::CommentService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/comments",
    tag = "Comments",
    params(("post_id" = i64, Path, description = "Parent post id")),
    responses(
        (status = 200, description = "Comments on the post", body = [Comment]),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
pub async fn list_comments(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let comments = CommentService::new(&state)
        .list(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(comments))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/comments",
    tag = "Comments",
    params(("post_id" = i64, Path, description = "Parent post id")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_comment(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let comment = CommentService::new(&state)
        .create(&principal, path.into_inner(), RequestBody::Raw(body))
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/comments/{comment_id}",
    tag = "Comments",
    params(
        ("post_id" = i64, Path, description = "Parent post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment", body = Comment),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_comment(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = CommentService::new(&state)
        .get(&principal, post_id, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{post_id}/comments/{comment_id}",
    tag = "Comments",
    params(
        ("post_id" = i64, Path, description = "Parent post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment replaced", body = Comment),
        (status = 403, description = "Not the commenter", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_comment(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(i64, i64)>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = CommentService::new(&state)
        .update(&principal, post_id, comment_id, RequestBody::Raw(body), false)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

#[utoipa::path(
    patch,
    path = "/api/v1/posts/{post_id}/comments/{comment_id}",
    tag = "Comments",
    params(
        ("post_id" = i64, Path, description = "Parent post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    request_body = CommentRequest,
    responses((status = 200, description = "Comment updated", body = Comment)),
    security(("bearer_auth" = []))
)]
pub async fn patch_comment(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(i64, i64)>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = CommentService::new(&state)
        .update(&principal, post_id, comment_id, RequestBody::Raw(body), true)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{post_id}/comments/{comment_id}",
    tag = "Comments",
    params(
        ("post_id" = i64, Path, description = "Parent post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the commenter", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    CommentService::new(&state)
        .delete(&principal, post_id, comment_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
