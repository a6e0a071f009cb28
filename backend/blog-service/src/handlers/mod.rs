/// HTTP handlers for blog-service
///
/// Handlers only translate between HTTP and the service layer; every
/// authorization decision is made by the services.
use actix_web::{error::JsonPayloadError, web, HttpRequest};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::middleware::{JwtAuthMiddleware, MetricsMiddleware};

pub mod auth;
pub mod categories;
pub mod comments;
pub mod posts;
pub mod users;

/// Plain acknowledgement body.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body, mirrors `AppError`'s response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub details: Option<String>,
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Malformed request body: {err}")).into()
}

/// Register the `/api/v1` scope. Literal segments (`mine`, `search`,
/// `logout`) are registered ahead of the `{id}` routes they would
/// otherwise collide with.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .wrap(JwtAuthMiddleware)
            .wrap(MetricsMiddleware)
            // Tokens
            .route("/token", web::post().to(auth::obtain_token))
            .route("/token/refresh", web::post().to(auth::refresh_token))
            // Categories
            .service(
                web::resource("/categories")
                    .route(web::get().to(categories::list_categories))
                    .route(web::post().to(categories::create_category)),
            )
            .service(
                web::resource("/categories/{id}")
                    .route(web::get().to(categories::get_category))
                    .route(web::put().to(categories::update_category))
                    .route(web::patch().to(categories::patch_category))
                    .route(web::delete().to(categories::delete_category)),
            )
            // Posts
            .route("/posts/mine", web::get().to(posts::my_posts))
            .route("/posts/search/{search_query}", web::get().to(posts::search_posts))
            .service(
                web::resource("/posts")
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .service(
                web::resource("/posts/{id}")
                    .route(web::get().to(posts::get_post))
                    .route(web::put().to(posts::update_post))
                    .route(web::patch().to(posts::patch_post))
                    .route(web::delete().to(posts::delete_post)),
            )
            // Comments
            .service(
                web::resource("/posts/{post_id}/comments")
                    .route(web::get().to(comments::list_comments))
                    .route(web::post().to(comments::create_comment)),
            )
            .service(
                web::resource("/posts/{post_id}/comments/{comment_id}")
                    .route(web::get().to(comments::get_comment))
                    .route(web::put().to(comments::update_comment))
                    .route(web::patch().to(comments::patch_comment))
                    .route(web::delete().to(comments::delete_comment)),
            )
            // Users
            .route("/users/logout", web::post().to(auth::logout))
            .route("/users/search", web::get().to(users::search_users))
            .service(
                web::resource("/users")
                    .route(web::get().to(users::list_users))
                    .route(web::post().to(users::register)),
            )
            .service(
                web::resource("/users/{id}")
                    .route(web::get().to(users::get_user))
                    .route(web::put().to(users::update_user))
                    .route(web::patch().to(users::patch_user))
                    .route(web::delete().to(users::delete_user)),
            )
            .service(
                web::resource("/users/{id}/add-photo")
                    .route(web::post().to(users::add_photo))
                    .route(web::put().to(users::add_photo)),
            )
            .route("/users/{id}/delete-photo", web::delete().to(users::delete_photo))
            .route(
                "/users/{id}/change-password",
                web::post().to(users::change_password),
            ),
    );
}
