/// OpenAPI documentation for the blog service
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers::auth::{LogoutRequest, RefreshRequest, TokenObtainRequest, TokenPairResponse};
use crate::handlers::users::PhotoResponse;
use crate::handlers::{ErrorResponse, MessageResponse};
use crate::models::{
    Category, CategoryRequest, ChangePasswordRequest, Comment, CommentRequest, Post, PostDetail,
    PostRequest, PostStatus, RegisterRequest, UserProfile, UserUpdateRequest,
};
use crate::services::RefreshResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog Service API",
        version = "1.0.0",
        description = "Blog backend: accounts, posts, comments and categories. Every write is gated by ownership or administrator role."
    ),
    paths(
        crate::handlers::auth::obtain_token,
        crate::handlers::auth::refresh_token,
        crate::handlers::auth::logout,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::patch_category,
        crate::handlers::categories::delete_category,
        crate::handlers::posts::list_posts,
        crate::handlers::posts::create_post,
        crate::handlers::posts::get_post,
        crate::handlers::posts::update_post,
        crate::handlers::posts::patch_post,
        crate::handlers::posts::delete_post,
        crate::handlers::posts::my_posts,
        crate::handlers::posts::search_posts,
        crate::handlers::comments::list_comments,
        crate::handlers::comments::create_comment,
        crate::handlers::comments::get_comment,
        crate::handlers::comments::update_comment,
        crate::handlers::comments::patch_comment,
        crate::handlers::comments::delete_comment,
        crate::handlers::users::register,
        crate::handlers::users::list_users,
        crate::handlers::users::search_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::patch_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::add_photo,
        crate::handlers::users::delete_photo,
        crate::handlers::users::change_password
    ),
    components(schemas(
        Category,
        CategoryRequest,
        Comment,
        CommentRequest,
        Post,
        PostDetail,
        PostRequest,
        PostStatus,
        UserProfile,
        RegisterRequest,
        UserUpdateRequest,
        ChangePasswordRequest,
        TokenObtainRequest,
        TokenPairResponse,
        RefreshRequest,
        RefreshResponse,
        LogoutRequest,
        PhotoResponse,
        MessageResponse,
        ErrorResponse
    )),
    tags(
        (name = "Auth", description = "Token issue, refresh and revocation"),
        (name = "Categories", description = "Post categories (administrators only)"),
        (name = "Posts", description = "Blog posts"),
        (name = "Comments", description = "Comments on a post"),
        (name = "Users", description = "Accounts, profile photos and passwords")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/v1/openapi.json"
    }
}
