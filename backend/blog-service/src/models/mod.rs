/// Data models for the blog service
///
/// Row types map one-to-one onto the tables in `migrations/`; request and
/// response types live next to the row they are derived from.
pub mod body;
pub mod category;
pub mod comment;
pub mod post;
pub mod user;

pub use body::RequestBody;
pub use category::{Category, CategoryRequest};
pub use comment::{Comment, CommentRequest};
pub use post::{slugify, NewPost, Post, PostChanges, PostDetail, PostRequest, PostStatus};
pub use user::{
    ChangePasswordRequest, NewUser, RegisterRequest, User, UserChanges, UserProfile,
    UserUpdateRequest,
};

/// Error text for a required field missing from a full (PUT) update.
pub(crate) fn required_field(field: &str) -> String {
    format!("{field}: This field is required.")
}
