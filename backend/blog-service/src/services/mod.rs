/// Business logic layer
///
/// Services run every operation in the same order: collection-level
/// permission check, resource lookup (404 on miss), object-level permission
/// check, then the read or write. Nothing is mutated before both checks pass.
pub mod auth;
pub mod categories;
pub mod comments;
pub mod posts;
pub mod users;

pub use auth::{AuthService, RefreshResponse};
pub use categories::CategoryService;
pub use comments::CommentService;
pub use posts::PostService;
pub use users::{validate_password_change, PhotoUpload, UserService};
