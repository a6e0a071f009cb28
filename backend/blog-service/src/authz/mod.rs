/// Authorization for posts, comments, categories and accounts
///
/// Every request resolves a [`Principal`] and passes through [`ActionGate`]
/// twice: once before any data is loaded (collection level) and once against
/// the loaded resource (object level). Both checks are pure functions of the
/// principal, the resource kind, the action and, for object checks, the
/// resource's owner.
pub mod gate;
pub mod ownership;
pub mod principal;
pub mod role;

pub use gate::{ActionGate, Decision, Denial, Requirement, Rule};
pub use ownership::{is_owner, OwnedResource};
pub use principal::{Action, AuthenticatedUser, Principal, ResourceKind};
pub use role::has_elevated_role;

/// Deny message for post and comment writes by someone other than the author.
pub const EDIT_RESTRICTED: &str = "Editing is restricted to the author only.";
/// Deny message for missing role or account ownership.
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
/// Deny message for anonymous requests.
pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
