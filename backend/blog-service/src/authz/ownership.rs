use super::Principal;
use crate::models::{Category, Comment, Post, User};

/// A resource checked at object level. `owner_id` names the owning account,
/// or `None` for shared data nobody owns.
pub trait OwnedResource {
    fn owner_id(&self) -> Option<i64>;
}

impl OwnedResource for Post {
    fn owner_id(&self) -> Option<i64> {
        Some(self.author_id)
    }
}

impl OwnedResource for Comment {
    fn owner_id(&self) -> Option<i64> {
        Some(self.user_id)
    }
}

/// An account owns itself.
impl OwnedResource for User {
    fn owner_id(&self) -> Option<i64> {
        Some(self.id)
    }
}

impl OwnedResource for Category {
    fn owner_id(&self) -> Option<i64> {
        None
    }
}

/// True iff the principal is authenticated and is the resource's owner.
/// The resource is not inspected for anonymous principals.
pub fn is_owner<R: OwnedResource + ?Sized>(principal: &Principal, resource: &R) -> bool {
    match principal {
        Principal::Anonymous => false,
        Principal::Authenticated(user) => resource.owner_id() == Some(user.id),
    }
}
