use super::Principal;

/// True iff the principal is an authenticated administrator.
pub fn has_elevated_role(principal: &Principal) -> bool {
    principal.user().is_some_and(|user| user.is_staff)
}
