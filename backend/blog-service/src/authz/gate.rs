use super::{
    has_elevated_role, is_owner, Action, OwnedResource, Principal, ResourceKind, EDIT_RESTRICTED,
    NOT_AUTHENTICATED, PERMISSION_DENIED,
};
use crate::error::{AppError, Result};
use crate::metrics::AUTHZ_DECISIONS_TOTAL;

/// What a principal must satisfy at one level of the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    AllowAny,
    Authenticated,
    Elevated,
    /// Reads pass; writes need the resource owner.
    OwnerOnWrite,
    /// Authenticated, and at object level also the owner, for reads and writes.
    AuthenticatedOwner,
}

/// Collection-level and object-level requirement for one (kind, action).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub collection: Requirement,
    pub object: Requirement,
}

impl Rule {
    const fn new(collection: Requirement, object: Requirement) -> Self {
        Self { collection, object }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// The principal is anonymous. Maps to 401.
    NotAuthenticated,
    /// The principal is known but not allowed. Maps to 403.
    Forbidden(&'static str),
}

impl Denial {
    pub fn message(&self) -> &'static str {
        match self {
            Denial::NotAuthenticated => NOT_AUTHENTICATED,
            Denial::Forbidden(message) => *message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// The single permission table for every resource kind and action.
pub struct ActionGate;

impl ActionGate {
    /// Look up the rule for a (kind, action) pair. Pairs with no rule, such as
    /// `AddPhoto` on a post, are denied.
    pub fn rule(kind: ResourceKind, action: Action) -> Option<Rule> {
        use Action::*;
        use Requirement::*;

        let rule = match (kind, action) {
            (ResourceKind::Category, List | Create | Retrieve | Update | PartialUpdate | Destroy) => {
                Rule::new(Elevated, Elevated)
            }

            (ResourceKind::Post, List) => Rule::new(Elevated, Elevated),
            (ResourceKind::Post, Create) => Rule::new(Authenticated, Authenticated),
            (ResourceKind::Post, Retrieve | Update | PartialUpdate | Destroy) => {
                Rule::new(AllowAny, OwnerOnWrite)
            }

            (ResourceKind::Comment, List | Create | Retrieve) => {
                Rule::new(Authenticated, Authenticated)
            }
            (ResourceKind::Comment, Update | PartialUpdate | Destroy) => {
                Rule::new(AllowAny, OwnerOnWrite)
            }

            (ResourceKind::UserAccount, Create) => Rule::new(AllowAny, AllowAny),
            (ResourceKind::UserAccount, List) => Rule::new(Elevated, Elevated),
            (
                ResourceKind::UserAccount,
                Retrieve | Update | PartialUpdate | Destroy | AddPhoto | DeletePhoto
                | ChangePassword,
            ) => Rule::new(Authenticated, AuthenticatedOwner),

            _ => return None,
        };
        Some(rule)
    }

    /// Decide before any resource is loaded.
    pub fn check_collection(principal: &Principal, kind: ResourceKind, action: Action) -> Decision {
        match Self::rule(kind, action) {
            Some(rule) => evaluate(rule.collection, principal, action, None),
            None => deny_unknown(principal),
        }
    }

    /// Decide against a loaded resource. The caller has already resolved it
    /// (404 otherwise) and already passed the collection check.
    pub fn check_object<R: OwnedResource>(
        principal: &Principal,
        kind: ResourceKind,
        action: Action,
        resource: &R,
    ) -> Decision {
        match Self::rule(kind, action) {
            Some(rule) => {
                let resource: &dyn OwnedResource = resource;
                evaluate(rule.object, principal, action, Some(resource))
            }
            None => deny_unknown(principal),
        }
    }

    /// [`check_collection`](Self::check_collection), converted to an error on deny.
    pub fn authorize_collection(
        principal: &Principal,
        kind: ResourceKind,
        action: Action,
    ) -> Result<()> {
        let decision = Self::check_collection(principal, kind, action);
        enforce(decision, principal, kind, action, "collection")
    }

    /// Authentication-only check for read endpoints outside the table, such as
    /// an author's own posts and the search endpoints.
    pub fn authorize_authenticated(
        principal: &Principal,
        kind: ResourceKind,
        action: Action,
    ) -> Result<()> {
        let decision = evaluate(Requirement::Authenticated, principal, action, None);
        enforce(decision, principal, kind, action, "collection")
    }

    /// [`check_object`](Self::check_object), converted to an error on deny.
    pub fn authorize_object<R: OwnedResource>(
        principal: &Principal,
        kind: ResourceKind,
        action: Action,
        resource: &R,
    ) -> Result<()> {
        let decision = Self::check_object(principal, kind, action, resource);
        enforce(decision, principal, kind, action, "object")
    }
}

fn evaluate(
    requirement: Requirement,
    principal: &Principal,
    action: Action,
    resource: Option<&dyn OwnedResource>,
) -> Decision {
    let authenticated = principal.is_authenticated();

    let allowed = match requirement {
        Requirement::AllowAny => true,
        Requirement::Authenticated => authenticated,
        Requirement::Elevated => has_elevated_role(principal),
        Requirement::OwnerOnWrite => {
            action.is_safe() || resource.map_or(true, |r| is_owner(principal, r))
        }
        Requirement::AuthenticatedOwner => {
            authenticated && resource.map_or(true, |r| is_owner(principal, r))
        }
    };

    if allowed {
        return Decision::Allow;
    }
    if !authenticated {
        return Decision::Deny(Denial::NotAuthenticated);
    }

    let message = match requirement {
        Requirement::OwnerOnWrite => EDIT_RESTRICTED,
        _ => PERMISSION_DENIED,
    };
    Decision::Deny(Denial::Forbidden(message))
}

fn deny_unknown(principal: &Principal) -> Decision {
    if principal.is_authenticated() {
        Decision::Deny(Denial::Forbidden(PERMISSION_DENIED))
    } else {
        Decision::Deny(Denial::NotAuthenticated)
    }
}

fn enforce(
    decision: Decision,
    principal: &Principal,
    kind: ResourceKind,
    action: Action,
    level: &'static str,
) -> Result<()> {
    match decision {
        Decision::Allow => {
            AUTHZ_DECISIONS_TOTAL
                .with_label_values(&[kind.as_str(), action.as_str(), "allow"])
                .inc();
            Ok(())
        }
        Decision::Deny(denial) => {
            AUTHZ_DECISIONS_TOTAL
                .with_label_values(&[kind.as_str(), action.as_str(), "deny"])
                .inc();
            tracing::warn!(
                %principal,
                kind = kind.as_str(),
                action = action.as_str(),
                level,
                reason = denial.message(),
                "authorization denied"
            );

            Err(match denial {
                Denial::NotAuthenticated => AppError::Authentication(NOT_AUTHENTICATED.to_string()),
                Denial::Forbidden(message) => AppError::Authorization(message.to_string()),
            })
        }
    }
}
