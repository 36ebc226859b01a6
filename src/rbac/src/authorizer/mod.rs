//! Authorization entry points
//!
//! [`Authorizer`] validates a request against the [`Registry`] and asks its
//! `get_permission` hook for the verdict. [`RoleAuthorizer`] implements the
//! hook with the declarative role policy pipeline; custom authorizers can
//! implement it from scratch or wrap a `RoleAuthorizer` and delegate to
//! [`RoleAuthorizer::role_permission`].
//!
//! # Architecture
//!
//! ```text
//! can() → Registry (resource type, action) → get_permission hook
//!                                                 ↓
//!                    RoleAuthorizer: PolicyResolver per role → OR → Guard checks
//! ```
//!
//! # Example
//!
//! ```rust
//! use cretoai_rbac::{Authorizer, PolicyGuard, Registry, RoleAuthorizer};
//! use serde_json::json;
//!
//! # fn main() -> cretoai_rbac::Result<()> {
//! let mut registry = Registry::new();
//! registry.register_resource_type("comment", PolicyGuard::new());
//! registry.register_actions([("comment", ["read", "write"])])?;
//!
//! let authorizer = RoleAuthorizer::new(registry, &json!({
//!     "DEFAULT_POLICIES": { "comment": { "read": "allow" } },
//!     "editor": { "comment": "ALL_ACTIONS" }
//! }))?;
//!
//! let guest = authorizer.for_roles(["guest"]);
//! assert!(guest.can("read", "comment")?);
//! assert!(!guest.can("write", "comment")?);
//! assert!(authorizer.for_roles(["editor"]).can("write", "comment")?);
//! # Ok(())
//! # }
//! ```

mod role;
mod shared;

pub use role::RoleAuthorizer;
pub use shared::SharedAuthorizer;

use crate::error::{AuthzError, Result};
use crate::guard::Guard;
use crate::registry::Registry;
use crate::types::{Principal, Resource};
use tracing::{debug, warn};

/// Validated input of the permission hook
#[derive(Clone, Copy)]
pub struct PermissionRequest<'a> {
    pub action: &'a str,
    pub resource_type: &'a str,
    /// Guard bound to `resource_type`
    pub guard: &'a dyn Guard,
    pub subject: Option<&'a Principal>,
    pub object: Option<&'a Resource>,
}

impl<'a> PermissionRequest<'a> {
    /// Validate the resource type, then the action, and bind the guard
    pub fn new(
        registry: &'a Registry,
        action: &'a str,
        resource_type: &'a str,
        subject: Option<&'a Principal>,
        object: Option<&'a Resource>,
    ) -> Result<Self> {
        let guard = registry.lookup(resource_type)?;
        registry.validate_action(resource_type, action)?;

        Ok(Self {
            action,
            resource_type,
            guard: guard.as_ref(),
            subject,
            object,
        })
    }
}

/// Answers "may the subject perform this action on this resource type?"
pub trait Authorizer {
    /// Registry the requests are validated against
    fn registry(&self) -> &Registry;

    /// Subject used when a request does not name one
    fn subject(&self) -> Option<&Principal> {
        None
    }

    /// Decision hook
    ///
    /// Return `Some(allowed)` for a verdict. `None` means the hook produced
    /// no verdict, which [`Authorizer::can_with`] rejects with
    /// [`AuthzError::InvalidPermissionResult`] rather than guessing.
    fn get_permission(&self, request: &PermissionRequest<'_>) -> Result<Option<bool>>;

    /// Check an action with the default subject and no object
    fn can(&self, action: &str, resource_type: &str) -> Result<bool> {
        self.can_with(action, resource_type, None, None)
    }

    /// Check an action for a subject on a concrete object
    ///
    /// # Errors
    ///
    /// - [`AuthzError::UnknownResourceType`], reported before an unknown action
    /// - [`AuthzError::UnknownAction`]
    /// - [`AuthzError::InvalidPermissionResult`] if the hook returns no verdict
    /// - any error raised by the hook or the guard
    fn can_with(
        &self,
        action: &str,
        resource_type: &str,
        subject: Option<&Principal>,
        object: Option<&Resource>,
    ) -> Result<bool> {
        let subject = subject.or_else(|| self.subject());
        let request = PermissionRequest::new(self.registry(), action, resource_type, subject, object)?;

        match self.get_permission(&request)? {
            Some(allowed) => {
                debug!(
                    "Permission for {} on {}: {}",
                    action,
                    resource_type,
                    if allowed { "ALLOW" } else { "DENY" }
                );
                Ok(allowed)
            }
            None => {
                warn!("get_permission returned no verdict for {} on {}", action, resource_type);
                Err(AuthzError::InvalidPermissionResult {
                    resource_type: resource_type.to_string(),
                    action: action.to_string(),
                })
            }
        }
    }
}
