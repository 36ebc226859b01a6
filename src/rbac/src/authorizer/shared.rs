//! Thread-safe handle around a role authorizer

use super::{Authorizer, RoleAuthorizer};
use crate::error::Result;
use crate::types::{Decision, Principal, Resource};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// Cloneable handle for concurrent checks and appends
///
/// Checks take a read lock and run in parallel. An append takes the write
/// lock, so every check observes either the whole fragment or none of it.
#[derive(Debug, Clone)]
pub struct SharedAuthorizer {
    inner: Arc<RwLock<RoleAuthorizer>>,
}

impl SharedAuthorizer {
    pub fn new(authorizer: RoleAuthorizer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(authorizer)),
        }
    }

    pub fn can(&self, action: &str, resource_type: &str) -> Result<bool> {
        self.inner.read().can(action, resource_type)
    }

    pub fn can_with(
        &self,
        action: &str,
        resource_type: &str,
        subject: Option<&Principal>,
        object: Option<&Resource>,
    ) -> Result<bool> {
        self.inner.read().can_with(action, resource_type, subject, object)
    }

    pub fn explain(
        &self,
        action: &str,
        resource_type: &str,
        subject: Option<&Principal>,
        object: Option<&Resource>,
    ) -> Result<Decision> {
        self.inner.read().explain(action, resource_type, subject, object)
    }

    /// Merge a policy fragment; visible to every clone of this handle
    pub fn append_policies(&self, fragment: &Value) -> Result<()> {
        self.inner.write().append_policies(fragment)
    }

    /// Copy of the current authorizer, detached from later appends
    pub fn snapshot(&self) -> RoleAuthorizer {
        self.inner.read().clone()
    }
}

impl From<RoleAuthorizer> for SharedAuthorizer {
    fn from(authorizer: RoleAuthorizer) -> Self {
        Self::new(authorizer)
    }
}
