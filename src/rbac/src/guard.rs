//! Dynamic check layer
//!
//! A [`Guard`] is bound to one resource type and evaluates the named,
//! subject/object-dependent checks that a policy table defers to. The
//! resolver only consults it when a role resolves to a list of checks.
//!
//! # Example
//!
//! ```rust
//! use cretoai_rbac::guard::{Guard, PolicyGuard};
//! use cretoai_rbac::types::{Principal, Resource};
//!
//! let guard = PolicyGuard::new().with_policy("owner", |subject, object| {
//!     match (subject, object) {
//!         (Some(s), Some(o)) => o.attribute("owner") == Some(s.id.as_str()),
//!         _ => false,
//!     }
//! });
//!
//! let alice = Principal::new("user:alice");
//! let comment = Resource::new("comment:1").with_attribute("owner", "user:alice");
//! assert!(guard.check_policy("owner", Some(&alice), Some(&comment)).unwrap());
//! ```

use crate::error::{AuthzError, Result};
use crate::types::{Principal, Resource};
use std::collections::BTreeMap;
use std::fmt;

/// Evaluates named checks for one resource type
pub trait Guard: Send + Sync {
    /// Evaluate one named check
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::UnknownPolicy`] if the guard has no check called `name`.
    fn check_policy(
        &self,
        name: &str,
        subject: Option<&Principal>,
        object: Option<&Resource>,
    ) -> Result<bool>;

    /// Evaluate a check list. Every named check must pass (AND logic).
    ///
    /// Evaluation stops at the first failing check; an unknown name fails
    /// with [`AuthzError::UnknownPolicy`] when it is reached.
    fn check_policy_list(
        &self,
        names: &[String],
        subject: Option<&Principal>,
        object: Option<&Resource>,
    ) -> Result<bool> {
        for name in names {
            if !self.check_policy(name, subject, object)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Names of the checks this guard supports
    fn policies(&self) -> Vec<String>;

    /// Actions the guarded resource offers. Introspection only.
    fn actions(&self) -> Vec<String> {
        Vec::new()
    }
}

type CheckFn = dyn Fn(Option<&Principal>, Option<&Resource>) -> bool + Send + Sync;

/// Guard backed by named closures
///
/// An empty `PolicyGuard` provides no checks at all, which suits resource
/// types whose policies never depend on the subject or object.
#[derive(Default)]
pub struct PolicyGuard {
    checks: BTreeMap<String, Box<CheckFn>>,
    actions: Vec<String>,
}

impl PolicyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named check
    pub fn with_policy<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(Option<&Principal>, Option<&Resource>) -> bool + Send + Sync + 'static,
    {
        self.checks.insert(name.into(), Box::new(check));
        self
    }

    /// Advertise the actions of the guarded resource
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }
}

impl Guard for PolicyGuard {
    fn check_policy(
        &self,
        name: &str,
        subject: Option<&Principal>,
        object: Option<&Resource>,
    ) -> Result<bool> {
        let check = self
            .checks
            .get(name)
            .ok_or_else(|| AuthzError::UnknownPolicy(name.to_string()))?;
        Ok(check(subject, object))
    }

    fn policies(&self) -> Vec<String> {
        self.checks.keys().cloned().collect()
    }

    fn actions(&self) -> Vec<String> {
        self.actions.clone()
    }
}

impl fmt::Debug for PolicyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyGuard")
            .field("checks", &self.checks.keys().collect::<Vec<_>>())
            .field("actions", &self.actions)
            .finish()
    }
}
