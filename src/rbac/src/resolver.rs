//! Policy resolution
//!
//! Resolves one (role, resource type, action) coordinate to a terminal
//! [`Resolution`] by walking the [`PolicyTree`]:
//!
//! 1. The action node beats the resource wildcard, which beats the role wildcard.
//! 2. `Deny` is terminal and overrides any delegation or default.
//! 3. `ActsAs` restarts the lookup against the referenced role's own policies.
//! 4. `Include` adopts the referenced role's full result at this coordinate.
//! 5. Unspecified coordinates fall back once to the default policies.
//!
//! The resolver keeps the roles on the current path; revisiting one is a
//! [`AuthzError::CyclicDelegation`].

use crate::error::{AuthzError, Result};
use crate::policy::{PolicyNode, PolicyTree, RolePolicies, DEFAULT_POLICIES};
use std::iter;
use tracing::trace;

/// Terminal result for one role at one coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Unconditional allow
    Allow,
    /// Explicit deny
    Deny,
    /// Allowed if every named check passes
    Checks(&'a [String]),
    /// Nothing matched, not even the default policies
    Unmatched,
}

impl Resolution<'_> {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Coordinate being resolved
#[derive(Clone, Copy)]
struct Query<'q> {
    resource_type: &'q str,
    action: &'q str,
    /// Cleared inside the default policies so that defaults never chain
    use_defaults: bool,
}

/// Stateless resolver over a borrowed policy table
#[derive(Debug, Clone, Copy)]
pub struct PolicyResolver<'a> {
    tree: &'a PolicyTree,
}

impl<'a> PolicyResolver<'a> {
    pub fn new(tree: &'a PolicyTree) -> Self {
        Self { tree }
    }

    /// Resolve a role at a coordinate, falling back to the default policies
    ///
    /// Roles without an entry in the table resolve through the defaults only.
    pub fn resolve(&self, role: &str, resource_type: &str, action: &str) -> Result<Resolution<'a>> {
        let query = Query {
            resource_type,
            action,
            use_defaults: true,
        };
        let mut path = Vec::new();
        self.resolve_with_defaults(role, query, &mut path)
    }

    /// Resolve the default policies alone at a coordinate
    pub fn resolve_defaults(&self, resource_type: &str, action: &str) -> Result<Resolution<'a>> {
        let Some(defaults) = self.tree.defaults() else {
            return Ok(Resolution::Unmatched);
        };

        let query = Query {
            resource_type,
            action,
            use_defaults: false,
        };
        let mut path = Vec::new();
        Ok(self
            .resolve_entry(DEFAULT_POLICIES, defaults, query, &mut path)?
            .unwrap_or(Resolution::Unmatched))
    }

    fn resolve_with_defaults<'r>(
        &self,
        role: &'r str,
        query: Query<'_>,
        path: &mut Vec<&'r str>,
    ) -> Result<Resolution<'a>>
    where
        'a: 'r,
    {
        if let Some(resolution) = self.resolve_role(role, query, path)? {
            return Ok(resolution);
        }

        if query.use_defaults {
            if let Some(defaults) = self.tree.defaults() {
                trace!(
                    "Role '{}' unspecified at {}.{}, trying defaults",
                    role, query.resource_type, query.action
                );
                let query = Query {
                    use_defaults: false,
                    ..query
                };
                if let Some(resolution) = self.resolve_entry(DEFAULT_POLICIES, defaults, query, path)? {
                    return Ok(resolution);
                }
            }
        }

        Ok(Resolution::Unmatched)
    }

    /// Resolve against a role's own policies; `None` when it states nothing here
    fn resolve_role<'r>(
        &self,
        role: &'r str,
        query: Query<'_>,
        path: &mut Vec<&'r str>,
    ) -> Result<Option<Resolution<'a>>>
    where
        'a: 'r,
    {
        match self.tree.role(role) {
            Some(policies) => self.resolve_entry(role, policies, query, path),
            None => Ok(None),
        }
    }

    fn resolve_entry<'r>(
        &self,
        name: &'r str,
        policies: &'a RolePolicies,
        query: Query<'_>,
        path: &mut Vec<&'r str>,
    ) -> Result<Option<Resolution<'a>>>
    where
        'a: 'r,
    {
        if let Some(start) = path.iter().position(|visited| *visited == name) {
            let cycle: Vec<&str> = path[start..].iter().copied().chain(iter::once(name)).collect();
            return Err(AuthzError::CyclicDelegation(cycle.join(" -> ")));
        }

        let Some(node) = policies.lookup(query.resource_type, query.action) else {
            return Ok(None);
        };

        path.push(name);
        let resolution = self.apply(node, query, path);
        path.pop();
        resolution
    }

    fn apply<'r>(
        &self,
        node: &'a PolicyNode,
        query: Query<'_>,
        path: &mut Vec<&'r str>,
    ) -> Result<Option<Resolution<'a>>>
    where
        'a: 'r,
    {
        match node {
            PolicyNode::Allow => Ok(Some(Resolution::Allow)),
            PolicyNode::Deny => Ok(Some(Resolution::Deny)),
            PolicyNode::Checks(names) => Ok(Some(Resolution::Checks(names))),
            PolicyNode::ActsAs { role, scope } => {
                trace!(
                    "Acting as '{}' ({:?}) at {}.{}",
                    role, scope, query.resource_type, query.action
                );
                self.resolve_role(role, query, path)
            }
            PolicyNode::Include(role) => {
                trace!(
                    "Including '{}' at {}.{}",
                    role, query.resource_type, query.action
                );
                let included = match self.resolve_with_defaults(role, query, path)? {
                    Resolution::Unmatched => Resolution::Deny,
                    resolution => resolution,
                };
                Ok(Some(included))
            }
        }
    }
}
