//! Role policy table
//!
//! The table maps each role to per-resource-type policies, plus a reserved
//! default-policies entry consulted when a role leaves a coordinate
//! unspecified. Tables are declared as JSON and normalized by the parser, or
//! built directly with the builder methods.
//!
//! # Declaration format
//!
//! ```text
//! {
//!   "DEFAULT_POLICIES": { "comment": { "read": "allow" } },
//!   "contributor":      { "post": { "write": "allow" } },
//!   "editor":           { "ACTS_AS": "contributor", "comment": "ALL_ACTIONS" },
//!   "comment_editor":   { "ACTS_AS": "editor", "post": { "write": [] } },
//!   "author":           { "post": { "edit": ["owner", "unlocked"] } },
//!   "reviewer":         { "post": { "write": { "INCLUDE_POLICIES": "contributor" } } }
//! }
//! ```
//!
//! | Value | Node |
//! |-------|------|
//! | `"allow"`, `true` | [`PolicyNode::Allow`] |
//! | `[]`, `false` | [`PolicyNode::Deny`] (force deny) |
//! | `"name"`, `["a", "b"]` | [`PolicyNode::Checks`] |
//! | `{"INCLUDE_POLICIES": role}` | [`PolicyNode::Include`] |
//! | `"ACTS_AS": role` | [`PolicyNode::ActsAs`] at role or resource level |
//! | `"ALL_ACTIONS"` as value, `ALL_ACTIONS` / `ALL_RESOURCES` as key | wildcard |

mod parser;
mod types;


pub use parser::{ACTS_AS, ALLOW, ALL_ACTIONS, ALL_RESOURCES, DEFAULT_POLICIES, INCLUDE_POLICIES};
pub use types::{DelegationScope, PolicyNode, ResourcePolicies, RolePolicies};

use crate::error::{AuthzError, Result};
use crate::registry::Registry;
use crate::resolver::{PolicyResolver, Resolution};
use crate::types::RoleId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Normalized role policy table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTree {
    #[serde(default)]
    pub(crate) roles: BTreeMap<RoleId, RolePolicies>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) defaults: Option<RolePolicies>,
}

impl PolicyTree {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw declaration
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidPolicy`] for malformed declarations. Names
    /// and references are checked later by [`PolicyTree::validate`].
    pub fn from_declaration(declaration: &Value) -> Result<Self> {
        parser::parse_table(declaration)
    }

    /// Parse a declaration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let declaration: Value = serde_json::from_str(json)?;
        Self::from_declaration(&declaration)
    }

    /// Add or replace the policies of a role
    pub fn with_role(mut self, role: impl Into<RoleId>, policies: RolePolicies) -> Self {
        self.roles.insert(role.into(), policies);
        self
    }

    /// Set the default policies
    pub fn with_defaults(mut self, policies: RolePolicies) -> Self {
        self.defaults = Some(policies);
        self
    }

    /// Policies declared for a role
    pub fn role(&self, role: &str) -> Option<&RolePolicies> {
        self.roles.get(role)
    }

    pub fn defaults(&self) -> Option<&RolePolicies> {
        self.defaults.as_ref()
    }

    /// Declared role names, sorted
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Deep-merge another table into this one
    ///
    /// Merging is per coordinate: every wildcard, delegation or action node
    /// that `fragment` declares replaces the one here, and everything it
    /// leaves out is untouched.
    pub fn merge(&mut self, fragment: PolicyTree) {
        for (role, policies) in fragment.roles {
            self.roles.entry(role).or_default().merge(policies);
        }
        if let Some(defaults) = fragment.defaults {
            self.defaults.get_or_insert_with(RolePolicies::default).merge(defaults);
        }
    }

    /// Normalize a raw fragment and merge it
    pub fn merge_declaration(&mut self, fragment: &Value) -> Result<()> {
        let fragment = Self::from_declaration(fragment)?;
        self.merge(fragment);
        Ok(())
    }

    /// Validate the table against a registry
    ///
    /// Rejects unregistered resource types and actions, references to
    /// undeclared roles, and delegation cycles reachable from any registered
    /// coordinate. Every check list a role or the defaults resolve to at a
    /// coordinate must be provided by that resource type's guard.
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        self.validate_with(registry, true)
    }

    pub(crate) fn validate_with(&self, registry: &Registry, check_names: bool) -> Result<()> {
        for (name, policies) in self.entries() {
            self.validate_role(name, policies, registry)?;
        }

        // Exhaustive resolution of every coordinate surfaces cycles that
        // only exist for particular resource types or actions. Check lists
        // are verified where they resolve, so a wildcard overridden for a
        // resource type never meets that type's guard.
        let resolver = PolicyResolver::new(self);
        for (resource_type, action) in registry.coordinates() {
            let mut resolutions = vec![resolver.resolve_defaults(resource_type, action)?];
            for role in self.roles() {
                resolutions.push(resolver.resolve(role, resource_type, action)?);
            }

            if check_names {
                let known = registry.lookup(resource_type)?.policies();
                for resolution in &resolutions {
                    if let Resolution::Checks(names) = resolution {
                        Self::validate_checks(names, &known, resource_type)?;
                    }
                }
            }
        }

        debug!(
            "Validated policy table: {} roles, defaults={}",
            self.roles.len(),
            self.defaults.is_some()
        );
        Ok(())
    }

    fn validate_role(&self, name: &str, policies: &RolePolicies, registry: &Registry) -> Result<()> {
        if let Some(node) = &policies.wildcard {
            self.validate_reference(name, node)?;
        }

        for (resource_type, resource) in &policies.resources {
            registry.lookup(resource_type)?;
            for action in resource.actions.keys() {
                registry.validate_action(resource_type, action)?;
            }
            for node in resource.nodes() {
                self.validate_reference(name, node)?;
            }
        }
        Ok(())
    }

    fn validate_reference(&self, name: &str, node: &PolicyNode) -> Result<()> {
        match node.referenced_role() {
            Some(target) if !self.contains_role(target) => {
                warn!("Role '{}' references undeclared role '{}'", name, target);
                Err(AuthzError::UnknownRole(target.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn validate_checks(names: &[String], known: &[String], resource_type: &str) -> Result<()> {
        match names.iter().find(|name| !known.contains(name)) {
            Some(unknown) => Err(AuthzError::UnknownPolicy(format!(
                "{} (resource type '{}')",
                unknown, resource_type
            ))),
            None => Ok(()),
        }
    }

    /// Declared roles followed by the default policies
    fn entries(&self) -> impl Iterator<Item = (&str, &RolePolicies)> {
        self.roles
            .iter()
            .map(|(name, policies)| (name.as_str(), policies))
            .chain(self.defaults.iter().map(|policies| (DEFAULT_POLICIES, policies)))
    }
}
