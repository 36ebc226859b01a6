//! Normalized policy node and tree types

use crate::types::{ActionName, ResourceType, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reach of an `ActsAs` delegation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationScope {
    /// Substitute the whole referenced role
    Role,
    /// Substitute the referenced role for one resource type only
    ResourceType,
}

/// One declaration unit at a (role, resource type, action) coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PolicyNode {
    /// Unconditional allow
    Allow,

    /// Explicit empty declaration. Authoritative: overrides delegation and defaults.
    Deny,

    /// Resolve the same coordinate against another role's policies
    ActsAs { role: RoleId, scope: DelegationScope },

    /// Adopt another role's full result at this coordinate only
    Include(RoleId),

    /// Defer to named guard checks, all of which must pass. Never empty.
    Checks(Vec<String>),
}

impl PolicyNode {
    /// Role referenced by a delegation or inclusion
    pub fn referenced_role(&self) -> Option<&str> {
        match self {
            Self::ActsAs { role, .. } | Self::Include(role) => Some(role.as_str()),
            _ => None,
        }
    }

    /// Check list for a set of names; an empty list is a force deny
    pub fn checks<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            Self::Deny
        } else {
            Self::Checks(names)
        }
    }
}

/// Policies of one role for one resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePolicies {
    /// Applies to every action without its own node: a resource-wide
    /// wildcard or a resource-scoped `ActsAs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) wildcard: Option<PolicyNode>,

    #[serde(default)]
    pub(crate) actions: BTreeMap<ActionName, PolicyNode>,
}

impl ResourcePolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow every action on the resource type
    pub fn all_actions() -> Self {
        Self::new().wildcard(PolicyNode::Allow)
    }

    /// Set the resource-wide wildcard node
    pub fn wildcard(mut self, node: PolicyNode) -> Self {
        self.wildcard = Some(node);
        self
    }

    /// Delegate this resource type to another role
    pub fn acts_as(self, role: impl Into<RoleId>) -> Self {
        self.wildcard(PolicyNode::ActsAs {
            role: role.into(),
            scope: DelegationScope::ResourceType,
        })
    }

    /// Set the node of one action
    pub fn action(mut self, action: impl Into<ActionName>, node: PolicyNode) -> Self {
        self.actions.insert(action.into(), node);
        self
    }

    /// Most specific node for `action`
    pub(crate) fn lookup(&self, action: &str) -> Option<&PolicyNode> {
        self.actions.get(action).or(self.wildcard.as_ref())
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = &PolicyNode> {
        self.wildcard.iter().chain(self.actions.values())
    }

    /// Per-coordinate merge: every slot `other` declares replaces ours
    pub(crate) fn merge(&mut self, other: ResourcePolicies) {
        if other.wildcard.is_some() {
            self.wildcard = other.wildcard;
        }
        self.actions.extend(other.actions);
    }
}

/// Policies of one role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePolicies {
    /// Applies at every coordinate the resource entries leave open: a
    /// role-wide wildcard or a whole-role `ActsAs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) wildcard: Option<PolicyNode>,

    #[serde(default)]
    pub(crate) resources: BTreeMap<ResourceType, ResourcePolicies>,
}

impl RolePolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow everything
    pub fn all_actions() -> Self {
        Self::new().wildcard(PolicyNode::Allow)
    }

    /// Set the role-wide wildcard node
    pub fn wildcard(mut self, node: PolicyNode) -> Self {
        self.wildcard = Some(node);
        self
    }

    /// Delegate the whole role to another role
    pub fn acts_as(self, role: impl Into<RoleId>) -> Self {
        self.wildcard(PolicyNode::ActsAs {
            role: role.into(),
            scope: DelegationScope::Role,
        })
    }

    /// Set the policies for one resource type
    pub fn resource(mut self, resource_type: impl Into<ResourceType>, policies: ResourcePolicies) -> Self {
        self.resources.insert(resource_type.into(), policies);
        self
    }

    /// Most specific node for a coordinate
    ///
    /// Action node, then resource wildcard, then role wildcard.
    pub(crate) fn lookup(&self, resource_type: &str, action: &str) -> Option<&PolicyNode> {
        self.resources
            .get(resource_type)
            .and_then(|resource| resource.lookup(action))
            .or(self.wildcard.as_ref())
    }

    pub(crate) fn merge(&mut self, other: RolePolicies) {
        if other.wildcard.is_some() {
            self.wildcard = other.wildcard;
        }
        for (resource_type, policies) in other.resources {
            self.resources.entry(resource_type).or_default().merge(policies);
        }
    }
}
