//! Core authorization types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role identifier
pub type RoleId = String;

/// Resource type name (e.g., "comment", "post")
pub type ResourceType = String;

/// Action name, unique within its resource type
pub type ActionName = String;

/// Subject of an authorization check (user, service account, agent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier (e.g., "user:alice@example.com")
    pub id: String,

    /// Roles carried by the principal. Order is not significant.
    #[serde(default)]
    pub roles: Vec<RoleId>,

    /// Additional attributes (e.g., department)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Principal {
    /// Create a new principal from an ID string
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Grant a role to the principal
    pub fn with_role(mut self, role: impl Into<RoleId>) -> Self {
        let role = role.into();
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Add an attribute to the principal
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Concrete object being accessed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier (e.g., "comment:42")
    pub id: String,

    /// Additional attributes (e.g., owner, locked)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Resource {
    /// Create a new resource from an ID string
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute to the resource
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Explained result of the declarative pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Role that granted access, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleId>,

    /// Reason for the decision
    pub reason: DecisionReason,
}

impl Decision {
    /// Allow decision granted by `role`
    pub fn allow(role: impl Into<RoleId>, reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            role: Some(role.into()),
            reason,
        }
    }

    /// Deny decision
    pub fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            role: None,
            reason,
        }
    }
}

/// Reason for an authorization decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionReason {
    /// A role resolved to an unconditional allow
    PolicyAllow,

    /// A role resolved to named checks and all of them passed
    ChecksPassed { checks: Vec<String> },

    /// Named checks were required and none of the check lists passed
    ChecksFailed,

    /// Every role resolved to an explicit deny or to nothing
    Denied,

    /// No roles matched anything, even in the default policies
    NoMatchingPolicy,
}
