//! Authorizer configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Role authorizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizerConfig {
    /// Reject subject roles that have no entry in the policy table instead
    /// of resolving them through the default policies
    pub strict_roles: bool,

    /// Verify at construction that every named check is provided by the
    /// guard of its resource type
    pub validate_checks: bool,

    /// Emit every final decision at info level
    pub log_decisions: bool,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            strict_roles: false,
            validate_checks: true,
            log_decisions: false,
        }
    }
}

impl AuthorizerConfig {
    /// Load a configuration from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
