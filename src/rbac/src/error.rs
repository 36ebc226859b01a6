//! Error types for the authorization engine

use thiserror::Error;

/// Authorization engine errors
///
/// Every variant signals a programming or configuration defect in the
/// embedding application. None of them are transient.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Resource type was never registered
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// Action is not declared for the resource type
    #[error("Unknown action '{action}' for resource type '{resource_type}'")]
    UnknownAction {
        resource_type: String,
        action: String,
    },

    /// Guard was asked for a named check it does not provide
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),

    /// Delegation target (or strict-mode subject role) is not in the policy table
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Delegation chain revisits a role already on the resolution path
    #[error("Cyclic delegation: {0}")]
    CyclicDelegation(String),

    /// Malformed policy declaration
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Permission hook returned no verdict
    #[error("Authorizer returned invalid getPermission result for action '{action}' on '{resource_type}'")]
    InvalidPermissionResult {
        resource_type: String,
        action: String,
    },

    /// Declaration or configuration could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
