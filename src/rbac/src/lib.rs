//! # CretoAI Role Policy Authorization
//!
//! Declarative role-based authorization with delegation, inclusion and
//! dynamic guards.
//!
//! ## Features
//!
//! - **Registry** binding each resource type to a guard and its declared actions
//! - **Policy table** declared as JSON: allow, force deny, named checks, wildcards
//! - **Delegation** (`ACTS_AS`) and **inclusion** (`INCLUDE_POLICIES`) between roles
//! - **Default policies** applied to coordinates a role leaves unspecified
//! - **Cycle detection** with the full delegation path in the error
//! - **Runtime extension** of the table with validated policy fragments
//!
//! ## Example
//!
//! ```rust
//! use cretoai_rbac::{Authorizer, PolicyGuard, Principal, Registry, Resource, RoleAuthorizer};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = Registry::new();
//!     registry.register_resource_type(
//!         "post",
//!         PolicyGuard::new().with_policy("owner", |subject, object| match (subject, object) {
//!             (Some(s), Some(o)) => o.attribute("owner") == Some(s.id.as_str()),
//!             _ => false,
//!         }),
//!     );
//!     registry.register_actions([("post", ["read", "write"])])?;
//!
//!     let authorizer = RoleAuthorizer::new(registry, &json!({
//!         "DEFAULT_POLICIES": { "post": { "read": "allow" } },
//!         "author": { "post": { "write": "owner" } }
//!     }))?;
//!
//!     let alice = Principal::new("user:alice").with_role("author");
//!     let post = Resource::new("post:1").with_attribute("owner", "user:alice");
//!
//!     let authorizer = authorizer.for_principal(&alice);
//!     assert!(authorizer.can("read", "post")?);
//!     assert!(authorizer.can_with("write", "post", None, Some(&post))?);
//!     assert!(!authorizer.can("write", "post")?);
//!
//!     Ok(())
//! }
//! ```

pub mod authorizer;
pub mod config;
pub mod error;
pub mod guard;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use authorizer::{Authorizer, PermissionRequest, RoleAuthorizer, SharedAuthorizer};
pub use config::AuthorizerConfig;
pub use error::{AuthzError, Result};
pub use guard::{Guard, PolicyGuard};
pub use policy::{DelegationScope, PolicyNode, PolicyTree, ResourcePolicies, RolePolicies};
pub use registry::Registry;
pub use resolver::{PolicyResolver, Resolution};
pub use types::{ActionName, Decision, DecisionReason, Principal, Resource, ResourceType, RoleId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
