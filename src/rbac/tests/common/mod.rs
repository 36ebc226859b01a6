//! Common fixtures shared across the integration tests

#![allow(dead_code)]

use cretoai_rbac::{Authorizer, Guard, PolicyGuard, Registry, RoleAuthorizer};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber; honours `RUST_LOG`, defaults to `warn`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Guard without named checks
pub fn open_guard() -> Arc<dyn Guard> {
    Arc::new(PolicyGuard::new())
}

/// Publishing registry: no dynamic checks on any resource type
pub fn publishing_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_resource_types([
        ("comment", open_guard()),
        ("post", open_guard()),
        ("image", open_guard()),
        ("system", open_guard()),
    ]);
    registry
        .register_actions([
            ("comment", vec!["read", "write"]),
            ("post", vec!["read", "write"]),
            ("image", vec!["upload"]),
            ("system", vec!["reset"]),
        ])
        .expect("fixture actions register");
    registry
}

/// Publishing role table
///
/// - guest: defaults only
/// - editor: acts as contributor, plus every comment action
/// - comment_editor: acts as editor, force-denies post writes
pub fn publishing_policies() -> Value {
    json!({
        "DEFAULT_POLICIES": {
            "comment": { "read": "allow" },
            "post": { "read": "allow" }
        },
        "guest": {},
        "contributor": {
            "post": { "write": "allow" },
            "image": { "upload": "allow" }
        },
        "editor": {
            "ACTS_AS": "contributor",
            "comment": "ALL_ACTIONS"
        },
        "comment_editor": {
            "ACTS_AS": "editor",
            "post": { "write": [] }
        },
        "image_supplier": {
            "image": { "upload": "allow" }
        },
        "comment_supplier": {
            "comment": { "write": "allow" }
        }
    })
}

pub fn publishing_authorizer() -> RoleAuthorizer {
    RoleAuthorizer::new(publishing_registry(), &publishing_policies()).expect("fixture table validates")
}

/// Every registered coordinate of the publishing registry
pub const COORDINATES: [(&str, &str); 6] = [
    ("read", "comment"),
    ("read", "post"),
    ("write", "comment"),
    ("write", "post"),
    ("upload", "image"),
    ("reset", "system"),
];

/// Assert a decision table of `(expected, action, resource type)` rows
pub fn assert_decisions<A: Authorizer>(authorizer: &A, expected: &[(bool, &str, &str)]) {
    for &(allowed, action, resource_type) in expected {
        assert_eq!(
            authorizer.can(action, resource_type).unwrap(),
            allowed,
            "can({:?}, {:?})",
            action,
            resource_type
        );
    }
}
