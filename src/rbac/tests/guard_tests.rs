//! Named checks evaluated by guards through the role authorizer

mod common;

use common::init_tracing;
use cretoai_rbac::{
    Authorizer, AuthzError, Guard, PolicyGuard, Principal, Registry, Resource, Result,
    RoleAuthorizer,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn is_owner(subject: Option<&Principal>, object: Option<&Resource>) -> bool {
    match (subject, object) {
        (Some(subject), Some(object)) => object.attribute("owner") == Some(subject.id.as_str()),
        _ => false,
    }
}

fn is_unlocked(_subject: Option<&Principal>, object: Option<&Resource>) -> bool {
    object.map_or(false, |object| object.attribute("locked") != Some("true"))
}

fn same_department(subject: Option<&Principal>, object: Option<&Resource>) -> bool {
    match (subject, object) {
        (Some(subject), Some(object)) => {
            subject.attribute("department").is_some()
                && subject.attribute("department") == object.attribute("department")
        }
        _ => false,
    }
}

fn document_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_resource_type(
        "document",
        PolicyGuard::new()
            .with_policy("owner", is_owner)
            .with_policy("unlocked", is_unlocked)
            .with_policy("same_department", same_department)
            .with_actions(["read", "edit", "delete"]),
    );
    registry
        .register_actions([("document", ["read", "edit", "delete"])])
        .unwrap();
    registry
}

fn document_authorizer() -> RoleAuthorizer {
    RoleAuthorizer::new(
        document_registry(),
        &json!({
            "DEFAULT_POLICIES": { "document": { "read": "same_department" } },
            "author": {
                "document": {
                    "edit": ["owner", "unlocked"],
                    "delete": "owner"
                }
            },
            "auditor": { "document": { "read": "allow" } }
        }),
    )
    .unwrap()
}

// ============================================================================
// CHECK EVALUATION
// ============================================================================

#[test]
fn test_check_list_requires_every_check() {
    init_tracing();
    let alice = Principal::new("user:alice").with_role("author");
    let authorizer = document_authorizer().for_principal(&alice);

    let own = Resource::new("document:1").with_attribute("owner", "user:alice");
    let locked = own.clone().with_attribute("locked", "true");
    let foreign = Resource::new("document:2").with_attribute("owner", "user:bob");

    assert!(authorizer.can_with("edit", "document", None, Some(&own)).unwrap());
    assert!(!authorizer.can_with("edit", "document", None, Some(&locked)).unwrap());
    assert!(!authorizer.can_with("edit", "document", None, Some(&foreign)).unwrap());

    assert!(authorizer.can_with("delete", "document", None, Some(&locked)).unwrap());
}

#[test]
fn test_checks_without_object_fail() {
    let alice = Principal::new("user:alice").with_role("author");
    let authorizer = document_authorizer().for_principal(&alice);
    assert!(!authorizer.can("delete", "document").unwrap());
}

#[test]
fn test_explicit_subject_overrides_default() {
    let alice = Principal::new("user:alice").with_role("author");
    let bob = Principal::new("user:bob").with_role("author");
    let authorizer = document_authorizer().for_principal(&alice);

    let bobs = Resource::new("document:2").with_attribute("owner", "user:bob");
    assert!(!authorizer.can_with("delete", "document", None, Some(&bobs)).unwrap());
    assert!(authorizer.can_with("delete", "document", Some(&bob), Some(&bobs)).unwrap());
}

#[test]
fn test_default_checks_apply_to_roles() {
    let dave = Principal::new("user:dave")
        .with_role("author")
        .with_attribute("department", "legal");
    let authorizer = document_authorizer().for_principal(&dave);

    let legal = Resource::new("document:3").with_attribute("department", "legal");
    let finance = Resource::new("document:4").with_attribute("department", "finance");

    assert!(authorizer.can_with("read", "document", None, Some(&legal)).unwrap());
    assert!(!authorizer.can_with("read", "document", None, Some(&finance)).unwrap());
}

#[test]
fn test_static_allow_skips_checks() {
    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Guard for Counting {
        fn check_policy(&self, _: &str, _: Option<&Principal>, _: Option<&Resource>) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }

        fn policies(&self) -> Vec<String> {
            vec!["expensive".to_string()]
        }
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = Registry::new();
    registry.register_resource_type("report", Counting { calls: Arc::clone(&calls) });
    registry.register_actions([("report", ["view"])]).unwrap();

    let base = RoleAuthorizer::new(
        registry,
        &json!({
            "analyst": { "report": { "view": "expensive" } },
            "manager": { "report": "ALL_ACTIONS" }
        }),
    )
    .unwrap();

    assert!(base.for_roles(["analyst", "manager"]).can("view", "report").unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert!(!base.for_roles(["analyst"]).can("view", "report").unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// UNKNOWN CHECKS
// ============================================================================

#[test]
fn test_unknown_check_rejected_at_construction() {
    let result = RoleAuthorizer::new(
        document_registry(),
        &json!({ "author": { "document": { "edit": ["owner", "reviewer"] } } }),
    );
    assert!(matches!(result, Err(AuthzError::UnknownPolicy(ref name)) if name.contains("reviewer")));
}

#[test]
fn test_role_wide_checks_need_every_guard() {
    let mut registry = document_registry();
    registry.register_resource_type("folder", PolicyGuard::new());
    registry.register_actions([("folder", ["open"])]).unwrap();

    let result = RoleAuthorizer::new(registry, &json!({ "author": { "ALL_RESOURCES": "owner" } }));
    assert!(matches!(result, Err(AuthzError::UnknownPolicy(_))));
}

#[test]
fn test_role_wide_checks_skip_overridden_resource_types() {
    let mut registry = document_registry();
    registry.register_resource_type("folder", PolicyGuard::new());
    registry.register_actions([("folder", ["open"])]).unwrap();

    let alice = Principal::new("user:alice").with_role("author");
    let authorizer = RoleAuthorizer::new(
        registry,
        &json!({ "author": { "ALL_RESOURCES": "owner", "folder": "ALL_ACTIONS" } }),
    )
    .unwrap()
    .for_principal(&alice);

    let own = Resource::new("document:1").with_attribute("owner", "user:alice");
    assert!(authorizer.can("open", "folder").unwrap());
    assert!(authorizer.can_with("edit", "document", None, Some(&own)).unwrap());
    assert!(!authorizer.can("edit", "document").unwrap());
}

#[test]
fn test_policy_guard_reports_unknown_check() {
    let guard = PolicyGuard::new().with_policy("owner", is_owner);
    let alice = Principal::new("user:alice");
    let own = Resource::new("document:1").with_attribute("owner", "user:alice");
    assert!(matches!(
        guard.check_policy_list(&["owner".to_string(), "missing".to_string()], Some(&alice), Some(&own)),
        Err(AuthzError::UnknownPolicy(ref name)) if name == "missing"
    ));
    assert_eq!(guard.policies(), vec!["owner".to_string()]);
}
