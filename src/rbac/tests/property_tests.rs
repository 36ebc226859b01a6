//! Property tests over randomly generated acyclic role tables

mod common;

use common::*;
use cretoai_rbac::{Authorizer, PolicyTree, RoleAuthorizer};
use proptest::prelude::*;
use proptest::strategy::Union;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const ROLES: [&str; 4] = ["r0", "r1", "r2", "r3"];

/// Declaration at one coordinate. Inclusion only targets lower-indexed
/// roles, which keeps every generated table acyclic.
fn node_strategy(index: usize) -> BoxedStrategy<Option<Value>> {
    let mut options = vec![
        Just(None).boxed(),
        Just(Some(json!("allow"))).boxed(),
        Just(Some(json!([]))).boxed(),
    ];
    if index > 0 {
        options.push(
            (0..index)
                .prop_map(|target| Some(json!({ "INCLUDE_POLICIES": ROLES[target] })))
                .boxed(),
        );
    }
    Union::new(options).boxed()
}

fn role_strategy(index: usize) -> BoxedStrategy<Value> {
    let delegate = if index > 0 {
        proptest::option::of(0..index).boxed()
    } else {
        Just(None).boxed()
    };

    (
        prop::collection::vec(node_strategy(index), COORDINATES.len()),
        delegate,
    )
        .prop_map(|(nodes, delegate)| {
            let mut role = Map::new();
            if let Some(target) = delegate {
                role.insert("ACTS_AS".to_string(), json!(ROLES[target]));
            }
            for (&(action, resource_type), node) in COORDINATES.iter().zip(nodes) {
                if let Some(node) = node {
                    role.entry(resource_type.to_string())
                        .or_insert_with(|| json!({}))
                        .as_object_mut()
                        .unwrap()
                        .insert(action.to_string(), node);
                }
            }
            Value::Object(role)
        })
        .boxed()
}

fn table_strategy() -> impl Strategy<Value = Value> {
    (
        role_strategy(0),
        role_strategy(1),
        role_strategy(2),
        role_strategy(3),
        role_strategy(0),
    )
        .prop_map(|(r0, r1, r2, r3, defaults)| {
            json!({
                "r0": r0,
                "r1": r1,
                "r2": r2,
                "r3": r3,
                "DEFAULT_POLICIES": defaults
            })
        })
}

fn decisions(authorizer: &RoleAuthorizer, roles: &[&str]) -> Vec<bool> {
    let authorizer = authorizer.for_roles(roles.iter().copied());
    COORDINATES
        .iter()
        .map(|&(action, resource_type)| authorizer.can(action, resource_type).unwrap())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_multiple_roles_equal_or_of_single_roles(
        table in table_strategy(),
        roles in proptest::sample::subsequence(ROLES.to_vec(), 1..=ROLES.len()),
    ) {
        let authorizer = RoleAuthorizer::new(publishing_registry(), &table).unwrap();

        let combined = decisions(&authorizer, &roles);
        let expected: Vec<bool> = (0..COORDINATES.len())
            .map(|i| roles.iter().any(|role| decisions(&authorizer, &[*role])[i]))
            .collect();

        prop_assert_eq!(combined, expected);
    }

    #[test]
    fn test_upfront_merge_equals_append(
        table in table_strategy(),
        fragment in table_strategy(),
    ) {
        let registry = Arc::new(publishing_registry());

        let mut merged = PolicyTree::from_declaration(&table).unwrap();
        merged.merge(PolicyTree::from_declaration(&fragment).unwrap());
        let upfront = RoleAuthorizer::from_tree(Arc::clone(&registry), merged, Default::default()).unwrap();

        let tree = PolicyTree::from_declaration(&table).unwrap();
        let mut appended = RoleAuthorizer::from_tree(registry, tree, Default::default()).unwrap();
        appended.append_policies(&fragment).unwrap();

        prop_assert_eq!(upfront.policies(), appended.policies());
        for role in ROLES {
            prop_assert_eq!(decisions(&upfront, &[role]), decisions(&appended, &[role]));
        }
    }

    #[test]
    fn test_defaults_only_fill_unspecified_coordinates(table in table_strategy()) {
        let authorizer = RoleAuthorizer::new(publishing_registry(), &table).unwrap();
        let defaults = decisions(&authorizer, &["visitor"]);

        // r0 has no delegation, so its own declaration decides wherever it exists
        let own = &table["r0"];
        let r0 = decisions(&authorizer, &["r0"]);
        for (i, &(action, resource_type)) in COORDINATES.iter().enumerate() {
            match &own[resource_type][action] {
                Value::Null => prop_assert_eq!(r0[i], defaults[i]),
                Value::String(_) => prop_assert!(r0[i]),
                _ => prop_assert!(!r0[i]),
            }
        }
    }
}
