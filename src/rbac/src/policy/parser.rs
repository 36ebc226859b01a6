//! Declaration parser
//!
//! Normalizes a raw JSON policy declaration into a [`PolicyTree`]. Reserved
//! keys are turned into [`PolicyNode`] variants here so that nothing
//! downstream has to tell directives from role, resource or action names.

use super::types::{DelegationScope, PolicyNode, ResourcePolicies, RolePolicies};
use super::PolicyTree;
use crate::error::{AuthzError, Result};
use serde_json::{Map, Value};

/// Top-level key holding the default policies
pub const DEFAULT_POLICIES: &str = "DEFAULT_POLICIES";

/// Role or resource key delegating to another role
pub const ACTS_AS: &str = "ACTS_AS";

/// Action key adopting another role's result at that coordinate
pub const INCLUDE_POLICIES: &str = "INCLUDE_POLICIES";

/// Resource key for the resource-wide wildcard; as a value, allows everything
pub const ALL_ACTIONS: &str = "ALL_ACTIONS";

/// Role key for the role-wide wildcard
pub const ALL_RESOURCES: &str = "ALL_RESOURCES";

/// Node value for an unconditional allow
pub const ALLOW: &str = "allow";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Action,
    Wildcard,
}

pub(crate) fn parse_table(value: &Value) -> Result<PolicyTree> {
    let table = value
        .as_object()
        .ok_or_else(|| invalid("policy table", "expected an object of roles"))?;

    let mut tree = PolicyTree::new();
    for (role, declaration) in table {
        let policies = parse_role(role, declaration)?;
        if role == DEFAULT_POLICIES {
            tree.defaults = Some(policies);
        } else {
            tree.roles.insert(role.clone(), policies);
        }
    }
    Ok(tree)
}

fn parse_role(role: &str, value: &Value) -> Result<RolePolicies> {
    if role.is_empty() {
        return Err(invalid("policy table", "role name cannot be empty"));
    }

    let Some(entries) = value.as_object() else {
        return Ok(RolePolicies::new().wildcard(parse_wildcard(value, role)?));
    };

    let mut policies = RolePolicies::new();
    policies.wildcard = parse_level_wildcard(entries, ALL_RESOURCES, DelegationScope::Role, role)?;

    for (resource_type, declaration) in entries {
        match resource_type.as_str() {
            ACTS_AS | ALL_RESOURCES => {}
            INCLUDE_POLICIES | ALL_ACTIONS | DEFAULT_POLICIES => {
                return Err(invalid(role, format!("'{}' is not valid at role level", resource_type)));
            }
            _ => {
                let context = format!("{}.{}", role, resource_type);
                let resource = parse_resource(&context, declaration)?;
                policies.resources.insert(resource_type.clone(), resource);
            }
        }
    }
    Ok(policies)
}

fn parse_resource(context: &str, value: &Value) -> Result<ResourcePolicies> {
    let Some(entries) = value.as_object() else {
        return Ok(ResourcePolicies::new().wildcard(parse_wildcard(value, context)?));
    };

    let mut policies = ResourcePolicies::new();
    policies.wildcard =
        parse_level_wildcard(entries, ALL_ACTIONS, DelegationScope::ResourceType, context)?;

    for (action, declaration) in entries {
        match action.as_str() {
            ACTS_AS | ALL_ACTIONS => {}
            INCLUDE_POLICIES | ALL_RESOURCES | DEFAULT_POLICIES => {
                return Err(invalid(context, format!("'{}' is not valid at resource level", action)));
            }
            _ => {
                let context = format!("{}.{}", context, action);
                let node = parse_node(declaration, Position::Action, &context)?;
                policies.actions.insert(action.clone(), node);
            }
        }
    }
    Ok(policies)
}

/// A level carries either a delegation or a wildcard, never both
fn parse_level_wildcard(
    entries: &Map<String, Value>,
    wildcard_key: &str,
    scope: DelegationScope,
    context: &str,
) -> Result<Option<PolicyNode>> {
    match (entries.get(ACTS_AS), entries.get(wildcard_key)) {
        (Some(_), Some(_)) => Err(invalid(
            context,
            format!("'{}' and '{}' cannot be combined", ACTS_AS, wildcard_key),
        )),
        (Some(target), None) => {
            let role = role_name(target, ACTS_AS, context)?;
            Ok(Some(PolicyNode::ActsAs { role, scope }))
        }
        (None, Some(value)) => Ok(Some(parse_wildcard(value, context)?)),
        (None, None) => Ok(None),
    }
}

fn parse_wildcard(value: &Value, context: &str) -> Result<PolicyNode> {
    parse_node(value, Position::Wildcard, context)
}

fn parse_node(value: &Value, position: Position, context: &str) -> Result<PolicyNode> {
    match value {
        Value::Bool(true) => Ok(PolicyNode::Allow),
        Value::Bool(false) => Ok(PolicyNode::Deny),
        Value::String(s) if s == ALLOW => Ok(PolicyNode::Allow),
        Value::String(s) if s == ALL_ACTIONS && position == Position::Wildcard => {
            Ok(PolicyNode::Allow)
        }
        Value::String(s) => Ok(PolicyNode::Checks(vec![check_name(s, context)?])),
        Value::Array(items) => {
            let names = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => check_name(s, context),
                    other => Err(invalid(context, format!("check names must be strings, got {}", other))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(PolicyNode::checks(names))
        }
        Value::Object(entries) if position == Position::Action => {
            match (entries.get(INCLUDE_POLICIES), entries.len()) {
                (Some(target), 1) => Ok(PolicyNode::Include(role_name(target, INCLUDE_POLICIES, context)?)),
                _ => Err(invalid(
                    context,
                    format!("action objects must contain only '{}'", INCLUDE_POLICIES),
                )),
            }
        }
        other => Err(invalid(context, format!("unsupported declaration {}", other))),
    }
}

fn role_name(value: &Value, key: &str, context: &str) -> Result<String> {
    match value.as_str() {
        Some(role) if !role.is_empty() && role != DEFAULT_POLICIES => Ok(role.to_string()),
        _ => Err(invalid(context, format!("'{}' must name a role", key))),
    }
}

fn check_name(name: &str, context: &str) -> Result<String> {
    if name.is_empty() {
        Err(invalid(context, "check names cannot be empty"))
    } else {
        Ok(name.to_string())
    }
}

fn invalid(context: &str, message: impl AsRef<str>) -> AuthzError {
    AuthzError::InvalidPolicy(format!("{}: {}", context, message.as_ref()))
}
