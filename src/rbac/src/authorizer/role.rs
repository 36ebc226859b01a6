//! Declarative role-policy authorizer

use super::{Authorizer, PermissionRequest};
use crate::config::AuthorizerConfig;
use crate::error::{AuthzError, Result};
use crate::policy::PolicyTree;
use crate::registry::Registry;
use crate::resolver::{PolicyResolver, Resolution};
use crate::types::{Decision, DecisionReason, Principal, Resource, RoleId};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Authorizer driven by a role policy table
///
/// The registry and the policy table are shared behind `Arc`, so deriving
/// an authorizer for another subject with [`RoleAuthorizer::for_roles`] or
/// [`RoleAuthorizer::for_principal`] is cheap. [`RoleAuthorizer::append_policies`]
/// swaps in a new table for this instance only.
#[derive(Debug, Clone)]
pub struct RoleAuthorizer {
    registry: Arc<Registry>,
    policies: Arc<PolicyTree>,
    roles: Vec<RoleId>,
    subject: Option<Principal>,
    config: AuthorizerConfig,
}

impl RoleAuthorizer {
    /// Build an authorizer from a raw declaration with the default configuration
    ///
    /// The authorizer starts with no roles; derive one per subject with
    /// [`RoleAuthorizer::for_roles`] or [`RoleAuthorizer::for_principal`].
    pub fn new(registry: Registry, declaration: &Value) -> Result<Self> {
        Self::from_tree(
            Arc::new(registry),
            PolicyTree::from_declaration(declaration)?,
            AuthorizerConfig::default(),
        )
    }

    /// Build an authorizer from a normalized table
    ///
    /// # Errors
    ///
    /// Fails if the table does not validate against `registry`. Named checks
    /// are only verified when [`AuthorizerConfig::validate_checks`] is set.
    pub fn from_tree(
        registry: Arc<Registry>,
        policies: PolicyTree,
        config: AuthorizerConfig,
    ) -> Result<Self> {
        policies.validate_with(&registry, config.validate_checks)?;

        info!(
            "Role authorizer ready: {} resource types, {} roles",
            registry.len(),
            policies.roles().count()
        );

        Ok(Self {
            registry,
            policies: Arc::new(policies),
            roles: Vec::new(),
            subject: None,
            config,
        })
    }

    /// Replace the configuration, re-validating the table under it
    pub fn with_config(mut self, config: AuthorizerConfig) -> Result<Self> {
        self.policies.validate_with(&self.registry, config.validate_checks)?;
        self.config = config;
        Ok(self)
    }

    /// Set the subject's roles, dropping duplicates
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RoleId>,
    {
        self.roles.clear();
        for role in roles {
            let role = role.into();
            if !self.roles.contains(&role) {
                self.roles.push(role);
            }
        }
        self
    }

    /// Set the default subject handed to guards
    pub fn with_subject(mut self, subject: Principal) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Authorizer for another role set, sharing registry and table
    pub fn for_roles<I, S>(&self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RoleId>,
    {
        let mut authorizer = self.clone();
        authorizer.subject = None;
        authorizer.with_roles(roles)
    }

    /// Authorizer for a principal: its roles, with the principal as subject
    pub fn for_principal(&self, principal: &Principal) -> Self {
        self.for_roles(principal.roles.iter().cloned())
            .with_subject(principal.clone())
    }

    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }

    pub fn policies(&self) -> &PolicyTree {
        &self.policies
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    /// Decision of the declarative pipeline for a validated request
    ///
    /// Each role is resolved independently and the results are OR-ed. A
    /// static allow from any role wins before any named check runs; check
    /// lists are then evaluated role by role until one passes.
    pub fn decide(&self, request: &PermissionRequest<'_>) -> Result<Decision> {
        if self.config.strict_roles {
            if let Some(role) = self.roles.iter().find(|role| !self.policies.contains_role(role)) {
                warn!("Subject role '{}' is not declared in the policy table", role);
                return Err(AuthzError::UnknownRole(role.clone()));
            }
        }

        let resolver = PolicyResolver::new(&self.policies);
        let mut pending = Vec::new();
        let mut matched = false;

        for role in &self.roles {
            match resolver.resolve(role, request.resource_type, request.action)? {
                Resolution::Allow => {
                    return Ok(Decision::allow(role.clone(), DecisionReason::PolicyAllow));
                }
                Resolution::Checks(names) => {
                    matched = true;
                    pending.push((role, names));
                }
                Resolution::Deny => matched = true,
                Resolution::Unmatched => {}
            }
        }

        let checks_required = !pending.is_empty();
        for (role, names) in pending {
            if request
                .guard
                .check_policy_list(names, request.subject, request.object)?
            {
                return Ok(Decision::allow(
                    role.clone(),
                    DecisionReason::ChecksPassed {
                        checks: names.to_vec(),
                    },
                ));
            }
        }

        let reason = if checks_required {
            DecisionReason::ChecksFailed
        } else if matched {
            DecisionReason::Denied
        } else {
            DecisionReason::NoMatchingPolicy
        };
        Ok(Decision::deny(reason))
    }

    /// Validate a request and explain the declarative decision
    pub fn explain(
        &self,
        action: &str,
        resource_type: &str,
        subject: Option<&Principal>,
        object: Option<&Resource>,
    ) -> Result<Decision> {
        let subject = subject.or(self.subject.as_ref());
        let request = PermissionRequest::new(&self.registry, action, resource_type, subject, object)?;
        self.decide(&request)
    }

    /// Verdict of the declarative pipeline
    ///
    /// Custom authorizers that override [`Authorizer::get_permission`] call
    /// this to fall back to the role policies.
    pub fn role_permission(&self, request: &PermissionRequest<'_>) -> Result<bool> {
        let decision = self.decide(request)?;

        if self.config.log_decisions {
            info!(
                "Decision for roles {:?}: {} on {} -> {} ({:?})",
                self.roles, request.action, request.resource_type, decision.allowed, decision.reason
            );
        } else {
            debug!(
                "Decision for roles {:?}: {} on {} -> {} ({:?})",
                self.roles, request.action, request.resource_type, decision.allowed, decision.reason
            );
        }

        Ok(decision.allowed)
    }

    /// Merge a policy fragment into this authorizer's table
    ///
    /// The fragment uses the declaration format of a full table. The merged
    /// table is validated as a whole; on error the current table stays in
    /// place. Other authorizers sharing the previous table are unaffected.
    pub fn append_policies(&mut self, fragment: &Value) -> Result<()> {
        self.append_tree(PolicyTree::from_declaration(fragment)?)
    }

    /// Merge an already normalized fragment
    pub fn append_tree(&mut self, fragment: PolicyTree) -> Result<()> {
        let appended_roles = fragment.roles().count();

        let mut merged = PolicyTree::clone(&self.policies);
        merged.merge(fragment);
        if let Err(e) = merged.validate_with(&self.registry, self.config.validate_checks) {
            warn!("Rejected policy append: {}", e);
            return Err(e);
        }

        self.policies = Arc::new(merged);
        info!("Appended policies for {} roles", appended_roles);
        Ok(())
    }
}

impl Authorizer for RoleAuthorizer {
    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn subject(&self) -> Option<&Principal> {
        self.subject.as_ref()
    }

    fn get_permission(&self, request: &PermissionRequest<'_>) -> Result<Option<bool>> {
        self.role_permission(request).map(Some)
    }
}
