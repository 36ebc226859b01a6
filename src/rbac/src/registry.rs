//! Resource type registry
//!
//! Holds, per resource type, the closed set of allowed actions and the
//! [`Guard`] bound to it. Guards are concrete values chosen at registration
//! time; nothing is looked up by type name later.

use crate::error::{AuthzError, Result};
use crate::guard::Guard;
use crate::types::{ActionName, ResourceType};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

struct Registration {
    guard: Arc<dyn Guard>,
    actions: BTreeSet<ActionName>,
}

/// Registered resource types with their guards and actions
#[derive(Default)]
pub struct Registry {
    resources: BTreeMap<ResourceType, Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a guard to a resource type
    ///
    /// Re-registering a resource type replaces its guard and keeps the
    /// actions already declared for it.
    pub fn register_resource_type<G>(&mut self, resource_type: impl Into<ResourceType>, guard: G)
    where
        G: Guard + 'static,
    {
        self.bind(resource_type.into(), Arc::new(guard));
    }

    /// Bind guards to several resource types at once
    pub fn register_resource_types<I, K>(&mut self, guards: I)
    where
        I: IntoIterator<Item = (K, Arc<dyn Guard>)>,
        K: Into<ResourceType>,
    {
        for (resource_type, guard) in guards {
            self.bind(resource_type.into(), guard);
        }
    }

    fn bind(&mut self, resource_type: ResourceType, guard: Arc<dyn Guard>) {
        match self.resources.get_mut(&resource_type) {
            Some(registration) => registration.guard = guard,
            None => {
                self.resources.insert(
                    resource_type,
                    Registration {
                        guard,
                        actions: BTreeSet::new(),
                    },
                );
            }
        }
    }

    /// Declare the actions of already registered resource types
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::UnknownResourceType`] if a resource type has no guard.
    /// Nothing is registered in that case.
    pub fn register_actions<I, K, A, S>(&mut self, actions: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<ResourceType>,
        A: IntoIterator<Item = S>,
        S: Into<ActionName>,
    {
        let pending: Vec<(ResourceType, Vec<ActionName>)> = actions
            .into_iter()
            .map(|(resource_type, names)| {
                (
                    resource_type.into(),
                    names.into_iter().map(Into::into).collect(),
                )
            })
            .collect();

        if let Some((unknown, _)) = pending
            .iter()
            .find(|(resource_type, _)| !self.resources.contains_key(resource_type))
        {
            return Err(AuthzError::UnknownResourceType(unknown.clone()));
        }

        for (resource_type, names) in pending {
            if let Some(registration) = self.resources.get_mut(&resource_type) {
                registration.actions.extend(names);
            }
        }
        Ok(())
    }

    /// Guard bound to a resource type
    pub fn lookup(&self, resource_type: &str) -> Result<&Arc<dyn Guard>> {
        self.resources
            .get(resource_type)
            .map(|registration| &registration.guard)
            .ok_or_else(|| AuthzError::UnknownResourceType(resource_type.to_string()))
    }

    /// Verify that `action` is declared for `resource_type`
    ///
    /// An unknown resource type is reported before an unknown action.
    pub fn validate_action(&self, resource_type: &str, action: &str) -> Result<()> {
        let registration = self
            .resources
            .get(resource_type)
            .ok_or_else(|| AuthzError::UnknownResourceType(resource_type.to_string()))?;

        if registration.actions.contains(action) {
            Ok(())
        } else {
            Err(AuthzError::UnknownAction {
                resource_type: resource_type.to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Registered resource type names, sorted
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Declared actions of a resource type, sorted
    pub fn actions(&self, resource_type: &str) -> Result<impl Iterator<Item = &str>> {
        self.resources
            .get(resource_type)
            .map(|registration| registration.actions.iter().map(String::as_str))
            .ok_or_else(|| AuthzError::UnknownResourceType(resource_type.to_string()))
    }

    /// Every registered (resource type, action) coordinate
    pub(crate) fn coordinates(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resources.iter().flat_map(|(resource_type, registration)| {
            registration
                .actions
                .iter()
                .map(move |action| (resource_type.as_str(), action.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (resource_type, registration) in &self.resources {
            map.entry(resource_type, &registration.actions);
        }
        map.finish()
    }
}
