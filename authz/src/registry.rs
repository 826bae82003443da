//! Role → permission registry.
//!
//! The registry is built from configuration once at process start and handed
//! to everything that needs it. Seeding is an upsert by role name with an exact
//! sync of each role's permissions, and it validates the whole input before
//! touching any state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::{AuthzError, Result};
use crate::permission::{Permission, PermissionSet};

/// A role as written in configuration: a name and permission names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl RoleDefinition {
    pub fn new<I, S>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// The roles shipped with the application.
    pub fn defaults() -> Vec<RoleDefinition> {
        vec![
            RoleDefinition::new(
                "admin",
                [
                    "post.create",
                    "post.read",
                    "post.update",
                    "post.delete",
                    "user.manage",
                    "project.create",
                    "project.read",
                    "project.update",
                    "project.delete",
                ],
            ),
            RoleDefinition::new(
                "client",
                [
                    "post.read",
                    "post.create",
                    "post.update",
                    "post.delete",
                    "project.read",
                    "project.create",
                ],
            ),
            RoleDefinition::new("professor", ["post.create", "post.read", "post.update"]),
        ]
    }
}

/// A validated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub permissions: PermissionSet,
}

/// What a seed run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
}

impl SeedReport {
    /// True when the run left the registry exactly as it found it.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty()
    }
}

/// The in-memory role registry.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: Vec<Role>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry seeded from `definitions`.
    pub fn from_definitions(definitions: &[RoleDefinition]) -> Result<Self> {
        let mut registry = Self::new();
        registry.seed(definitions)?;
        Ok(registry)
    }

    /// Validates role definitions without applying them.
    pub fn validate(definitions: &[RoleDefinition]) -> Result<Vec<Role>> {
        let mut seen = HashSet::new();
        let mut roles = Vec::with_capacity(definitions.len());

        for def in definitions {
            let name = def.name.trim();
            if name.is_empty() {
                return Err(AuthzError::InvalidRoleDefinition(
                    "role name must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.to_string()) {
                return Err(AuthzError::InvalidRoleDefinition(format!(
                    "role '{}' is defined more than once",
                    name
                )));
            }

            roles.push(Role {
                name: name.to_string(),
                permissions: Permission::parse_all(&def.permissions)?,
            });
        }

        Ok(roles)
    }

    /// Upserts every role by name and syncs its permissions exactly.
    ///
    /// Nothing is applied unless every definition is valid. Roles absent from
    /// `definitions` are left alone.
    pub fn seed(&mut self, definitions: &[RoleDefinition]) -> Result<SeedReport> {
        let validated = Self::validate(definitions)?;
        let mut report = SeedReport::default();

        for role in validated {
            match self.roles.iter_mut().find(|r| r.name == role.name) {
                Some(existing) if existing.permissions == role.permissions => {
                    report.unchanged.push(role.name);
                }
                Some(existing) => {
                    debug!(
                        "Syncing permissions of role {}: {:?} -> {:?}",
                        role.name, existing.permissions, role.permissions
                    );
                    existing.permissions = role.permissions;
                    report.updated.push(role.name);
                }
                None => {
                    report.created.push(role.name.clone());
                    self.roles.push(role);
                }
            }
        }

        info!(
            "Role registry seeded: {} created, {} updated, {} unchanged",
            report.created.len(),
            report.updated.len(),
            report.unchanged.len()
        );

        Ok(report)
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.role(name).is_some()
    }

    /// Roles in declaration order.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Position of a role in declaration order.
    pub fn rank(&self, name: &str) -> Option<usize> {
        self.roles.iter().position(|r| r.name == name)
    }

    /// Fails with [`AuthzError::UnknownRole`] on the first name not registered.
    pub fn ensure_known<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        match names.iter().find(|n| !self.contains(n.as_ref())) {
            Some(unknown) => Err(AuthzError::UnknownRole(unknown.as_ref().to_string())),
            None => Ok(()),
        }
    }
}
