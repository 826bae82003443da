//! Core authorization types.
//!
//! In "who can do what to which resource" terms: a [`Principal`] is the who,
//! an [`Action`] the what, and a [`Resource`] the which. An [`AuthDecision`]
//! is the answer. None of these are persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::permission::PermissionSet;

/// The kinds of resource that have a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Post,
    Project,
    User,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Post => "post",
            ResourceKind::Project => "project",
            ResourceKind::User => "user",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action being performed on a resource.
///
/// `Create` never has a resource instance; `Update` and `Delete` always do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    /// Replace another user's role assignments.
    ManageRoles,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::ManageRoles => "manage",
        }
    }

    /// Whether the action targets an existing instance.
    pub fn needs_instance(&self) -> bool {
        matches!(self, Action::Update | Action::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user as seen by the access-control layer.
///
/// Built by [`crate::accessor::PermissionAccessor::principal`] from the user's
/// current role assignments. `role` is the primary role used for navigation;
/// `permissions` is the union over all of `roles`.
///
/// # Security Note
/// A principal must only ever be built from an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub role: Option<String>,
    pub roles: Vec<String>,
    pub permissions: PermissionSet,
}

/// A resource instance handed to a policy.
///
/// `owner_id` is optional only because rows can be built from partial data;
/// asking a policy about an unowned instance is an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub kind: ResourceKind,
    pub owner_id: Option<i64>,
}

impl Resource {
    pub fn new(id: i64, kind: ResourceKind, owner_id: Option<i64>) -> Self {
        Self { id, kind, owner_id }
    }

    pub fn post(id: i64, owner_id: i64) -> Self {
        Self::new(id, ResourceKind::Post, Some(owner_id))
    }

    pub fn project(id: i64, owner_id: i64) -> Self {
        Self::new(id, ResourceKind::Project, Some(owner_id))
    }

    /// Users are their own resource; nobody "owns" them.
    pub fn user(id: i64) -> Self {
        Self::new(id, ResourceKind::User, None)
    }
}

/// Result of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuthDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    /// Turns a denial into [`crate::AuthzError::Denied`].
    pub fn into_result(self) -> crate::Result<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(crate::AuthzError::Denied {
                reason: self
                    .reason
                    .unwrap_or_else(|| "This action is unauthorized.".to_string()),
            })
        }
    }
}
