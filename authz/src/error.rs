//! Error types for the access-control layer.
//!
//! # Security Note
//! Denial reasons are surfaced verbatim to API callers, so they must only ever
//! describe the rule that failed ("not owner of resource"), never internal
//! state. Programming errors (a resource without an owner, a policy asked about
//! the wrong resource kind) are raised instead of being turned into denials.

use thiserror::Error;

use crate::types::{Action, ResourceKind};

/// Errors that can occur while seeding, resolving or evaluating permissions.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A permission name is not part of the closed catalogue.
    ///
    /// Raised while parsing role definitions; the whole seed is rejected.
    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    /// A role definition is malformed (empty or duplicated name).
    #[error("Invalid role definition: {0}")]
    InvalidRoleDefinition(String),

    /// A role name is not present in the registry.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// The policy denied the action. The reason is shown to the caller as-is.
    #[error("{reason}")]
    Denied { reason: String },

    /// An authenticated session carries no role, or a role with no section.
    ///
    /// Always terminates the session.
    #[error("Security anomaly: {0}")]
    SecurityAnomaly(String),

    /// An ownership check was requested on a resource that has no owner.
    #[error("{kind} {id} has no owner")]
    MissingOwner { kind: ResourceKind, id: i64 },

    /// An instance action was evaluated without the resource instance.
    #[error("{action} on {kind} requires a resource instance")]
    MissingResource { kind: ResourceKind, action: Action },

    /// A policy was handed a resource of another kind.
    #[error("Policy for {expected} cannot evaluate a {found}")]
    ResourceKindMismatch {
        expected: ResourceKind,
        found: ResourceKind,
    },

    /// The access-control configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthzError {
    /// Whether this error is a policy denial rather than a fault.
    pub fn is_denial(&self) -> bool {
        matches!(self, AuthzError::Denied { .. })
    }
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthzError::UnknownPermission("post.publish".to_string());
        assert_eq!(err.to_string(), "Unknown permission: post.publish");

        let err = AuthzError::Denied {
            reason: "not owner of resource".to_string(),
        };
        assert_eq!(err.to_string(), "not owner of resource");

        let err = AuthzError::MissingOwner {
            kind: ResourceKind::Post,
            id: 7,
        };
        assert_eq!(err.to_string(), "post 7 has no owner");

        let err = AuthzError::MissingResource {
            kind: ResourceKind::Project,
            action: Action::Update,
        };
        assert_eq!(
            err.to_string(),
            "update on project requires a resource instance"
        );
    }

    #[test]
    fn test_only_denied_is_denial() {
        assert!(AuthzError::Denied {
            reason: "x".into()
        }
        .is_denial());
        assert!(!AuthzError::SecurityAnomaly("x".into()).is_denial());
        assert!(!AuthzError::UnknownRole("x".into()).is_denial());
    }
}
