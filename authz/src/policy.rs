//! Per-resource authorization policies.
//!
//! Each resource kind has exactly one [`Policy`]; [`PolicyEvaluator`] picks it
//! from the [`ResourceKind`] tag. Evaluation is stateless and side-effect free.
//!
//! Rules:
//! - `Create` needs the blanket permission for the kind (`post.create`, ...).
//! - `Update`/`Delete` on posts and projects need ownership, and only
//!   ownership. A blanket `post.update` neither grants nor is required.
//! - `Read` is not guarded here; route-level authentication covers it.
//! - `ManageRoles` on users needs `user.manage`.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AuthzError, Result};
use crate::permission::Permission;
use crate::types::{Action, AuthDecision, Principal, Resource, ResourceKind};

/// Reason given when a non-owner tries to mutate a resource.
pub const NOT_OWNER: &str = "not owner of resource";

/// An authorization rule for one resource kind.
pub trait Policy: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Decides whether `principal` may perform `action`.
    ///
    /// `resource` is `None` for creation. Errors are programming errors, not
    /// denials.
    fn evaluate(
        &self,
        principal: &Principal,
        action: Action,
        resource: Option<&Resource>,
    ) -> Result<AuthDecision>;
}

/// Denies unless `principal` holds `permission`.
fn require_permission(principal: &Principal, permission: Permission) -> AuthDecision {
    if principal.permissions.contains(&permission) {
        AuthDecision::allow()
    } else {
        AuthDecision::deny(format!("missing permission {}", permission))
    }
}

/// Allows iff `principal` owns `resource`.
fn require_owner(
    kind: ResourceKind,
    principal: &Principal,
    action: Action,
    resource: Option<&Resource>,
) -> Result<AuthDecision> {
    let resource = resource.ok_or(AuthzError::MissingResource { kind, action })?;
    if resource.kind != kind {
        return Err(AuthzError::ResourceKindMismatch {
            expected: kind,
            found: resource.kind,
        });
    }
    let owner = resource.owner_id.ok_or(AuthzError::MissingOwner {
        kind,
        id: resource.id,
    })?;

    if owner == principal.id {
        Ok(AuthDecision::allow())
    } else {
        Ok(AuthDecision::deny(NOT_OWNER))
    }
}

/// Shared rule set for owned content (posts, projects).
fn evaluate_owned(
    kind: ResourceKind,
    create: Permission,
    principal: &Principal,
    action: Action,
    resource: Option<&Resource>,
) -> Result<AuthDecision> {
    match action {
        Action::Create => Ok(require_permission(principal, create)),
        Action::Read => Ok(AuthDecision::allow()),
        Action::Update | Action::Delete => require_owner(kind, principal, action, resource),
        Action::ManageRoles => Ok(AuthDecision::deny(format!(
            "{} is not supported on {}",
            action, kind
        ))),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostPolicy;

impl Policy for PostPolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Post
    }

    fn evaluate(
        &self,
        principal: &Principal,
        action: Action,
        resource: Option<&Resource>,
    ) -> Result<AuthDecision> {
        evaluate_owned(
            ResourceKind::Post,
            Permission::PostCreate,
            principal,
            action,
            resource,
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectPolicy;

impl Policy for ProjectPolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Project
    }

    fn evaluate(
        &self,
        principal: &Principal,
        action: Action,
        resource: Option<&Resource>,
    ) -> Result<AuthDecision> {
        evaluate_owned(
            ResourceKind::Project,
            Permission::ProjectCreate,
            principal,
            action,
            resource,
        )
    }
}

/// Users are managed, not owned.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserPolicy;

impl Policy for UserPolicy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    fn evaluate(
        &self,
        principal: &Principal,
        action: Action,
        resource: Option<&Resource>,
    ) -> Result<AuthDecision> {
        if let Some(resource) = resource {
            if resource.kind != ResourceKind::User {
                return Err(AuthzError::ResourceKindMismatch {
                    expected: ResourceKind::User,
                    found: resource.kind,
                });
            }
        }

        match action {
            Action::Read => Ok(AuthDecision::allow()),
            _ => Ok(require_permission(principal, Permission::UserManage)),
        }
    }
}

/// What the holder of a session may do to one resource, for client payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Abilities {
    pub can_update: bool,
    pub can_delete: bool,
}

/// Dispatches to the policy registered for a resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEvaluator {
    posts: PostPolicy,
    projects: ProjectPolicy,
    users: UserPolicy,
}

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy_for(&self, kind: ResourceKind) -> &dyn Policy {
        match kind {
            ResourceKind::Post => &self.posts,
            ResourceKind::Project => &self.projects,
            ResourceKind::User => &self.users,
        }
    }

    pub fn evaluate(
        &self,
        principal: &Principal,
        action: Action,
        kind: ResourceKind,
        resource: Option<&Resource>,
    ) -> Result<AuthDecision> {
        if action.needs_instance() && resource.is_none() {
            return Err(AuthzError::MissingResource { kind, action });
        }

        let decision = self
            .policy_for(kind)
            .evaluate(principal, action, resource)?;

        let target = resource
            .map(|r| format!("{} {}", kind, r.id))
            .unwrap_or_else(|| kind.to_string());
        if decision.allowed {
            debug!("Policy ALLOWED user {} to {} {}", principal.id, action, target);
        } else {
            info!(
                "Policy DENIED user {} to {} {}: {}",
                principal.id,
                action,
                target,
                decision.reason.as_deref().unwrap_or("")
            );
        }

        Ok(decision)
    }

    /// Evaluates and converts a denial into [`AuthzError::Denied`].
    pub fn authorize(
        &self,
        principal: &Principal,
        action: Action,
        kind: ResourceKind,
        resource: Option<&Resource>,
    ) -> Result<()> {
        self.evaluate(principal, action, kind, resource)?
            .into_result()
    }

    /// Update/delete abilities on an existing resource.
    pub fn abilities(&self, principal: &Principal, resource: &Resource) -> Result<Abilities> {
        Ok(Abilities {
            can_update: self
                .evaluate(principal, Action::Update, resource.kind, Some(resource))?
                .allowed,
            can_delete: self
                .evaluate(principal, Action::Delete, resource.kind, Some(resource))?
                .allowed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionSet;

    fn principal(id: i64, permissions: &[Permission]) -> Principal {
        Principal {
            id,
            role: None,
            roles: vec![],
            permissions: permissions.iter().copied().collect::<PermissionSet>(),
        }
    }

    #[test]
    fn test_create_needs_blanket_permission() {
        let evaluator = PolicyEvaluator::new();
        let writer = principal(1, &[Permission::PostCreate]);
        let reader = principal(2, &[Permission::PostRead]);

        assert!(
            evaluator
                .evaluate(&writer, Action::Create, ResourceKind::Post, None)
                .unwrap()
                .allowed
        );

        let denied = evaluator
            .evaluate(&reader, Action::Create, ResourceKind::Post, None)
            .unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.reason.as_deref(), Some("missing permission post.create"));

        // project creation is its own permission
        assert!(
            !evaluator
                .evaluate(&writer, Action::Create, ResourceKind::Project, None)
                .unwrap()
                .allowed
        );
    }

    #[test]
    fn test_owner_may_mutate_without_blanket_permission() {
        let evaluator = PolicyEvaluator::new();
        let owner = principal(1, &[]);
        let post = Resource::post(10, 1);

        for action in [Action::Update, Action::Delete] {
            let decision = evaluator
                .evaluate(&owner, action, ResourceKind::Post, Some(&post))
                .unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.reason, None);
        }
    }

    #[test]
    fn test_non_owner_denied_regardless_of_permissions() {
        let evaluator = PolicyEvaluator::new();
        let everything = principal(2, &Permission::ALL);

        for (kind, resource) in [
            (ResourceKind::Post, Resource::post(10, 1)),
            (ResourceKind::Project, Resource::project(11, 1)),
        ] {
            for action in [Action::Update, Action::Delete] {
                let decision = evaluator
                    .evaluate(&everything, action, kind, Some(&resource))
                    .unwrap();
                assert!(!decision.allowed);
                assert_eq!(decision.reason.as_deref(), Some(NOT_OWNER));
            }
        }
    }

    #[test]
    fn test_read_is_unguarded() {
        let evaluator = PolicyEvaluator::new();
        let nobody = principal(3, &[]);
        let post = Resource::post(10, 1);

        assert!(
            evaluator
                .evaluate(&nobody, Action::Read, ResourceKind::Post, Some(&post))
                .unwrap()
                .allowed
        );
        assert!(
            evaluator
                .evaluate(&nobody, Action::Read, ResourceKind::Project, None)
                .unwrap()
                .allowed
        );
    }

    #[test]
    fn test_unowned_resource_is_an_error() {
        let evaluator = PolicyEvaluator::new();
        let user = principal(1, &Permission::ALL);
        let orphan = Resource::new(10, ResourceKind::Post, None);

        let err = evaluator
            .evaluate(&user, Action::Update, ResourceKind::Post, Some(&orphan))
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::MissingOwner {
                kind: ResourceKind::Post,
                id: 10
            }
        ));
    }

    #[test]
    fn test_missing_instance_and_kind_mismatch_are_errors() {
        let evaluator = PolicyEvaluator::new();
        let user = principal(1, &[]);

        let err = evaluator
            .evaluate(&user, Action::Delete, ResourceKind::Post, None)
            .unwrap_err();
        assert!(matches!(err, AuthzError::MissingResource { .. }));

        // Users have no owner, but updating one still names a target.
        let err = evaluator
            .evaluate(&principal(1, &[Permission::UserManage]), Action::Update, ResourceKind::User, None)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::MissingResource {
                kind: ResourceKind::User,
                action: Action::Update
            }
        ));

        let project = Resource::project(4, 1);
        let err = evaluator
            .evaluate(&user, Action::Update, ResourceKind::Post, Some(&project))
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::ResourceKindMismatch {
                expected: ResourceKind::Post,
                found: ResourceKind::Project
            }
        ));
    }

    #[test]
    fn test_manage_roles_needs_user_manage() {
        let evaluator = PolicyEvaluator::new();
        let admin = principal(1, &[Permission::UserManage]);
        let client = principal(2, &[Permission::PostUpdate, Permission::PostDelete]);
        let target = Resource::user(3);

        assert!(evaluator
            .authorize(&admin, Action::ManageRoles, ResourceKind::User, Some(&target))
            .is_ok());

        let err = evaluator
            .authorize(&client, Action::ManageRoles, ResourceKind::User, Some(&target))
            .unwrap_err();
        assert!(err.is_denial());
        assert_eq!(err.to_string(), "missing permission user.manage");
    }

    #[test]
    fn test_abilities() {
        let evaluator = PolicyEvaluator::new();
        let post = Resource::post(10, 1);

        let owner = evaluator.abilities(&principal(1, &[]), &post).unwrap();
        assert_eq!(
            owner,
            Abilities {
                can_update: true,
                can_delete: true
            }
        );

        let other = evaluator
            .abilities(&principal(2, &Permission::ALL), &post)
            .unwrap();
        assert!(!other.can_update && !other.can_delete);
    }
}
