//! Role/permission accessor.
//!
//! Effective permissions are recomputed from the user's role assignments on
//! every call. Nothing is cached here, so a role change is visible as soon as
//! the caller re-reads the assignments.

use tracing::warn;

use crate::permission::{Permission, PermissionSet};
use crate::registry::RoleRegistry;
use crate::types::{Action, Principal, ResourceKind};

/// Anything that carries a user id and the names of its assigned roles.
pub trait RoleHolder {
    fn user_id(&self) -> i64;
    fn role_names(&self) -> &[String];
}

/// A bare user id plus role names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    pub roles: Vec<String>,
}

impl Subject {
    pub fn new<I, S>(id: i64, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl RoleHolder for Subject {
    fn user_id(&self) -> i64 {
        self.id
    }

    fn role_names(&self) -> &[String] {
        &self.roles
    }
}

/// True if at least one of `required` is in `granted`. Empty `required` is false.
pub fn has_any_of(granted: &PermissionSet, required: &[Permission]) -> bool {
    required.iter().any(|p| granted.contains(p))
}

/// True if every one of `required` is in `granted`. Empty `required` is true.
pub fn has_all_of(granted: &PermissionSet, required: &[Permission]) -> bool {
    required.iter().all(|p| granted.contains(p))
}

/// Reads effective permissions through a [`RoleRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct PermissionAccessor<'a> {
    registry: &'a RoleRegistry,
}

impl<'a> PermissionAccessor<'a> {
    pub fn new(registry: &'a RoleRegistry) -> Self {
        Self { registry }
    }

    /// Union of the permissions of every role the user holds.
    pub fn effective_permissions(&self, user: &impl RoleHolder) -> PermissionSet {
        let mut set = PermissionSet::new();
        for name in user.role_names() {
            match self.registry.role(name) {
                Some(role) => set.extend(role.permissions.iter().copied()),
                None => warn!(
                    "User {} holds role '{}' which is not in the registry",
                    user.user_id(),
                    name
                ),
            }
        }
        set
    }

    pub fn has_permission(&self, user: &impl RoleHolder, permission: Permission) -> bool {
        self.effective_permissions(user).contains(&permission)
    }

    pub fn has_any(&self, user: &impl RoleHolder, permissions: &[Permission]) -> bool {
        has_any_of(&self.effective_permissions(user), permissions)
    }

    pub fn has_all(&self, user: &impl RoleHolder, permissions: &[Permission]) -> bool {
        has_all_of(&self.effective_permissions(user), permissions)
    }

    /// `can(user, Post, Update)` is `has_permission(user, post.update)`.
    ///
    /// Pairs with no catalogue entry are never granted.
    pub fn can(&self, user: &impl RoleHolder, kind: ResourceKind, action: Action) -> bool {
        Permission::for_action(kind, action)
            .map(|p| self.has_permission(user, p))
            .unwrap_or(false)
    }

    /// The user's first role in registry declaration order.
    pub fn primary_role(&self, user: &impl RoleHolder) -> Option<String> {
        user.role_names()
            .iter()
            .filter_map(|name| self.registry.rank(name).map(|rank| (rank, name)))
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, name)| name.clone())
    }

    /// Builds the principal handed to policies and sent to clients.
    pub fn principal(&self, user: &impl RoleHolder) -> Principal {
        Principal {
            id: user.user_id(),
            role: self.primary_role(user),
            roles: user.role_names().to_vec(),
            permissions: self.effective_permissions(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RoleDefinition;

    fn registry() -> RoleRegistry {
        RoleRegistry::from_definitions(&RoleDefinition::defaults()).unwrap()
    }

    #[test]
    fn test_has_permission_is_membership() {
        let registry = registry();
        let accessor = PermissionAccessor::new(&registry);
        let professor = Subject::new(1, ["professor"]);
        let granted = accessor.effective_permissions(&professor);

        for p in Permission::ALL {
            assert_eq!(accessor.has_permission(&professor, p), granted.contains(&p));
        }
    }

    #[test]
    fn test_empty_lists() {
        let registry = registry();
        let accessor = PermissionAccessor::new(&registry);

        for user in [
            Subject::new(1, ["admin"]),
            Subject::new(2, Vec::<String>::new()),
        ] {
            assert!(!accessor.has_any(&user, &[]));
            assert!(accessor.has_all(&user, &[]));
        }

        let empty = PermissionSet::new();
        assert!(!has_any_of(&empty, &[]));
        assert!(has_all_of(&empty, &[]));
    }

    #[test]
    fn test_any_and_all() {
        let registry = registry();
        let accessor = PermissionAccessor::new(&registry);
        let professor = Subject::new(1, ["professor"]);

        let pair = [Permission::PostUpdate, Permission::PostDelete];
        assert!(accessor.has_any(&professor, &pair));
        assert!(!accessor.has_all(&professor, &pair));
        assert!(accessor.has_all(&professor, &[Permission::PostCreate, Permission::PostRead]));
    }

    #[test]
    fn test_union_of_roles() {
        let registry = registry();
        let accessor = PermissionAccessor::new(&registry);
        let both = Subject::new(1, ["professor", "client"]);

        let granted = accessor.effective_permissions(&both);
        assert!(granted.contains(&Permission::PostDelete));
        assert!(granted.contains(&Permission::ProjectCreate));
        assert!(!granted.contains(&Permission::UserManage));
    }

    #[test]
    fn test_unknown_role_grants_nothing() {
        let registry = registry();
        let accessor = PermissionAccessor::new(&registry);
        let ghost = Subject::new(1, ["superuser"]);

        assert!(accessor.effective_permissions(&ghost).is_empty());
        assert_eq!(accessor.primary_role(&ghost), None);
    }

    #[test]
    fn test_role_change_is_visible_immediately() {
        let registry = registry();
        let accessor = PermissionAccessor::new(&registry);
        let mut user = Subject::new(1, ["professor"]);
        assert!(!accessor.has_permission(&user, Permission::PostDelete));

        user.roles = vec!["client".to_string()];
        assert!(accessor.has_permission(&user, Permission::PostDelete));
    }

    #[test]
    fn test_can() {
        let registry = registry();
        let accessor = PermissionAccessor::new(&registry);
        let client = Subject::new(1, ["client"]);

        assert!(accessor.can(&client, ResourceKind::Post, Action::Update));
        assert!(!accessor.can(&client, ResourceKind::Project, Action::Delete));
        assert!(!accessor.can(&client, ResourceKind::User, Action::ManageRoles));
        assert!(!accessor.can(&client, ResourceKind::User, Action::Read));
    }

    #[test]
    fn test_primary_role_follows_registry_order() {
        let registry = registry();
        let accessor = PermissionAccessor::new(&registry);

        let user = Subject::new(5, ["professor", "client"]);
        let principal = accessor.principal(&user);
        assert_eq!(principal.role.as_deref(), Some("client"));
        assert_eq!(principal.roles, vec!["professor", "client"]);
        assert_eq!(principal.id, 5);
    }
}
