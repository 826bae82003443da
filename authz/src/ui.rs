//! Permission guard for conditional rendering.
//!
//! This is only a rendering hint. The server enforces the same rules through
//! [`crate::policy::PolicyEvaluator`] regardless of what a client shows.

use serde::{Deserialize, Serialize};

use crate::accessor::{has_all_of, has_any_of};
use crate::permission::{Permission, PermissionSet};

/// One permission, or a list combined according to a [`MatchMode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequiredPermissions {
    One(Permission),
    Many(Vec<Permission>),
}

impl From<Permission> for RequiredPermissions {
    fn from(p: Permission) -> Self {
        RequiredPermissions::One(p)
    }
}

impl From<Vec<Permission>> for RequiredPermissions {
    fn from(ps: Vec<Permission>) -> Self {
        RequiredPermissions::Many(ps)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Any,
    #[default]
    All,
}

/// Whether a fragment guarded by `required` should be shown.
///
/// A single permission is a membership check and ignores `mode`.
pub fn should_render(
    required: &RequiredPermissions,
    mode: MatchMode,
    user_permissions: &PermissionSet,
) -> bool {
    match (required, mode) {
        (RequiredPermissions::One(p), _) => user_permissions.contains(p),
        (RequiredPermissions::Many(ps), MatchMode::Any) => has_any_of(user_permissions, ps),
        (RequiredPermissions::Many(ps), MatchMode::All) => has_all_of(user_permissions, ps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(ps: &[Permission]) -> PermissionSet {
        ps.iter().copied().collect()
    }

    #[test]
    fn test_any_mode_renders_with_one_match() {
        let required = RequiredPermissions::from(vec![Permission::PostUpdate, Permission::PostDelete]);
        let user = granted(&[Permission::PostUpdate]);

        assert!(should_render(&required, MatchMode::Any, &user));
        assert!(!should_render(&required, MatchMode::All, &user));
    }

    #[test]
    fn test_default_mode_is_all() {
        assert_eq!(MatchMode::default(), MatchMode::All);
    }

    #[test]
    fn test_single_permission() {
        let required = RequiredPermissions::from(Permission::PostCreate);
        assert!(should_render(
            &required,
            MatchMode::Any,
            &granted(&[Permission::PostCreate])
        ));
        assert!(!should_render(
            &required,
            MatchMode::All,
            &granted(&[Permission::PostRead])
        ));
    }

    #[test]
    fn test_empty_list() {
        let required = RequiredPermissions::Many(vec![]);
        let user = granted(&[Permission::PostRead]);
        assert!(!should_render(&required, MatchMode::Any, &user));
        assert!(should_render(&required, MatchMode::All, &user));
    }

    #[test]
    fn test_deserializes_string_or_list() {
        let one: RequiredPermissions = serde_json::from_str(r#""post.create""#).unwrap();
        assert_eq!(one, RequiredPermissions::One(Permission::PostCreate));

        let many: RequiredPermissions =
            serde_json::from_str(r#"["post.update","post.delete"]"#).unwrap();
        assert_eq!(
            many,
            RequiredPermissions::Many(vec![Permission::PostUpdate, Permission::PostDelete])
        );

        assert!(serde_json::from_str::<RequiredPermissions>(r#""post.publish""#).is_err());
    }
}
