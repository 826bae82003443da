//! The closed permission catalogue.
//!
//! Permissions travel as `<resource>.<action>` strings (in configuration files
//! and in the user payload) but are held as an enum everywhere else, so a typo
//! in code fails to compile and a typo in configuration fails to parse.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;
use crate::types::{Action, ResourceKind};

/// A single capability from the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Permission {
    PostCreate,
    PostRead,
    PostUpdate,
    PostDelete,
    ProjectCreate,
    ProjectRead,
    ProjectUpdate,
    ProjectDelete,
    UserManage,
}

/// A user's (or a role's) set of permissions.
pub type PermissionSet = BTreeSet<Permission>;

impl Permission {
    /// Every permission, in catalogue order.
    pub const ALL: [Permission; 9] = [
        Permission::PostCreate,
        Permission::PostRead,
        Permission::PostUpdate,
        Permission::PostDelete,
        Permission::ProjectCreate,
        Permission::ProjectRead,
        Permission::ProjectUpdate,
        Permission::ProjectDelete,
        Permission::UserManage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::PostCreate => "post.create",
            Permission::PostRead => "post.read",
            Permission::PostUpdate => "post.update",
            Permission::PostDelete => "post.delete",
            Permission::ProjectCreate => "project.create",
            Permission::ProjectRead => "project.read",
            Permission::ProjectUpdate => "project.update",
            Permission::ProjectDelete => "project.delete",
            Permission::UserManage => "user.manage",
        }
    }

    /// The resource half of the name.
    pub fn resource(&self) -> ResourceKind {
        match self {
            Permission::PostCreate
            | Permission::PostRead
            | Permission::PostUpdate
            | Permission::PostDelete => ResourceKind::Post,
            Permission::ProjectCreate
            | Permission::ProjectRead
            | Permission::ProjectUpdate
            | Permission::ProjectDelete => ResourceKind::Project,
            Permission::UserManage => ResourceKind::User,
        }
    }

    /// The action half of the name.
    pub fn action(&self) -> Action {
        match self {
            Permission::PostCreate | Permission::ProjectCreate => Action::Create,
            Permission::PostRead | Permission::ProjectRead => Action::Read,
            Permission::PostUpdate | Permission::ProjectUpdate => Action::Update,
            Permission::PostDelete | Permission::ProjectDelete => Action::Delete,
            Permission::UserManage => Action::ManageRoles,
        }
    }

    /// Looks up the catalogue entry for a resource/action pair, if one exists.
    pub fn for_action(kind: ResourceKind, action: Action) -> Option<Permission> {
        Permission::ALL
            .into_iter()
            .find(|p| p.resource() == kind && p.action() == action)
    }

    /// Parses a list of names, failing on the first one outside the catalogue.
    pub fn parse_all<I, S>(names: I) -> Result<PermissionSet, AuthzError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AuthzError::UnknownPermission(s.to_string()))
    }
}

impl TryFrom<String> for Permission {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(p: Permission) -> Self {
        p.as_str().to_string()
    }
}

/// Renders a permission set as the sorted list of names sent to clients.
pub fn names(set: &PermissionSet) -> Vec<String> {
    set.iter().map(|p| p.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_parses_back() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
            let (resource, action) = p.as_str().split_once('.').unwrap();
            assert_eq!(resource, p.resource().as_str());
            assert_eq!(action, p.action().as_str());
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "post.publish".parse::<Permission>().unwrap_err();
        assert!(matches!(err, AuthzError::UnknownPermission(name) if name == "post.publish"));
        assert!("Post.Create".parse::<Permission>().is_err());
        assert!("".parse::<Permission>().is_err());
    }

    #[test]
    fn test_parse_all_stops_at_first_unknown() {
        let ok = Permission::parse_all(["post.read", "post.create", "post.read"]).unwrap();
        assert_eq!(ok.len(), 2);

        let err = Permission::parse_all(["post.read", "post.archive", "nope"]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown permission: post.archive");
    }

    #[test]
    fn test_for_action() {
        assert_eq!(
            Permission::for_action(ResourceKind::Post, Action::Create),
            Some(Permission::PostCreate)
        );
        assert_eq!(
            Permission::for_action(ResourceKind::User, Action::ManageRoles),
            Some(Permission::UserManage)
        );
        assert_eq!(Permission::for_action(ResourceKind::User, Action::Delete), None);
    }

    #[test]
    fn test_serde_uses_dotted_names() {
        let json = serde_json::to_string(&vec![Permission::PostUpdate, Permission::UserManage])
            .unwrap();
        assert_eq!(json, r#"["post.update","user.manage"]"#);

        let back: Vec<Permission> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Permission::PostUpdate, Permission::UserManage]);

        assert!(serde_json::from_str::<Permission>(r#""post.publish""#).is_err());
    }
}
