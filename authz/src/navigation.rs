//! Role-filtered navigation menus.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub title: String,
    pub url: String,
    pub allowed_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<NavigationItem>,
}

impl NavigationItem {
    pub fn new(title: &str, url: &str, roles: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            allowed_roles: roles.iter().map(|r| r.to_string()).collect(),
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<NavigationItem>) -> Self {
        self.items = items;
        self
    }

    fn allows(&self, role: &str) -> bool {
        self.allowed_roles.iter().any(|r| r == role)
    }
}

/// The built-in admin and client menus.
pub fn default_menu() -> Vec<NavigationItem> {
    let admin = &["admin"];
    let client = &["client"];
    vec![
        NavigationItem::new("Dashboard", "/admin", admin).with_items(vec![
            NavigationItem::new("Overview", "/admin/dashboard", admin),
            NavigationItem::new("Statistics", "/admin/stats", admin),
            NavigationItem::new("Reports", "/admin/reports", admin),
        ]),
        NavigationItem::new("Users", "/admin/users", admin).with_items(vec![
            NavigationItem::new("All users", "/admin/users", admin),
            NavigationItem::new("Roles and permissions", "/admin/users/roles", admin),
        ]),
        NavigationItem::new("Posts", "/admin/posts", admin).with_items(vec![
            NavigationItem::new("All posts", "/admin/posts", admin),
            NavigationItem::new("New post", "/admin/posts/create", admin),
        ]),
        NavigationItem::new("My space", "/client", client).with_items(vec![
            NavigationItem::new("Dashboard", "/client/dashboard", client),
            NavigationItem::new("Profile", "/client/profile", client),
        ]),
        NavigationItem::new("My posts", "/client/posts", client).with_items(vec![
            NavigationItem::new("All my posts", "/client/posts", client),
            NavigationItem::new("Drafts", "/client/posts/drafts", client),
        ]),
        NavigationItem::new("Projects", "/client/projects", client),
    ]
}

/// Keeps the items (and sub-items) visible to `role`. No role, no menu.
pub fn filter_for_role(items: &[NavigationItem], role: Option<&str>) -> Vec<NavigationItem> {
    let Some(role) = role else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.allows(role))
        .map(|item| NavigationItem {
            items: filter_for_role(&item.items, Some(role)),
            ..item.clone()
        })
        .collect()
}
