//! Route guard for role sections.
//!
//! Every protected path lives either inside a role's section (`/admin/...`,
//! `/client/...`) or outside all sections. The guard decides whether a
//! navigation may proceed, where it should be redirected instead, or whether
//! the session has to be torn down.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::AuthzError;

/// A role's area of the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Role that owns this section.
    pub role: String,
    /// Section root, e.g. `/admin`.
    pub root: String,
    /// Canonical landing page, e.g. `/admin/dashboard`.
    pub dashboard: String,
}

impl Section {
    pub fn new(role: impl Into<String>, root: impl Into<String>) -> Self {
        let root = root.into().trim_end_matches('/').to_string();
        Self {
            role: role.into(),
            dashboard: format!("{}/dashboard", root),
            root,
        }
    }

    pub fn defaults() -> Vec<Section> {
        vec![Section::new("admin", "/admin"), Section::new("client", "/client")]
    }

    /// Drops trailing slashes from `root` and `dashboard`, as `new` does.
    pub fn normalized(mut self) -> Self {
        self.root = self.root.trim_end_matches('/').to_string();
        let dashboard = self.dashboard.trim_end_matches('/');
        self.dashboard = if dashboard.is_empty() {
            format!("{}/dashboard", self.root)
        } else {
            dashboard.to_string()
        };
        self
    }

    /// Rejects roots that are not absolute and dashboards outside the section.
    pub fn validate(&self) -> Result<(), AuthzError> {
        if !self.root.starts_with('/') || self.root.len() < 2 {
            return Err(AuthzError::Configuration(format!(
                "section root '{}' of role '{}' must be an absolute path below /",
                self.root, self.role
            )));
        }
        if !self.contains(&self.dashboard) || self.is_root(&self.dashboard) {
            return Err(AuthzError::Configuration(format!(
                "dashboard '{}' is not inside section {}",
                self.dashboard, self.root
            )));
        }
        Ok(())
    }

    /// `/admin`, `/admin/` and anything below `/admin/`, ignoring any query
    /// string or fragment.
    pub fn contains(&self, path: &str) -> bool {
        let path = route_path(path);
        path == self.root
            || path
                .strip_prefix(self.root.as_str())
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false)
    }

    /// Exactly the section root, with or without a trailing slash.
    pub fn is_root(&self, path: &str) -> bool {
        route_path(path).trim_end_matches('/') == self.root
    }
}

/// The path part of a navigation target: everything before `?` or `#`.
fn route_path(target: &str) -> &str {
    target
        .find(|c| c == '?' || c == '#')
        .map_or(target, |end| &target[..end])
}

/// What the guard knows about the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub authenticated: bool,
    pub role: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(role: Option<String>) -> Self {
        Self {
            authenticated: true,
            role,
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    Redirect {
        to: String,
        /// Where to go after logging in, for unauthenticated redirects.
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect: Option<String>,
    },
    /// The session must be terminated before redirecting.
    ForceLogout { to: String },
}

impl RouteDecision {
    fn redirect(to: impl Into<String>) -> Self {
        RouteDecision::Redirect {
            to: to.into(),
            redirect: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    sections: Vec<Section>,
    login_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(Section::defaults(), "/login")
    }
}

impl RouteGuard {
    pub fn new(sections: Vec<Section>, login_path: impl Into<String>) -> Self {
        Self {
            sections: sections.into_iter().map(Section::normalized).collect(),
            login_path: login_path.into(),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// The section owned by `role`, if any.
    pub fn home_of(&self, role: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.role == role)
    }

    /// The section `path` belongs to, if any.
    pub fn section_of(&self, path: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.contains(path))
    }

    /// Checks that an authenticated session's role owns a section.
    ///
    /// A session without one is a [`AuthzError::SecurityAnomaly`].
    pub fn recognize<'a>(&'a self, session: &SessionContext) -> Result<&'a Section, AuthzError> {
        match session.role.as_deref() {
            Some(role) => self.home_of(role).ok_or_else(|| {
                AuthzError::SecurityAnomaly(format!("role '{}' has no section", role))
            }),
            None => Err(AuthzError::SecurityAnomaly(
                "authenticated session without a role".to_string(),
            )),
        }
    }

    /// Decides a navigation to `path`.
    pub fn before_enter(&self, path: &str, session: &SessionContext) -> RouteDecision {
        if !session.authenticated {
            debug!("Unauthenticated navigation to {}, redirecting to login", path);
            return RouteDecision::Redirect {
                to: self.login_path.clone(),
                redirect: Some(path.to_string()),
            };
        }

        let home = match self.recognize(session) {
            Ok(home) => home,
            Err(e) => {
                error!("Invalid role detected, forcing logout: {}", e);
                return RouteDecision::ForceLogout {
                    to: self.login_path.clone(),
                };
            }
        };

        let Some(section) = self.section_of(path) else {
            return RouteDecision::Allow;
        };

        if section.role != home.role {
            debug!(
                "Role {} may not enter {}, sending to {}",
                home.role, section.root, home.root
            );
            return RouteDecision::redirect(home.root.clone());
        }

        if section.is_root(path) {
            return RouteDecision::redirect(section.dashboard.clone());
        }

        RouteDecision::Allow
    }
}
