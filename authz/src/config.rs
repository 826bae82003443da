//! Access-control configuration.
//!
//! Loaded once at start-up (YAML) and passed explicitly to
//! [`crate::AuthzEngine::from_config`]. Every section is optional in the file;
//! missing ones fall back to the built-in defaults.
//!
//! ```yaml
//! login_path: /login
//! roles:
//!   - name: admin
//!     permissions: [post.create, post.read, post.update, post.delete, user.manage]
//!   - name: client
//!     permissions: [post.read, post.create]
//! sections:
//!   - role: admin
//!     root: /admin
//!     dashboard: /admin/dashboard
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{AuthzError, Result};
use crate::guard::Section;
use crate::navigation::{self, NavigationItem};
use crate::registry::RoleDefinition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    pub login_path: String,
    pub roles: Vec<RoleDefinition>,
    pub sections: Vec<Section>,
    pub navigation: Vec<NavigationItem>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            roles: RoleDefinition::defaults(),
            sections: Section::defaults(),
            navigation: navigation::default_menu(),
        }
    }
}

impl AuthzConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| AuthzError::Configuration(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AuthzError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&contents)?;
        info!("Loaded access-control configuration from {}", path.display());
        Ok(config)
    }

    /// Like [`AuthzConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(
                "No access-control configuration at {}, using built-in roles",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| AuthzError::Configuration(e.to_string()))
    }
}
