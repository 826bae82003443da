use anyhow::{Context, Result};
use authz::{AuthzConfig, AuthzEngine};
use database::{initialize_database, Database, DatabaseConfig};
use std::sync::Arc;
use tracing::debug;

use crate::utils::env_paths::EnvPaths;

/// Resolved paths and the access-control engine built from the configuration.
pub struct AppContext {
    pub paths: EnvPaths,
    pub engine: AuthzEngine,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = EnvPaths::load()?;
        let config = AuthzConfig::load_or_default(&paths.authz_config_path).with_context(|| {
            format!(
                "Failed to load access-control configuration from {}",
                paths.authz_config_path.display()
            )
        })?;
        let engine =
            AuthzEngine::from_config(&config).context("Invalid access-control configuration")?;
        debug!(
            "Loaded {} roles from configuration",
            engine.registry().roles().len()
        );

        Ok(Self { paths, engine })
    }

    /// Opens the database, migrating and syncing roles on the way.
    pub async fn database(&self) -> Result<Arc<Database>> {
        let config = DatabaseConfig::new_with_path(self.paths.database_path());
        initialize_database(config, self.engine.registry())
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}",
                    self.paths.database_path().display()
                )
            })
    }
}
