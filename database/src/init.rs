use crate::{Database, Result};
use authz::RoleRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Database initialization configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Upper bound on pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data").join("postboard.db"),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_path(database_path: PathBuf) -> Self {
        Self {
            database_path,
            ..Self::default()
        }
    }

    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = path;
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }
}

/// Open the database, create the schema and sync the role tables with `registry`.
pub async fn initialize_database(
    config: DatabaseConfig,
    registry: &RoleRegistry,
) -> Result<Arc<Database>> {
    info!(
        "Initializing database at {}",
        config.database_path.display()
    );

    let db = Database::connect(&config.database_path, config.max_connections).await?;
    db.migrate().await?;
    db.seed_roles(registry).await?;

    Ok(Arc::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz::RoleDefinition;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("data").join("test.db");
        let registry = RoleRegistry::from_definitions(&RoleDefinition::defaults()).unwrap();

        let config = DatabaseConfig::new()
            .with_database_path(db_path.clone())
            .with_max_connections(2);
        let db = initialize_database(config, &registry).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(
            db.role_names().await.unwrap(),
            vec!["admin", "client", "professor"]
        );
    }

    #[tokio::test]
    async fn test_reinitialize_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let registry = RoleRegistry::from_definitions(&RoleDefinition::defaults()).unwrap();

        let db = initialize_database(DatabaseConfig::new_with_path(db_path.clone()), &registry)
            .await
            .unwrap();
        let id = crate::test_support::user(&db, "keep@example.com", &["client"]).await;
        db.pool().close().await;

        let db = initialize_database(DatabaseConfig::new_with_path(db_path), &registry)
            .await
            .unwrap();
        assert_eq!(db.user_roles(id).await.unwrap(), vec!["client"]);
    }

    #[test]
    fn test_max_connections_floor() {
        assert_eq!(DatabaseConfig::new().with_max_connections(0).max_connections, 1);
    }
}
