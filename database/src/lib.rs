use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

pub mod error;
pub mod init;
pub mod posts;
pub mod projects;
pub mod roles;
pub mod schema;
pub mod sessions;
pub mod users;

pub use error::{DatabaseError, Result};
pub use init::{initialize_database, DatabaseConfig};
pub use posts::{Post, PostInput};
pub use projects::{Project, ProjectInput};
pub use users::{NewUser, User, UserWithRoles};

/// Database connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) a SQLite database file
    pub async fn connect(database_path: &Path, max_connections: u32) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Connecting to database at: {}", database_path.display());

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        debug!("Database connection established");

        Ok(Self { pool })
    }

    /// A private in-memory database, mostly for tests.
    ///
    /// Every pooled connection to `:memory:` would get its own database, so
    /// the pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = r#"
            SELECT COUNT(*) as count
            FROM sqlite_master
            WHERE type='table' AND name=?
        "#;

        let result: (i64,) = sqlx::query_as(query)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use authz::{RoleDefinition, RoleRegistry};

    /// Migrated and seeded with the default roles.
    pub async fn seeded_db() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let registry = RoleRegistry::from_definitions(&RoleDefinition::defaults()).unwrap();
        db.seed_roles(&registry).await.unwrap();
        db
    }

    pub async fn user(db: &Database, email: &str, roles: &[&str]) -> i64 {
        let user = db
            .create_user(&NewUser {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
            })
            .await
            .unwrap();
        db.sync_roles(user.id, roles).await.unwrap();
        user.id
    }
}
