//! Persistent role and permission tables.

use authz::{Permission, RoleRegistry, SeedReport};
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::{Database, Result};

impl Database {
    /// Mirror the registry into `permissions`, `roles` and `role_permissions`.
    ///
    /// Runs in one transaction: permissions are inserted if missing, roles are
    /// upserted by name and each role's permission rows are replaced only when
    /// they differ from the registry. Re-running with the same registry
    /// changes nothing.
    pub async fn seed_roles(&self, registry: &RoleRegistry) -> Result<SeedReport> {
        let now = Utc::now();
        let mut report = SeedReport::default();
        let mut tx = self.pool().begin().await?;

        for permission in Permission::ALL {
            sqlx::query(
                "INSERT INTO permissions (name, resource, action, created_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(name) DO NOTHING",
            )
            .bind(permission.as_str())
            .bind(permission.resource().as_str())
            .bind(permission.action().as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        for role in registry.roles() {
            let inserted = sqlx::query(
                "INSERT INTO roles (name, created_at, updated_at)
                 VALUES (?, ?, ?)
                 ON CONFLICT(name) DO NOTHING",
            )
            .bind(&role.name)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                == 1;

            let (role_id,): (i64,) = sqlx::query_as("SELECT id FROM roles WHERE name = ?")
                .bind(&role.name)
                .fetch_one(&mut *tx)
                .await?;

            let current: Vec<(String,)> = sqlx::query_as(
                "SELECT p.name FROM role_permissions rp
                 JOIN permissions p ON p.id = rp.permission_id
                 WHERE rp.role_id = ?",
            )
            .bind(role_id)
            .fetch_all(&mut *tx)
            .await?;
            let current: BTreeSet<String> = current.into_iter().map(|(n,)| n).collect();
            let desired: BTreeSet<String> = role
                .permissions
                .iter()
                .map(|p| p.as_str().to_string())
                .collect();

            if current == desired {
                if inserted {
                    report.created.push(role.name.clone());
                } else {
                    report.unchanged.push(role.name.clone());
                }
                continue;
            }

            debug!("Syncing permissions of role {}", role.name);

            sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
                .bind(role_id)
                .execute(&mut *tx)
                .await?;

            for name in &desired {
                sqlx::query(
                    "INSERT INTO role_permissions (role_id, permission_id, granted_at)
                     SELECT ?, id, ? FROM permissions WHERE name = ?",
                )
                .bind(role_id)
                .bind(now)
                .bind(name)
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query("UPDATE roles SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;

            if inserted {
                report.created.push(role.name.clone());
            } else {
                report.updated.push(role.name.clone());
            }
        }

        tx.commit().await?;

        info!(
            "Seeded roles: {} created, {} updated, {} unchanged",
            report.created.len(),
            report.updated.len(),
            report.unchanged.len()
        );

        Ok(report)
    }

    /// Role names in seeding order.
    pub async fn role_names(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM roles ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }

    /// Permission names stored for a role, sorted.
    pub async fn role_permissions(&self, role: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT p.name FROM role_permissions rp
             JOIN roles r ON r.id = rp.role_id
             JOIN permissions p ON p.id = rp.permission_id
             WHERE r.name = ?
             ORDER BY p.name",
        )
        .bind(role)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }
}
