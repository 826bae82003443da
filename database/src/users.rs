//! Users and their role assignments.

use authz::{AuthzError, RoleHolder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{debug, info};

use crate::{Database, DatabaseError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A user together with the role names currently assigned to it.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

impl RoleHolder for UserWithRoles {
    fn user_id(&self) -> i64 {
        self.user.id
    }

    fn role_names(&self) -> &[String] {
        &self.roles
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

impl Database {
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let email = new_user.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DatabaseError::Validation(format!(
                "invalid email address '{}'",
                new_user.email
            )));
        }

        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO users (name, email, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_user.name)
        .bind(&email)
        .bind(&new_user.password_hash)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        info!("Created user {} <{}>", id, email);
        self.find_user(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(users)
    }

    /// Role names assigned to a user, in role seeding order.
    pub async fn user_roles(&self, user_id: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT r.name FROM user_roles ur
             JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = ?
             ORDER BY r.id",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }

    /// Loads a user and its current roles. Nothing is cached between calls.
    pub async fn user_with_roles(&self, user_id: i64) -> Result<Option<UserWithRoles>> {
        let Some(user) = self.find_user(user_id).await? else {
            return Ok(None);
        };
        let roles = self.user_roles(user_id).await?;
        Ok(Some(UserWithRoles { user, roles }))
    }

    /// Replaces the user's role assignments with exactly `roles`.
    ///
    /// Fails without changing anything if the user or any role does not exist.
    pub async fn sync_roles<S: AsRef<str>>(&self, user_id: i64, roles: &[S]) -> Result<Vec<String>> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DatabaseError::NotFound(format!("user {}", user_id)));
        }

        let mut role_ids = Vec::with_capacity(roles.len());
        for name in roles {
            let name = name.as_ref();
            let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM roles WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?;
            match row {
                Some((id,)) => role_ids.push(id),
                None => return Err(AuthzError::UnknownRole(name.to_string()).into()),
            }
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role_id in role_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO user_roles (user_id, role_id, assigned_at) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(role_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Synced roles of user {}", user_id);

        self.user_roles(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_db, user};
    use authz::{AuthzEngine, Permission};

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = seeded_db().await;
        let created = db
            .create_user(&NewUser {
                name: "Admin User".to_string(),
                email: " Admin@Example.com ".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.email, "admin@example.com");
        let found = db.find_user_by_email("ADMIN@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(db.find_user(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = seeded_db().await;
        user(&db, "dup@example.com", &[]).await;

        let err = db
            .create_user(&NewUser {
                name: "again".to_string(),
                email: "dup@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Connection(_)));

        let err = db
            .create_user(&NewUser {
                name: "bad".to_string(),
                email: "no-at-sign".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn test_sync_roles_replaces() {
        let db = seeded_db().await;
        let id = user(&db, "prof@example.com", &["professor"]).await;
        assert_eq!(db.user_roles(id).await.unwrap(), vec!["professor"]);

        let roles = db.sync_roles(id, &["professor", "client"]).await.unwrap();
        assert_eq!(roles, vec!["client", "professor"]);

        let roles = db.sync_roles(id, &["admin"]).await.unwrap();
        assert_eq!(roles, vec!["admin"]);

        assert!(db.sync_roles::<&str>(id, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_roles_unknown_role_changes_nothing() {
        let db = seeded_db().await;
        let id = user(&db, "c@example.com", &["client"]).await;

        let err = db.sync_roles(id, &["admin", "root"]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Authz(AuthzError::UnknownRole(ref r)) if r == "root"));
        assert_eq!(db.user_roles(id).await.unwrap(), vec!["client"]);

        let err = db.sync_roles(9999, &["client"]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_role_change_reflected_on_next_load() {
        let db = seeded_db().await;
        let engine = AuthzEngine::with_defaults().unwrap();
        let id = user(&db, "p@example.com", &["professor"]).await;

        let before = db.user_with_roles(id).await.unwrap().unwrap();
        assert!(!engine
            .accessor()
            .has_permission(&before, Permission::PostDelete));

        db.sync_roles(id, &["client"]).await.unwrap();

        let after = db.user_with_roles(id).await.unwrap().unwrap();
        assert!(engine.accessor().has_permission(&after, Permission::PostDelete));
        assert_eq!(engine.principal(&after).role.as_deref(), Some("client"));
    }

    #[tokio::test]
    async fn test_password_hash_not_serialized() {
        let db = seeded_db().await;
        let id = user(&db, "s@example.com", &["client"]).await;
        let loaded = db.user_with_roles(id).await.unwrap().unwrap();

        let value = serde_json::to_value(&loaded).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "s@example.com");
        assert_eq!(value["roles"], serde_json::json!(["client"]));
    }
}
