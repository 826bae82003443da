//! Project storage. Projects are owned the same way posts are.

use authz::Resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use crate::{Database, DatabaseError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub owner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn resource(&self) -> Resource {
        Resource::project(self.id, self.owner_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

const SELECT_PROJECT: &str = "SELECT p.id, p.name, p.description, p.owner_id, u.name AS owner_name,
            p.created_at, p.updated_at
     FROM projects p
     LEFT JOIN users u ON u.id = p.owner_id";

impl Database {
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "{} ORDER BY p.created_at DESC, p.id DESC",
            SELECT_PROJECT
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(projects)
    }

    pub async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!("{} WHERE p.id = ?", SELECT_PROJECT))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(project)
    }

    pub async fn create_project(&self, owner_id: i64, input: &ProjectInput) -> Result<Project> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO projects (name, description, owner_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        info!("User {} created project {}", owner_id, id);
        self.require_project(id).await
    }

    pub async fn update_project(&self, id: i64, input: &ProjectInput) -> Result<Project> {
        let affected = sqlx::query(
            "UPDATE projects SET name = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("project {}", id)));
        }
        self.require_project(id).await
    }

    pub async fn delete_project(&self, id: i64) -> Result<()> {
        let affected = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("project {}", id)));
        }
        info!("Deleted project {}", id);
        Ok(())
    }

    async fn require_project(&self, id: i64) -> Result<Project> {
        self.get_project(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("project {}", id)))
    }
}
