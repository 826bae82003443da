//! Post storage.

use authz::Resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{debug, info};

use crate::{Database, DatabaseError, Result};

/// A post row joined with its author's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub user_id: i64,
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn resource(&self) -> Resource {
        Resource::post(self.id, self.user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub description: String,
}

const SELECT_POST: &str = "SELECT p.id, p.title, p.description, p.user_id, u.name AS author_name,
            p.created_at, p.updated_at
     FROM posts p
     LEFT JOIN users u ON u.id = p.user_id";

impl Database {
    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "{} ORDER BY p.created_at DESC, p.id DESC",
            SELECT_POST
        ))
        .fetch_all(self.pool())
        .await?;
        debug!("Fetched {} posts", posts.len());
        Ok(posts)
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = ?", SELECT_POST))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(post)
    }

    pub async fn create_post(&self, owner_id: i64, input: &PostInput) -> Result<Post> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO posts (title, description, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        info!("User {} created post {}", owner_id, id);
        self.require_post(id).await
    }

    pub async fn update_post(&self, id: i64, input: &PostInput) -> Result<Post> {
        let affected = sqlx::query(
            "UPDATE posts SET title = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("post {}", id)));
        }
        self.require_post(id).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<()> {
        let affected = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("post {}", id)));
        }
        info!("Deleted post {}", id);
        Ok(())
    }

    async fn require_post(&self, id: i64) -> Result<Post> {
        self.get_post(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("post {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_db, user};
    use authz::ResourceKind;

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            description: format!("{} body", title),
        }
    }

    #[tokio::test]
    async fn test_post_crud() {
        let db = seeded_db().await;
        let owner = user(&db, "author@example.com", &["client"]).await;

        let post = db.create_post(owner, &input("first")).await.unwrap();
        assert_eq!(post.user_id, owner);
        assert_eq!(post.author_name.as_deref(), Some("author"));

        let updated = db.update_post(post.id, &input("renamed")).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.created_at, post.created_at);

        db.delete_post(post.id).await.unwrap();
        assert!(db.get_post(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_post() {
        let db = seeded_db().await;
        assert!(matches!(
            db.update_post(42, &input("x")).await.unwrap_err(),
            DatabaseError::NotFound(_)
        ));
        assert!(matches!(
            db.delete_post(42).await.unwrap_err(),
            DatabaseError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = seeded_db().await;
        let owner = user(&db, "a@example.com", &["client"]).await;
        let first = db.create_post(owner, &input("one")).await.unwrap();
        let second = db.create_post(owner, &input("two")).await.unwrap();

        let ids: Vec<i64> = db.list_posts().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_post_needs_existing_owner() {
        let db = seeded_db().await;
        assert!(db.create_post(777, &input("orphan")).await.is_err());
    }

    #[tokio::test]
    async fn test_resource_carries_owner() {
        let db = seeded_db().await;
        let owner = user(&db, "o@example.com", &["client"]).await;
        let post = db.create_post(owner, &input("mine")).await.unwrap();

        let resource = post.resource();
        assert_eq!(resource.kind, ResourceKind::Post);
        assert_eq!(resource.owner_id, Some(owner));
        assert_eq!(resource.id, post.id);
    }
}
