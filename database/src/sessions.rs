//! Housekeeping for the HTTP session table.
//!
//! Rows are written and read by the API's session store; this side only
//! removes the ones that have expired.

use tracing::debug;

use crate::{Database, Result};

impl Database {
    /// Delete sessions whose expiry lies in the past. Returns how many went.
    pub async fn delete_expired_sessions(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("DELETE FROM tower_sessions WHERE expiry_date < ?")
            .bind(now)
            .execute(self.pool())
            .await?;

        debug!("Removed {} expired sessions", result.rows_affected());
        Ok(result.rows_affected())
    }

    pub async fn session_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tower_sessions")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
