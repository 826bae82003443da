use anyhow::{anyhow, Result};
use api::{start_server_with_config, ApiConfig, AppState};
use std::sync::Arc;
use tracing::info;

use crate::context::AppContext;

pub async fn execute(ctx: AppContext, config: ApiConfig) -> Result<()> {
    let db = ctx.database().await?;
    info!(
        "Serving {} roles from {}",
        ctx.engine.registry().roles().len(),
        ctx.paths.database_path().display()
    );

    let state = AppState::new(db, Arc::new(ctx.engine));
    start_server_with_config(state, config)
        .await
        .map_err(|e| anyhow!("API server error: {}", e))
}
