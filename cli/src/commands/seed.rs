use anyhow::{Context, Result};
use colored::*;
use database::Database;
use tracing::info;

use crate::context::AppContext;

/// Create the schema and sync the role tables with the configured roles.
pub async fn execute(ctx: &AppContext) -> Result<()> {
    let path = ctx.paths.database_path();
    let db = Database::connect(&path, 1)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    db.migrate().await.context("Migration failed")?;

    let report = db
        .seed_roles(ctx.engine.registry())
        .await
        .context("Seeding roles failed")?;
    info!("Seeded {}", path.display());

    println!("{}", "=== Role Seeding ===".bold());
    println!("Database: {}", path.display().to_string().green());
    for (label, names) in [
        ("created", &report.created),
        ("updated", &report.updated),
        ("unchanged", &report.unchanged),
    ] {
        if !names.is_empty() {
            println!("  {:<10} {}", label.cyan(), names.join(", "));
        }
    }
    if report.is_noop() {
        println!("{}", "Nothing to do, roles already in sync".yellow());
    }

    Ok(())
}
