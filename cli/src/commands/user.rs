use anyhow::{anyhow, Context, Result};
use colored::*;
use database::NewUser;
use tracing::info;

use super::Format;
use crate::context::AppContext;

const MIN_PASSWORD_CHARS: usize = 8;

/// Length is counted in characters, not bytes.
fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(anyhow!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        ));
    }
    Ok(())
}

/// Create a user with a hashed password and the given roles.
pub async fn create(
    ctx: &AppContext,
    name: String,
    email: String,
    password: String,
    roles: Vec<String>,
) -> Result<()> {
    ctx.engine.registry().ensure_known(&roles)?;
    check_password(&password)?;

    let db = ctx.database().await?;
    let password_hash = api::password::hash_password(&password)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    let user = db
        .create_user(&NewUser {
            name,
            email,
            password_hash,
        })
        .await
        .context("Failed to create user")?;
    let roles = db.sync_roles(user.id, &roles).await?;
    info!("Created user {} with roles {:?}", user.id, roles);

    println!(
        "{} user {} <{}> with roles [{}]",
        "Created".green().bold(),
        user.id,
        user.email,
        roles.join(", ")
    );
    Ok(())
}

/// Replace the roles of the user with `email`.
pub async fn assign_roles(ctx: &AppContext, email: String, roles: Vec<String>) -> Result<()> {
    ctx.engine.registry().ensure_known(&roles)?;

    let db = ctx.database().await?;
    let user = db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| anyhow!("No user with email {}", email))?;
    let roles = db.sync_roles(user.id, &roles).await?;

    let current = db
        .user_with_roles(user.id)
        .await?
        .ok_or_else(|| anyhow!("User {} disappeared", user.id))?;
    let principal = ctx.engine.principal(&current);

    println!(
        "{} roles of {}: [{}] (primary: {})",
        "Updated".green().bold(),
        user.email,
        roles.join(", "),
        principal.role.as_deref().unwrap_or("none")
    );
    Ok(())
}

/// List users with their roles.
pub async fn list(ctx: &AppContext, format: Format) -> Result<()> {
    let db = ctx.database().await?;

    let mut rows = Vec::new();
    for user in db.list_users().await? {
        let roles = db.user_roles(user.id).await?;
        rows.push(serde_json::json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "roles": roles,
        }));
    }

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        Format::Yaml => println!("{}", serde_yaml::to_string(&rows)?),
        Format::Text => {
            println!("{}", "=== Users ===".bold());
            for row in &rows {
                let roles: Vec<&str> = row["roles"]
                    .as_array()
                    .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
                    .unwrap_or_default();
                println!(
                    "{:>4}  {}  {}",
                    row["id"],
                    row["email"].as_str().unwrap_or("").cyan(),
                    roles.join(", ").yellow()
                );
            }
            println!("{}", format!("Total users: {}", rows.len()).green());
        }
    }

    Ok(())
}
