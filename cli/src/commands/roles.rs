use anyhow::Result;
use colored::*;
use serde_json::json;

use super::Format;
use crate::context::AppContext;

/// List the configured roles and their permissions.
pub fn list(ctx: &AppContext, format: Format) -> Result<()> {
    let roles: Vec<_> = ctx
        .engine
        .registry()
        .roles()
        .iter()
        .map(|role| {
            json!({
                "name": role.name,
                "permissions": authz::permission::names(&role.permissions),
            })
        })
        .collect();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&roles)?),
        Format::Yaml => println!("{}", serde_yaml::to_string(&roles)?),
        Format::Text => {
            println!("{}", "=== Roles ===".bold());
            for role in ctx.engine.registry().roles() {
                let section = ctx
                    .engine
                    .route_guard()
                    .home_of(&role.name)
                    .map(|s| s.root.clone())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} (section: {})",
                    role.name.cyan().bold(),
                    section.yellow()
                );
                if role.permissions.is_empty() {
                    println!("  {}", "no permissions".white());
                }
                for permission in &role.permissions {
                    println!("  {}", permission.as_str().green());
                }
            }
            println!();
            println!("{}", format!("Total roles: {}", roles.len()).green());
        }
    }

    Ok(())
}
