use crate::utils::env_paths::EnvPaths;
use anyhow::Result;
use authz::{AuthzConfig, AuthzEngine};
use colored::*;
use database::Database;
use serde_json::json;
use std::time::Duration;

use super::Format;

/// Execute the health check command
pub async fn execute(format: Format, api_url: String) -> Result<()> {
    let health_status = check_system_health(&api_url).await;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&health_status)?),
        Format::Yaml => println!("{}", serde_yaml::to_string(&health_status)?),
        Format::Text => print_health_status_text(&health_status),
    }

    Ok(())
}

/// Check the health of various system components
async fn check_system_health(api_url: &str) -> serde_json::Value {
    let components = json!({
        "database": check_database_health().await,
        "configuration": check_configuration_health(),
        "api": check_api_health(api_url).await,
    });

    let all_healthy = components
        .as_object()
        .map(|c| {
            c.values()
                .all(|v| v["status"].as_str().unwrap_or("unknown") == "healthy")
        })
        .unwrap_or(false);

    json!({
        "status": if all_healthy { "healthy" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": components,
    })
}

/// Check database health
async fn check_database_health() -> serde_json::Value {
    let env_paths = match EnvPaths::load() {
        Ok(paths) => paths,
        Err(e) => {
            return json!({
                "status": "unhealthy",
                "message": format!("Failed to load environment paths: {}", e)
            });
        }
    };

    let db_path = env_paths.database_path();
    if !db_path.exists() {
        return json!({
            "status": "not_initialized",
            "message": "Database file does not exist yet (run `pbctl seed`)",
            "path": db_path.display().to_string()
        });
    }

    let result = async {
        let db = Database::connect(&db_path, 1).await?;
        db.ping().await?;
        let roles = db.role_names().await?;
        Ok::<_, database::DatabaseError>(roles)
    }
    .await;

    match result {
        Ok(roles) => json!({
            "status": "healthy",
            "message": format!("Database reachable, {} roles seeded", roles.len()),
            "path": db_path.display().to_string(),
            "roles": roles
        }),
        Err(e) => json!({
            "status": "unhealthy",
            "message": format!("Database exists but cannot be accessed: {}", e),
            "path": db_path.display().to_string()
        }),
    }
}

/// Check configuration health
fn check_configuration_health() -> serde_json::Value {
    let env_paths = match EnvPaths::load() {
        Ok(paths) => paths,
        Err(e) => {
            return json!({
                "status": "unhealthy",
                "message": format!("Failed to load environment paths: {}", e)
            });
        }
    };
    let path = &env_paths.authz_config_path;

    let loaded = AuthzConfig::load_or_default(path)
        .and_then(|config| AuthzEngine::from_config(&config));

    match loaded {
        Ok(engine) => json!({
            "status": "healthy",
            "message": if path.exists() {
                format!("Configuration valid at {}", path.display())
            } else {
                "No configuration file, using built-in roles".to_string()
            },
            "roles": engine
                .registry()
                .roles()
                .iter()
                .map(|r| r.name.clone())
                .collect::<Vec<_>>()
        }),
        Err(e) => json!({
            "status": "unhealthy",
            "message": format!("Configuration invalid: {}", e)
        }),
    }
}

/// Check API health
async fn check_api_health(base_url: &str) -> serde_json::Value {
    let api_url = format!("{}/api/v1/health", base_url.trim_end_matches('/'));

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            return json!({
                "status": "unhealthy",
                "message": format!("Failed to build HTTP client: {}", e),
                "endpoint": base_url
            });
        }
    };

    match client.get(&api_url).send().await {
        Ok(response) if response.status().is_success() => {
            let version = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body["version"].as_str().map(str::to_string));
            json!({
                "status": "healthy",
                "message": "API server is running and responsive",
                "endpoint": base_url,
                "version": version
            })
        }
        Ok(response) => json!({
            "status": "unhealthy",
            "message": format!("API server returned status: {}", response.status()),
            "endpoint": base_url
        }),
        Err(_) => json!({
            "status": "offline",
            "message": "API server is not running or not reachable",
            "endpoint": base_url
        }),
    }
}

/// Print health status in a formatted text output
fn print_health_status_text(status: &serde_json::Value) {
    println!("{}", "=== Postboard System Health Check ===".bold());
    println!();

    let overall_status = status["status"].as_str().unwrap_or("unknown");
    let status_display = match overall_status {
        "healthy" => "HEALTHY".green().bold(),
        "degraded" => "DEGRADED".yellow().bold(),
        "unhealthy" => "UNHEALTHY".red().bold(),
        _ => "UNKNOWN".white().bold(),
    };

    println!("Overall Status: {}", status_display);
    println!("Timestamp: {}", status["timestamp"].as_str().unwrap_or(""));
    println!();

    println!("{}", "Components:".bold());
    println!("{}", "─".repeat(50));

    if let Some(components) = status["components"].as_object() {
        for (name, component) in components {
            let comp_status = component["status"].as_str().unwrap_or("unknown");
            let status_icon = match comp_status {
                "healthy" => "✓".green(),
                "unhealthy" => "✗".red(),
                "offline" | "not_initialized" => "○".white(),
                _ => "?".white(),
            };

            let status_text = match comp_status {
                "healthy" => comp_status.green(),
                "unhealthy" => comp_status.red(),
                _ => comp_status.white(),
            };

            println!(
                "{} {} ({})",
                status_icon,
                name.to_uppercase().bold(),
                status_text
            );

            if let Some(message) = component["message"].as_str() {
                println!("  {}", message);
            }

            if let Some(roles) = component["roles"].as_array() {
                let roles: Vec<&str> = roles.iter().filter_map(|r| r.as_str()).collect();
                if !roles.is_empty() {
                    println!("  Roles: {}", roles.join(", "));
                }
            }

            println!();
        }
    }
}
