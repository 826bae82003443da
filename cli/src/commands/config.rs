use crate::utils::env_paths::EnvPaths;
use anyhow::{anyhow, Context, Result};
use authz::{AuthzConfig, AuthzEngine};
use colored::*;

use super::Format;

/// Print the effective access-control configuration
pub fn show(format: Format) -> Result<()> {
    let env_paths = EnvPaths::load()?;
    let config = AuthzConfig::load_or_default(&env_paths.authz_config_path)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        Format::Yaml => println!("{}", config.to_yaml()?),
        Format::Text => print_config_text(&config, &env_paths),
    }

    Ok(())
}

/// Write the built-in configuration to the configured path
pub fn init(force: bool) -> Result<()> {
    let env_paths = EnvPaths::load()?;
    let path = &env_paths.authz_config_path;

    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(path, AuthzConfig::default().to_yaml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} {}", "Wrote".green().bold(), path.display());
    Ok(())
}

/// Load and validate the configuration without starting anything
pub fn validate() -> Result<()> {
    let env_paths = EnvPaths::load()?;
    let config = AuthzConfig::load_or_default(&env_paths.authz_config_path)?;
    let engine = AuthzEngine::from_config(&config)?;

    println!(
        "{} {} roles, {} sections",
        "Valid:".green().bold(),
        engine.registry().roles().len(),
        engine.route_guard().sections().len()
    );
    Ok(())
}

/// Print configuration in a formatted text output
fn print_config_text(config: &AuthzConfig, env_paths: &EnvPaths) {
    println!("{}", "=== Access-Control Configuration ===".bold());
    println!();
    let source = if env_paths.authz_config_path.exists() {
        env_paths.authz_config_path.display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    println!("{}: {}", "Source".bold(), source.green());
    println!("{}: {}", "Login path".bold(), config.login_path.yellow());
    println!();

    println!("{}", "[roles]".cyan().bold());
    for role in &config.roles {
        println!("  {}: {}", role.name.cyan(), role.permissions.join(", "));
    }
    println!();

    println!("{}", "[sections]".cyan().bold());
    for section in &config.sections {
        println!(
            "  {}: {} (dashboard {})",
            section.role.cyan(),
            section.root.green(),
            section.dashboard
        );
    }
    println!();

    println!(
        "{}",
        format!("Navigation entries: {}", config.navigation.len()).green()
    );
}
