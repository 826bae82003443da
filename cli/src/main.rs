use anyhow::Result;
use api::ApiConfig;
use clap::{Parser, Subcommand};
use colored::*;

mod commands;
mod context;
mod logging;
mod utils;

use commands::{check, config, health, roles, seed, serve, user, Format};
use context::AppContext;
use utils::env_paths::EnvPaths;

/// Postboard CLI - roles, users and access checks for the Postboard API
#[derive(Parser)]
#[command(name = "pbctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database, run migrations and seed the configured roles
    Seed,

    /// Run the HTTP API
    Serve {
        #[arg(long, env = "API_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, env = "API_PORT", default_value_t = 3030)]
        port: u16,

        /// Mark the session cookie Secure (behind TLS)
        #[arg(long)]
        secure_cookies: bool,
    },

    /// Inspect roles
    Roles {
        #[command(subcommand)]
        action: RolesAction,
    },

    /// Manage users and their role assignments
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Evaluate access-control decisions without a running server
    Check {
        #[command(subcommand)]
        action: CheckAction,
    },

    /// Access-control configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check system health and status
    Health {
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Base URL of the API server to check
        #[arg(long, env = "API_URL", default_value = "http://127.0.0.1:3030")]
        url: String,
    },
}

#[derive(Subcommand)]
enum RolesAction {
    /// List roles with their permissions
    List {
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Role to assign (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
    },

    /// Replace a user's roles
    AssignRoles {
        #[arg(long)]
        email: String,

        /// Role to assign (repeatable, none clears all roles)
        #[arg(long = "role")]
        roles: Vec<String>,
    },

    /// List users with their roles
    List {
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Subcommand)]
enum CheckAction {
    /// Route guard decision for a navigation
    Route {
        /// Target path, e.g. /admin/users
        path: String,

        /// Primary role of the session
        #[arg(long)]
        role: Option<String>,

        /// Treat the session as not logged in
        #[arg(long, conflicts_with = "role")]
        anonymous: bool,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Whether a permission-guarded fragment renders for a set of roles
    Perms {
        /// Role held by the user (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Required permissions
        #[arg(required = true)]
        permissions: Vec<String>,

        /// Render when any permission is held instead of all
        #[arg(long)]
        any: bool,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Policy decision for an action on a resource
    Policy {
        /// Acting user id
        #[arg(long, default_value_t = 1)]
        user_id: i64,

        /// Role held by the user (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,

        /// create, read, update, delete or manage
        action: String,

        /// post, project or user
        kind: String,

        /// Id of an existing resource
        #[arg(long)]
        id: Option<i64>,

        /// Owner id of the resource
        #[arg(long, requires = "id")]
        owner: Option<i64>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show {
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: Format,
    },

    /// Write the built-in configuration to AUTHZ_CONFIG
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration file
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Only the server keeps a log file; one-shot commands log to stderr.
    let _guard = match &cli.command {
        Commands::Serve { .. } => Some(logging::init_with_file(
            cli.verbose,
            &EnvPaths::load()?.logs_path(),
        )?),
        _ => {
            logging::init_console(cli.verbose);
            None
        }
    };

    match cli.command {
        Commands::Serve {
            host,
            port,
            secure_cookies,
        } => {
            let config = ApiConfig::default()
                .with_host(host)
                .with_port(port)
                .with_secure_cookies(secure_cookies);
            serve::execute(AppContext::load()?, config).await?;
        }
        Commands::Seed => seed::execute(&AppContext::load()?).await?,
        Commands::Roles { action } => match action {
            RolesAction::List { format } => roles::list(&AppContext::load()?, format)?,
        },
        Commands::User { action } => {
            let ctx = AppContext::load()?;
            match action {
                UserAction::Create {
                    name,
                    email,
                    password,
                    roles,
                } => user::create(&ctx, name, email, password, roles).await?,
                UserAction::AssignRoles { email, roles } => {
                    user::assign_roles(&ctx, email, roles).await?
                }
                UserAction::List { format } => user::list(&ctx, format).await?,
            }
        }
        Commands::Check { action } => {
            let ctx = AppContext::load()?;
            match action {
                CheckAction::Route {
                    path,
                    role,
                    anonymous,
                    format,
                } => check::route(&ctx, &path, role, anonymous, format)?,
                CheckAction::Perms {
                    roles,
                    permissions,
                    any,
                    format,
                } => check::perms(&ctx, roles, permissions, any, format)?,
                CheckAction::Policy {
                    user_id,
                    roles,
                    action,
                    kind,
                    id,
                    owner,
                    format,
                } => check::policy(&ctx, user_id, roles, &action, &kind, id, owner, format)?,
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => config::show(format)?,
            ConfigAction::Init { force } => config::init(force)?,
            ConfigAction::Validate => config::validate()?,
        },
        Commands::Health { format, url } => health::execute(format, url).await?,
    }

    Ok(())
}
