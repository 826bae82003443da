pub mod check;
pub mod config;
pub mod health;
pub mod roles;
pub mod seed;
pub mod serve;
pub mod user;

/// Output format shared by the read-only commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml,
}
