use crate::{create_router, AppState};
use std::time::Duration;
use tracing::{info, warn};

/// How often expired sessions are purged from the database.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub secure_cookies: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            secure_cookies: false,
        }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Start the API server with the given configuration
///
/// Runs until Ctrl-C.
pub async fn start_server_with_config(state: AppState, config: ApiConfig) -> Result<(), ServerError> {
    let sweeper = tokio::spawn(sweep_expired_sessions(state.clone()));
    let app = create_router(state, &config);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!("OpenAPI document at http://{}/api/v1/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("API server stopped");
    Ok(())
}

async fn sweep_expired_sessions(state: AppState) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match state.db.delete_expired_sessions().await {
            Ok(0) => {}
            Ok(removed) => info!("Purged {} expired sessions", removed),
            Err(e) => warn!("Session cleanup failed: {}", e),
        }
    }
}

/// Start the API server with default configuration
pub async fn start_server(state: AppState) -> Result<(), ServerError> {
    start_server_with_config(state, ApiConfig::default()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ApiConfig::new()
            .with_host("0.0.0.0")
            .with_port(8080)
            .with_secure_cookies(true);
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert!(config.secure_cookies);
        assert!(!ApiConfig::default().secure_cookies);
    }
}
