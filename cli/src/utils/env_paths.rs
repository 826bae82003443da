use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment-based path configuration
#[derive(Debug, Clone)]
pub struct EnvPaths {
    pub data_path: PathBuf,
    pub authz_config_path: PathBuf,
}

impl EnvPaths {
    /// Load paths from environment variables with defaults
    pub fn load() -> Result<Self> {
        Self::load_with_base(None)
    }

    /// Load paths from environment variables with an optional base directory
    pub fn load_with_base(base_dir: Option<PathBuf>) -> Result<Self> {
        let base = if let Some(base) = base_dir {
            base
        } else {
            // Try to load .env file if it exists in current directory
            if let Ok(env_path) = env::current_dir() {
                let env_file = env_path.join(".env");
                if env_file.exists() {
                    dotenv::from_path(&env_file).ok();
                }
            }
            env::current_dir().context("Failed to get current directory")?
        };

        Ok(Self {
            data_path: Self::get_path_from_env("DATA_PATH", "./data", &base),
            authz_config_path: Self::get_path_from_env(
                "AUTHZ_CONFIG",
                "./config/authz.yaml",
                &base,
            ),
        })
    }

    /// Get a path from environment variable or use default
    fn get_path_from_env(var_name: &str, default: &str, base_dir: &Path) -> PathBuf {
        let path_str = env::var(var_name).unwrap_or_else(|_| default.to_string());
        let path = PathBuf::from(path_str);

        // If the path is relative, make it relative to the base directory
        if path.is_relative() {
            base_dir.join(path)
        } else {
            path
        }
    }

    /// Get the database path
    pub fn database_path(&self) -> PathBuf {
        self.data_path.join("postboard.db")
    }

    /// Get the logs directory path
    pub fn logs_path(&self) -> PathBuf {
        self.data_path.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Use a mutex to ensure tests don't interfere with each other's environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("DATA_PATH");
        env::remove_var("AUTHZ_CONFIG");
    }

    #[test]
    fn test_env_paths_with_base_dir() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path().to_path_buf();
        let paths = EnvPaths::load_with_base(Some(base_path.clone())).unwrap();

        assert_eq!(paths.data_path, base_path.join("data"));
        assert_eq!(paths.authz_config_path, base_path.join("config/authz.yaml"));
        assert_eq!(paths.database_path(), base_path.join("data/postboard.db"));
        assert_eq!(paths.logs_path(), base_path.join("data/logs"));
    }

    #[test]
    fn test_env_paths_with_relative_env_vars() {
        let _guard = ENV_MUTEX.lock().unwrap();

        env::set_var("DATA_PATH", "./custom_data");
        env::set_var("AUTHZ_CONFIG", "./custom/roles.yaml");

        let paths = EnvPaths::load_with_base(Some(PathBuf::from("/srv/app"))).unwrap();
        assert_eq!(paths.data_path, PathBuf::from("/srv/app/./custom_data"));
        assert!(paths.authz_config_path.ends_with("custom/roles.yaml"));

        clear_env();
    }

    #[test]
    fn test_env_paths_with_absolute_env_vars() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let data = temp_dir.path().join("custom_data");
        env::set_var("DATA_PATH", data.to_str().unwrap());

        let paths = EnvPaths::load_with_base(Some(PathBuf::from("/ignored"))).unwrap();
        assert_eq!(paths.data_path, data);

        clear_env();
    }
}
