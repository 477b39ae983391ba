// src/application/config.rs
//
// Host configuration
//
// Resolved once at startup from the environment. Settings the user can change
// live in the settings document instead.
//
// Path structure: {CONFIG_DIR}/ytmdesk/app-settings.json

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::integrations::update_feed::{DEFAULT_UPDATE_REPOSITORY, DEFAULT_UPDATE_SERVER};
use crate::providers::UpdateOptions;

pub const APP_NAME: &str = "ytmdesk";

pub const ENV_CONFIG_DIR: &str = "YTMDESK_CONFIG_DIR";
pub const ENV_DEV: &str = "YTMDESK_DEV";
pub const ENV_UPDATE_SERVER: &str = "YTMDESK_UPDATE_SERVER";

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub app_name: String,
    pub app_version: String,
    pub config_dir: PathBuf,
    pub is_development: bool,
    pub update_server: String,
    pub update_repository: String,
    /// Executable registered as the login item.
    pub executable: PathBuf,
}

impl HostConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_dir = match lookup(ENV_CONFIG_DIR).filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| {
                    AppError::Other("Could not determine config directory".to_string())
                })?
                .join(APP_NAME),
        };

        let is_development = lookup(ENV_DEV)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(cfg!(debug_assertions));

        let update_server = lookup(ENV_UPDATE_SERVER)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_UPDATE_SERVER.to_string());

        let executable = std::env::current_exe().unwrap_or_else(|_| PathBuf::from(APP_NAME));

        Ok(Self {
            app_name: APP_NAME.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            config_dir,
            is_development,
            update_server,
            update_repository: DEFAULT_UPDATE_REPOSITORY.to_string(),
            executable,
        })
    }

    pub fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            is_development: self.is_development,
            server: self.update_server.clone(),
            repository: self.update_repository.clone(),
            version: self.app_version.clone(),
            check_interval: Duration::from_secs(5 * 60),
            ..UpdateOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_explicit_values() {
        let config = HostConfig::from_lookup(lookup(&[
            (ENV_CONFIG_DIR, "/tmp/ytmdesk-test"),
            (ENV_DEV, "true"),
            (ENV_UPDATE_SERVER, "https://updates.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.config_dir, PathBuf::from("/tmp/ytmdesk-test"));
        assert!(config.is_development);
        assert_eq!(config.update_server, "https://updates.example.com");
        assert_eq!(config.update_repository, DEFAULT_UPDATE_REPOSITORY);
    }

    #[test]
    fn test_dev_flag_parsing() {
        let config =
            HostConfig::from_lookup(lookup(&[(ENV_CONFIG_DIR, "/tmp/x"), (ENV_DEV, "0")])).unwrap();
        assert!(!config.is_development);
        assert_eq!(config.update_server, DEFAULT_UPDATE_SERVER);
    }

    #[test]
    fn test_update_options_carry_host_values() {
        let config = HostConfig::from_lookup(lookup(&[
            (ENV_CONFIG_DIR, "/tmp/x"),
            (ENV_DEV, "1"),
            (ENV_UPDATE_SERVER, "https://u.example.com"),
        ]))
        .unwrap();
        let options = config.update_options();
        assert!(options.is_development);
        assert_eq!(options.server, "https://u.example.com");
        assert_eq!(options.version, env!("CARGO_PKG_VERSION"));
    }
}
