//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and the derived runtime durations.

use crate::error::{NetappDeleterError, Result};
use crate::utils::interactive::validate_subscription_id;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// Which azure_identity credential to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AzureCredentialType {
    #[default]
    Default,
    ClientSecret,
}

impl FromStr for AzureCredentialType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "default" | "defaultazurecredential" => Ok(Self::Default),
            "clientsecret" => Ok(Self::ClientSecret),
            other => Err(format!(
                "Unsupported credential type '{other}' (expected 'default' or 'clientsecret')"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub credential_type: AzureCredentialType,
    pub workers: usize,
    pub account_delete_attempts: u32,
    pub account_retry_delay_secs: u64,
    pub poll_interval_secs: u64,
    pub operation_timeout_secs: u64,
    pub delete_resource_groups: bool,
    pub arm_endpoint: String,
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            subscription_id: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            credential_type: AzureCredentialType::Default,
            workers: DEFAULT_WORKERS,
            account_delete_attempts: 3,
            account_retry_delay_secs: 30,
            poll_interval_secs: 5,
            operation_timeout_secs: 3600,
            delete_resource_groups: true,
            arm_endpoint: DEFAULT_ARM_ENDPOINT.to_string(),
            no_color: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(NetappDeleterError::config("workers must be at least 1"));
        }

        if self.account_delete_attempts == 0 {
            return Err(NetappDeleterError::config(
                "account_delete_attempts must be at least 1",
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(NetappDeleterError::config(
                "poll_interval_secs must be at least 1",
            ));
        }

        if !self.subscription_id.is_empty() {
            validate_subscription_id(&self.subscription_id)
                .map_err(|e| NetappDeleterError::config(format!("Invalid subscription ID: {e}")))?;
        }

        url::Url::parse(&self.arm_endpoint).map_err(|e| {
            NetappDeleterError::config(format!("Invalid ARM endpoint '{}': {e}", self.arm_endpoint))
        })?;

        if self.credential_type == AzureCredentialType::ClientSecret {
            for (field, value) in [
                ("tenant_id", &self.tenant_id),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ] {
                if value.is_empty() {
                    return Err(NetappDeleterError::config(format!(
                        "{field} is required for client secret authentication"
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| NetappDeleterError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("netapp-deleter").join("config.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| NetappDeleterError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("netapp-deleter").join("config.toml"))
        }
    }

    pub fn account_retry_delay(&self) -> Duration {
        Duration::from_secs(self.account_retry_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// Load configuration with priority order (CLI flags are applied later by
/// the caller):
/// 1. Environment variables
/// 2. Configuration file
/// 3. Default values
pub async fn load_config() -> Result<Config> {
    let config_path = Config::get_config_path()?;
    load_config_from(&config_path, |key| std::env::var(key).ok()).await
}

pub async fn load_config_from<F>(path: &Path, env_lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if path.exists() {
        load_from_file(path).await?
    } else {
        Config::default()
    };

    apply_env(&mut config, env_lookup);
    Ok(config)
}

async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;
    let config = toml::from_str::<Config>(&contents)?;
    Ok(config)
}

pub fn apply_env<F>(config: &mut Config, env_lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env_lookup("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = env_lookup("AZURE_SUBSCRIPTION_ID") {
        config.subscription_id = value;
    }

    if let Some(value) = env_lookup("AZURE_TENANT_ID") {
        config.tenant_id = value;
    }

    if let Some(value) = env_lookup("AZURE_CLIENT_ID") {
        config.client_id = value;
    }

    if let Some(value) = env_lookup("AZURE_CLIENT_SECRET") {
        config.client_secret = value;
    }

    if let Some(value) = env_lookup("AZURE_CREDENTIAL_TYPE") {
        match value.parse::<AzureCredentialType>() {
            Ok(credential_type) => config.credential_type = credential_type,
            Err(e) => tracing::warn!("Ignoring AZURE_CREDENTIAL_TYPE: {}", e),
        }
    }

    if let Some(value) = env_lookup("NETAPP_DELETER_WORKERS") {
        match value.parse::<usize>() {
            Ok(workers) => config.workers = workers,
            Err(_) => tracing::warn!("Ignoring non-numeric NETAPP_DELETER_WORKERS '{}'", value),
        }
    }
}
