//! Runtime configuration
//!
//! Loaded from YAML. Resolution order: explicit path, then
//! `./config/autofill.yaml`, then `<config_dir>/receipt-autofill/config.yaml`,
//! then built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use autofill_scheduler::Backoff;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::errors::ConfigError;

pub const LOCAL_CONFIG_PATH: &str = "config/autofill.yaml";
const APP_DIR: &str = "receipt-autofill";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: PolicyConfig,
    pub lifecycle: LifecycleConfig,
    pub attachment: AttachmentConfig,
    pub llm: LlmConfig,
    pub profile: ProfileSettings,
}

/// Confidence thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// At or above: fill without review.
    pub fill_threshold: f64,
    /// Below: treat as unknown.
    pub unknown_threshold: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            fill_threshold: 0.8,
            unknown_threshold: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub settle_delay_ms: u64,
    pub url_poll_ms: u64,
    pub mutation_debounce_ms: u64,
    pub user_cooldown_ms: u64,
    pub max_refills_per_page: u32,
    pub min_empty_fields: usize,
    pub empty_scan_groups: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1500,
            url_poll_ms: 500,
            mutation_debounce_ms: 800,
            user_cooldown_ms: 3000,
            max_refills_per_page: 1,
            min_empty_fields: 2,
            empty_scan_groups: 8,
        }
    }
}

impl LifecycleConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn url_poll(&self) -> Duration {
        Duration::from_millis(self.url_poll_ms)
    }

    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    pub fn user_cooldown(&self) -> Duration {
        Duration::from_millis(self.user_cooldown_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    /// How often to look for the upload control at first.
    pub poll_interval_ms: u64,
    /// Added to the wait after every miss, up to `max_poll_interval_ms`.
    pub poll_backoff_step_ms: u64,
    pub max_poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    /// Wait before inspecting what the host did with an assigned file.
    pub confirm_delay_ms: u64,
    pub confirm_attempts: u32,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            poll_backoff_step_ms: 250,
            max_poll_interval_ms: 3000,
            max_poll_attempts: 30,
            confirm_delay_ms: 1500,
            confirm_attempts: 3,
        }
    }
}

impl AttachmentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Poll interval growth: linear by `poll_backoff_step_ms`, never below
    /// the base interval.
    pub fn poll_backoff(&self) -> Backoff {
        let max = self.max_poll_interval_ms.max(self.poll_interval_ms);
        Backoff::Linear {
            step: Duration::from_millis(self.poll_backoff_step_ms),
            max: Duration::from_millis(max),
        }
    }

    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }
}

/// OpenAI-compatible chat completions endpoint used by the record parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Profile defaults handed to the record parser.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub purchaser_name: String,
    pub net_id: String,
    pub club_name: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let PolicyConfig {
            fill_threshold,
            unknown_threshold,
        } = self.policy;
        for (name, value) in [
            ("fill_threshold", fill_threshold),
            ("unknown_threshold", unknown_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "policy.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if unknown_threshold >= fill_threshold {
            return Err(ConfigError::Invalid(format!(
                "policy.unknown_threshold ({unknown_threshold}) must be below fill_threshold ({fill_threshold})"
            )));
        }
        if self.lifecycle.url_poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "lifecycle.url_poll_ms must be positive".into(),
            ));
        }
        if self.attachment.poll_interval_ms == 0 || self.attachment.confirm_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "attachment intervals must be positive".into(),
            ));
        }
        Ok(())
    }

    pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Config = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let serialized = serde_yaml::to_string(self)?;
        fs::write(path, serialized)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

/// Where configuration is read from when no path is given.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let local = PathBuf::from(LOCAL_CONFIG_PATH);
    if local.exists() {
        return Ok(local);
    }
    let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    path.push(APP_DIR);
    path.push("config.yaml");
    Ok(path)
}

/// Loads configuration, falling back to defaults when the file is absent.
pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if path.exists() {
        let config = Config::from_file(&path).await?;
        info!("Loaded configuration from: {}", path.display());
        Ok(LoadedConfig { config, path })
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
        Ok(LoadedConfig {
            config: Config::default(),
            path,
        })
    }
}
