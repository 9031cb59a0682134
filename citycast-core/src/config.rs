use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::coordinator::Settings;

/// Environment variable that takes precedence over `api_key` in the file.
pub const API_KEY_ENV: &str = "WEATHERAPI_KEY";

pub const DEFAULT_CITY: &str = "Istanbul";
pub const DEFAULT_FORECAST_DAYS: u8 = 7;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1200;
pub const DEFAULT_MIN_QUERY_CHARS: usize = 3;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "Istanbul"
/// forecast_days = 7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// City loaded on startup.
    pub default_city: String,

    pub forecast_days: u8,

    /// Quiet period before a search query is issued.
    pub debounce_ms: u64,

    /// Queries shorter than this are never sent. Values below 3 are raised to 3.
    pub min_query_chars: usize,

    /// Start from the last chosen city instead of `default_city`.
    pub resume_last_city: bool,

    /// Per-request HTTP timeout. Unset means requests may hang indefinitely.
    pub request_timeout_secs: Option<u64>,

    /// Override for the WeatherAPI.com endpoint root.
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: DEFAULT_CITY.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            resume_last_city: false,
            request_timeout_secs: None,
            base_url: None,
        }
    }
}

impl Config {
    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Coordinator settings derived from this config.
    pub fn settings(&self) -> Settings {
        Settings {
            debounce: Duration::from_millis(self.debounce_ms),
            min_query_chars: self.min_query_chars.max(DEFAULT_MIN_QUERY_CHARS),
            default_city: self.default_city.clone(),
            forecast_days: self.forecast_days.max(1),
        }
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "citycast", "citycast")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

fn resolve_api_key(from_env: Option<String>, from_file: Option<&str>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| from_file.filter(|k| !k.trim().is_empty()).map(str::to_owned))
}
