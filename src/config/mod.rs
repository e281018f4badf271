//! Configuration system (layered: code > env > config file > defaults).

use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::error::NarrativeError;

/// Default service base URL, matching the service's development setup.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

const ENV_API_URL: &str = "NARRATIVE_API_URL";
const ENV_REQUEST_TIMEOUT: &str = "NARRATIVE_REQUEST_TIMEOUT_SECS";
const ENV_CACHE_HIT_DELAY: &str = "NARRATIVE_CACHE_HIT_DELAY_MS";

/// Client configuration.
///
/// ```
/// use std::time::Duration;
/// use cdm_narrative::config::NarrativeConfig;
///
/// let config = NarrativeConfig::builder()
///     .api_base_url("https://narratives.example.com/api")
///     .cache_hit_delay(Duration::from_secs(2))
///     .build();
/// assert_eq!(
///     config.resolve_endpoint("/trades/T1/narrative"),
///     "https://narratives.example.com/api/trades/T1/narrative"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct NarrativeConfig {
    /// Base URL that relative endpoints are resolved against.
    #[builder(into, default = DEFAULT_API_BASE_URL.to_string())]
    pub api_base_url: String,
    /// Timeout applied to request/response calls. Streams are not bounded by it.
    #[builder(default = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))]
    pub request_timeout: Duration,
    /// Presentation delay before revealing a narrative served from storage.
    /// Zero disables it.
    #[builder(default = Duration::ZERO)]
    pub cache_hit_delay: Duration,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// On-disk shape of the TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    cache_hit_delay_ms: Option<u64>,
}

impl NarrativeConfig {
    /// Defaults overlaid with environment variables (`.env` is loaded if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Default config file (if it exists) overlaid with environment variables.
    pub fn load() -> Result<Self, NarrativeError> {
        let _ = dotenvy::dotenv();
        let mut config = match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, NarrativeError> {
        let file: ConfigFile = toml::from_str(raw)?;
        let mut config = Self::default();
        if let Some(url) = file.api_base_url {
            config.api_base_url = url;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.cache_hit_delay_ms {
            config.cache_hit_delay = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file from a specific path.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, NarrativeError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Platform config location, e.g. `~/.config/cdm-narrative/config.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cdm-narrative")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolve an endpoint against the base URL.
    ///
    /// Absolute `http(s)` URLs pass through untouched.
    pub fn resolve_endpoint(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn validate(&self) -> Result<(), NarrativeError> {
        if self.api_base_url.trim().is_empty() {
            return Err(NarrativeError::Configuration(
                "api_base_url must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        if let Some(secs) = env_u64(ENV_REQUEST_TIMEOUT) {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64(ENV_CACHE_HIT_DELAY) {
            self.cache_hit_delay = Duration::from_millis(ms);
        }
    }
}

fn env_u64(var: &str) -> Option<u64> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var, value = %raw, "Ignoring non-numeric environment override");
            None
        }
    }
}
