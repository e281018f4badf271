//! Tests for configuration loading.

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use cdm_narrative::config::{NarrativeConfig, DEFAULT_API_BASE_URL};
use cdm_narrative::error::NarrativeError;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 3] = [
    "NARRATIVE_API_URL",
    "NARRATIVE_REQUEST_TIMEOUT_SECS",
    "NARRATIVE_CACHE_HIT_DELAY_MS",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clean_env() -> (std::sync::MutexGuard<'static, ()>, EnvGuard) {
    let lock = env_lock_guard();
    let guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    (lock, guard)
}

#[test]
fn from_env_without_overrides_uses_defaults() {
    let _env = clean_env();

    let config = NarrativeConfig::from_env();

    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.request_timeout, Duration::from_secs(120));
    assert_eq!(config.cache_hit_delay, Duration::ZERO);
}

#[test]
fn from_env_applies_overrides() {
    let _env = clean_env();
    std::env::set_var("NARRATIVE_API_URL", "https://narratives.example.com/api");
    std::env::set_var("NARRATIVE_REQUEST_TIMEOUT_SECS", "15");
    std::env::set_var("NARRATIVE_CACHE_HIT_DELAY_MS", "2000");

    let config = NarrativeConfig::from_env();

    assert_eq!(config.api_base_url, "https://narratives.example.com/api");
    assert_eq!(config.request_timeout, Duration::from_secs(15));
    assert_eq!(config.cache_hit_delay, Duration::from_secs(2));
}

#[test]
fn from_env_ignores_non_numeric_values() {
    let _env = clean_env();
    std::env::set_var("NARRATIVE_CACHE_HIT_DELAY_MS", "two seconds");

    let config = NarrativeConfig::from_env();

    assert_eq!(config.cache_hit_delay, Duration::ZERO);
}

#[test]
fn load_from_path_reads_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "api_base_url = \"http://10.0.0.5:8000/api\"\nrequest_timeout_secs = 30\ncache_hit_delay_ms = 1500\n",
    )
    .unwrap();

    let config = NarrativeConfig::load_from_path(&path).unwrap();

    assert_eq!(
        config,
        NarrativeConfig::builder()
            .api_base_url("http://10.0.0.5:8000/api")
            .request_timeout(Duration::from_secs(30))
            .cache_hit_delay(Duration::from_millis(1500))
            .build()
    );
}

#[test]
fn load_from_missing_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = NarrativeConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, NarrativeError::Io(_)));
}

#[test]
fn invalid_toml_is_reported() {
    let err = NarrativeConfig::from_toml_str("api_base_url = ").unwrap_err();
    assert!(matches!(err, NarrativeError::Toml(_)));
    assert!(err.to_string().starts_with("Config file error"));
}

#[test]
fn default_config_path_names_the_crate() {
    if let Some(path) = NarrativeConfig::default_config_path() {
        assert!(path.ends_with("config.toml"));
        assert!(path.to_string_lossy().contains("cdm-narrative"));
    }
}
