//! Configuration file parsing for .mealgate.toml

use anyhow::{Context, Result};
use chrono::Duration as TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::remote::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

pub const CONFIG_FILENAME: &str = ".mealgate.toml";

/// Environment variable overriding `remote.base_url`.
pub const API_URL_ENV: &str = "MEALGATE_API_URL";

/// Upper bound for `trial.duration_hours` (ten years).
pub const MAX_TRIAL_HOURS: u64 = 24 * 365 * 10;
/// Upper bound for `subscription.cache_ttl_minutes` (thirty days).
pub const MAX_CACHE_TTL_MINUTES: u64 = 60 * 24 * 30;
/// Lower bound for `gate.poll_interval_ms`.
pub const MIN_POLL_INTERVAL_MS: u64 = 1_000;

/// Main configuration structure for .mealgate.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealgateConfig {
    #[serde(default)]
    pub trial: TrialConfig,

    #[serde(default)]
    pub subscription: SubscriptionConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Length of the free trial
    #[serde(default = "default_trial_hours")]
    pub duration_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// How long a remote answer may be reused when the backend is unreachable
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Background refresh period
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Hard limit for one refresh before the gate resolves without the remote
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Paths reachable even when access is denied
    #[serde(default = "default_allow_list")]
    pub allow_list: Vec<String>,

    /// Where a signed-out user is sent
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Backend base URL: can also be set via MEALGATE_API_URL env var
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// The subset of configuration the ledger needs.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    pub trial_duration: TimeDelta,
    pub cache_ttl: TimeDelta,
}

// Default functions
fn default_trial_hours() -> u64 {
    24
}

fn default_cache_ttl_minutes() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    2 * 60 * 1000
}

fn default_resolve_timeout_ms() -> u64 {
    5_000
}

fn default_allow_list() -> Vec<String> {
    vec![
        "/payment".to_string(),
        "/settings".to_string(),
        "/login".to_string(),
        "/signup".to_string(),
    ]
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for MealgateConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty TOML should parse to defaults")
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            duration_hours: default_trial_hours(),
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: default_cache_ttl_minutes(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            resolve_timeout_ms: default_resolve_timeout_ms(),
            allow_list: default_allow_list(),
            login_path: default_login_path(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        MealgateConfig::default().lifecycle()
    }
}

impl GateConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}

impl RemoteConfig {
    /// Base URL with the env override applied.
    pub fn effective_base_url(&self) -> String {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.base_url.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MealgateConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: MealgateConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Find and load .mealgate.toml from the current directory or ancestors
    pub fn find_and_load(start_dir: &Path) -> Result<Self> {
        let mut current = start_dir;

        loop {
            let config_path = current.join(CONFIG_FILENAME);
            if config_path.exists() {
                return Self::from_file(&config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // No config found, use defaults
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Rejects values the gate cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.trial.duration_hours > MAX_TRIAL_HOURS {
            anyhow::bail!(
                "trial.duration_hours must be at most {MAX_TRIAL_HOURS}, got {}",
                self.trial.duration_hours
            );
        }
        if self.subscription.cache_ttl_minutes > MAX_CACHE_TTL_MINUTES {
            anyhow::bail!(
                "subscription.cache_ttl_minutes must be at most {MAX_CACHE_TTL_MINUTES}, got {}",
                self.subscription.cache_ttl_minutes
            );
        }
        if self.gate.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            anyhow::bail!(
                "gate.poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}, got {}",
                self.gate.poll_interval_ms
            );
        }
        if self.gate.resolve_timeout_ms == 0 {
            anyhow::bail!("gate.resolve_timeout_ms must be greater than 0");
        }
        if self.remote.timeout_secs == 0 {
            anyhow::bail!("remote.timeout_secs must be greater than 0");
        }
        Ok(())
    }

    /// Durations for the ledger. Out-of-range values are clamped to the
    /// bounds `validate` enforces.
    pub fn lifecycle(&self) -> LifecycleConfig {
        let hours = self.trial.duration_hours.min(MAX_TRIAL_HOURS) as i64;
        let minutes = self.subscription.cache_ttl_minutes.min(MAX_CACHE_TTL_MINUTES) as i64;
        LifecycleConfig {
            trial_duration: TimeDelta::hours(hours),
            cache_ttl: TimeDelta::minutes(minutes),
        }
    }
}
