//! Host wiring: the CLI's stand-in for the hosting application
//!
//! Owns the file-backed store (`~/.config/mealgate/`), the system clock and the
//! HTTP backend client, and hands them to the ledger and gate controller.

use anyhow::{Context, Result};
use mealgate_core::user::current_user;
use mealgate_core::{
    AccessLedger, Clock, ControllerOptions, FileStore, GateController, HttpStatusClient,
    KeyValueStore, MealgateConfig, StatusClient, SystemClock, UserProfile,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const STORE_FILENAME: &str = "store.json";

/// Returns `~/.config/mealgate/store.json`.
pub fn default_store_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("mealgate").join(STORE_FILENAME))
}

/// The `--store` override if given, otherwise the default location.
pub fn resolve_store_path(store: Option<&Path>) -> Result<PathBuf> {
    match store {
        Some(path) => Ok(path.to_path_buf()),
        None => default_store_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

pub struct Host {
    pub config: MealgateConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub remote: Arc<dyn StatusClient>,
}

impl Host {
    /// Loads `.mealgate.toml` from the working directory (or an ancestor),
    /// opens the store and builds the HTTP client.
    pub fn load(store: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let config = MealgateConfig::find_and_load(&cwd)?;

        let store_path = resolve_store_path(store)?;
        let store = FileStore::open(&store_path)
            .with_context(|| format!("Failed to open store {}", store_path.display()))?;

        let base_url = config.remote.effective_base_url();
        let remote = HttpStatusClient::new(&base_url, config.remote.timeout())
            .with_context(|| format!("Failed to build client for {base_url}"))?;
        tracing::debug!(store = %store_path.display(), %base_url, "Host loaded");

        Ok(Self::with_parts(
            config,
            Arc::new(store),
            Arc::new(SystemClock),
            Arc::new(remote),
        ))
    }

    pub fn with_parts(
        config: MealgateConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        remote: Arc<dyn StatusClient>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            remote,
        }
    }

    pub fn user(&self) -> Option<UserProfile> {
        current_user(self.store.as_ref()).ok()
    }

    /// Ledger for the signed-in user.
    pub fn ledger(&self) -> Result<AccessLedger> {
        AccessLedger::for_current_user(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            Arc::clone(&self.remote),
            self.config.lifecycle(),
        )
        .context("Run `mealgate login --uid <id>` first")
    }

    pub fn options(&self) -> ControllerOptions {
        ControllerOptions::from(&self.config.gate)
    }

    /// Mounts a gate the way the hosting application would on page load.
    pub fn mount(&self, path: &str) -> GateController {
        GateController::mount_for_current_user(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            Arc::clone(&self.remote),
            self.config.lifecycle(),
            self.options(),
            path,
        )
    }
}
