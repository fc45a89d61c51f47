//! Access ledger: sole owner of the persisted lifecycle keys
//!
//! Flow for a refresh:
//! 1. Ask the backend for the user's subscription status
//! 2. On success, overwrite the local cache with what it said
//! 3. On transport/parse failure, reuse the cached record if it is within TTL
//!    (or was written by an offline activation), else assume no subscription
//!
//! The trial start is written once per user id and never touched again
//! except by `reset_trial`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::LifecycleConfig;
use crate::error::AccessError;
use crate::keys::{LifecycleKeys, STATUS_ACTIVE, STATUS_NONE};
use crate::remote::{PaymentMetadata, RemoteSubscription, StatusClient};
use crate::store::KeyValueStore;
use crate::user::current_user;
use crate::window::{SubscriptionWindow, TrialWindow};

/// Who wrote a cached subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOrigin {
    /// Mirrors an answer from the backend.
    Remote,
    /// Written after a failed remote activation; the backend may not know it.
    Local,
}

/// Persisted form of a cached subscription (`subscription_record:<uid>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(flatten)]
    pub window: SubscriptionWindow,
    pub cached_at: DateTime<Utc>,
    pub origin: RecordOrigin,
}

/// Where a resolved subscription came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionSource {
    Remote,
    Cache,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResolution {
    /// Active or lapsed window; `None` when no subscription is known.
    pub subscription: Option<SubscriptionWindow>,
    pub source: SubscriptionSource,
}

impl SubscriptionResolution {
    /// Resolution used when the remote could not be consulted and nothing is cached.
    pub fn unavailable() -> Self {
        Self {
            subscription: None,
            source: SubscriptionSource::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RemoteStatus {
    Active(SubscriptionWindow),
    Lapsed(SubscriptionWindow),
    Absent,
}

pub struct AccessLedger {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    remote: Arc<dyn StatusClient>,
    keys: LifecycleKeys,
    config: LifecycleConfig,
}

impl AccessLedger {
    pub fn new(
        user_id: &str,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        remote: Arc<dyn StatusClient>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            clock,
            remote,
            keys: LifecycleKeys::for_user(user_id),
            config,
        }
    }

    /// Builds a ledger for the user recorded under `user_data`.
    pub fn for_current_user(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        remote: Arc<dyn StatusClient>,
        config: LifecycleConfig,
    ) -> Result<Self, AccessError> {
        let user = current_user(store.as_ref())?;
        Ok(Self::new(&user.uid, store, clock, remote, config))
    }

    pub fn user_id(&self) -> &str {
        self.keys.user_id()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    // -- Trial --

    /// Records `now` as the trial start unless one exists. Returns the window.
    pub fn initialize_trial(&self) -> Result<TrialWindow, AccessError> {
        if let Some(existing) = self.trial_window() {
            return Ok(existing);
        }
        let now = self.clock.now();
        self.store.set(&self.keys.trial_start(), &now.to_rfc3339())?;
        info!(user_id = self.user_id(), start = %now, "Trial started");
        Ok(TrialWindow::new(now, self.config.trial_duration))
    }

    pub fn trial_window(&self) -> Option<TrialWindow> {
        let raw = match self.store.get(&self.keys.trial_start()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(user_id = self.user_id(), "Could not read trial start: {e:#}");
                return None;
            }
        };
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(start) => Some(TrialWindow::new(
                start.with_timezone(&Utc),
                self.config.trial_duration,
            )),
            Err(e) => {
                warn!(user_id = self.user_id(), value = %raw, "Ignoring unreadable trial start: {e}");
                None
            }
        }
    }

    /// Deletes every lifecycle key for this user.
    pub fn reset_trial(&self) -> Result<(), AccessError> {
        for key in self.keys.all() {
            self.store.remove(&key)?;
        }
        info!(user_id = self.user_id(), "Lifecycle state reset");
        Ok(())
    }

    // -- Subscription --

    /// One status call. Any failure, or an inactive subscription, yields `None`.
    pub fn fetch_subscription_from_remote(&self) -> Option<SubscriptionWindow> {
        match self.sync_remote_status() {
            Ok(RemoteStatus::Active(window)) => Some(window),
            Ok(_) => None,
            Err(e) => {
                warn!(user_id = self.user_id(), "Subscription status unavailable: {e}");
                None
            }
        }
    }

    /// Refresh-path read: remote answer, else valid cache, else nothing.
    pub fn resolve_subscription(&self) -> SubscriptionResolution {
        match self.sync_remote_status() {
            Ok(RemoteStatus::Active(window)) | Ok(RemoteStatus::Lapsed(window)) => {
                SubscriptionResolution {
                    subscription: Some(window),
                    source: SubscriptionSource::Remote,
                }
            }
            Ok(RemoteStatus::Absent) => SubscriptionResolution {
                subscription: None,
                source: SubscriptionSource::Remote,
            },
            Err(e) => {
                warn!(user_id = self.user_id(), "Falling back to cached subscription: {e}");
                self.cached_resolution()
            }
        }
    }

    /// What the cache alone can say (used when the remote did not answer).
    pub fn cached_resolution(&self) -> SubscriptionResolution {
        match self.cached_subscription() {
            Some(window) => SubscriptionResolution {
                subscription: Some(window),
                source: SubscriptionSource::Cache,
            },
            None => SubscriptionResolution::unavailable(),
        }
    }

    /// Cached window if within TTL, or if it came from an offline activation.
    pub fn cached_subscription(&self) -> Option<SubscriptionWindow> {
        let record = self.cached_record()?;
        let age = self.clock.now() - record.cached_at;
        if record.origin == RecordOrigin::Local || age <= self.config.cache_ttl {
            debug!(user_id = self.user_id(), origin = ?record.origin, "Using cached subscription");
            Some(record.window)
        } else {
            debug!(user_id = self.user_id(), "Cached subscription is past its TTL");
            None
        }
    }

    /// Raw cached record regardless of TTL.
    pub fn cached_record(&self) -> Option<SubscriptionRecord> {
        let raw = match self.store.get(&self.keys.subscription_record()) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(user_id = self.user_id(), "Could not read subscription cache: {e:#}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(user_id = self.user_id(), "Ignoring unreadable subscription cache: {e}");
                None
            }
        }
    }

    /// Remote activation first; on failure, a local-only window keeps the user
    /// unblocked until the next successful fetch replaces it.
    pub fn activate_subscription_for_duration(&self, days: u32, metadata: PaymentMetadata) -> bool {
        if days == 0 {
            warn!(user_id = self.user_id(), "Refusing zero-day activation");
            return false;
        }

        let now = self.clock.now();
        let base = self
            .cached_record()
            .map(|r| r.window.end)
            .filter(|end| *end > now)
            .unwrap_or(now);
        let end = Duration::try_days(i64::from(days)).and_then(|d| base.checked_add_signed(d));
        let Some(end) = end else {
            warn!(
                user_id = self.user_id(),
                days, "Refusing activation past the supported date range"
            );
            return false;
        };
        let window = SubscriptionWindow {
            start: now,
            end,
            plan_id: metadata
                .plan_id
                .clone()
                .unwrap_or_else(|| format!("days-{days}")),
            plan_label: metadata
                .plan_name
                .clone()
                .unwrap_or_else(|| format!("{days}-day access")),
        };

        let origin = match self.remote.activate_days(self.user_id(), days, &metadata) {
            Ok(()) => {
                info!(user_id = self.user_id(), days, "Subscription activated");
                RecordOrigin::Remote
            }
            Err(e) => {
                warn!(
                    user_id = self.user_id(),
                    days, "Remote activation failed, keeping a local window: {e}"
                );
                RecordOrigin::Local
            }
        };

        match self.write_record(&window, origin, true) {
            Ok(()) => true,
            Err(e) => {
                error!(user_id = self.user_id(), "Could not persist activation: {e}");
                false
            }
        }
    }

    /// Confirms a payment with the backend. Errors are returned to the caller.
    pub fn verify_payment(&self, reference: &str) -> Result<Option<SubscriptionWindow>, AccessError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AccessError::Rejected("payment reference is empty".to_string()));
        }

        let Some(remote) = self.remote.verify_payment(reference)? else {
            info!(user_id = self.user_id(), reference, "Payment verified, no subscription attached");
            return Ok(None);
        };
        let window = remote.to_window()?;
        let active = window.is_active(self.clock.now());
        self.write_record(&window, RecordOrigin::Remote, active)?;
        info!(user_id = self.user_id(), reference, active, "Payment verified");
        Ok(Some(window))
    }

    fn sync_remote_status(&self) -> Result<RemoteStatus, AccessError> {
        let data = self.remote.subscription_status(self.user_id())?;
        let now = self.clock.now();

        let status = match data.subscription.as_ref().map(RemoteSubscription::to_window) {
            Some(window) => {
                let window = window?;
                if data.has_active_subscription && window.is_active(now) {
                    RemoteStatus::Active(window)
                } else {
                    RemoteStatus::Lapsed(window)
                }
            }
            None if data.has_active_subscription => {
                return Err(AccessError::Parse(
                    "active subscription reported without dates".to_string(),
                ));
            }
            None => RemoteStatus::Absent,
        };

        if let Err(e) = self.persist_remote_status(&status) {
            warn!(user_id = self.user_id(), "Could not cache subscription status: {e}");
        }
        Ok(status)
    }

    fn persist_remote_status(&self, status: &RemoteStatus) -> Result<(), AccessError> {
        match status {
            RemoteStatus::Active(window) => self.write_record(window, RecordOrigin::Remote, true),
            RemoteStatus::Lapsed(window) => self.write_record(window, RecordOrigin::Remote, false),
            RemoteStatus::Absent => {
                self.store.remove(&self.keys.subscription_record())?;
                self.store.remove(&self.keys.subscription_expires_at())?;
                self.store
                    .set(&self.keys.subscription_status(), STATUS_NONE)?;
                Ok(())
            }
        }
    }

    fn write_record(
        &self,
        window: &SubscriptionWindow,
        origin: RecordOrigin,
        active: bool,
    ) -> Result<(), AccessError> {
        let record = SubscriptionRecord {
            window: window.clone(),
            cached_at: self.clock.now(),
            origin,
        };
        let json =
            serde_json::to_string(&record).map_err(|e| AccessError::Storage(e.to_string()))?;
        self.store.set(&self.keys.subscription_record(), &json)?;
        self.store.set(
            &self.keys.subscription_status(),
            if active { STATUS_ACTIVE } else { STATUS_NONE },
        )?;
        self.store
            .set(&self.keys.subscription_expires_at(), &window.end.to_rfc3339())?;
        Ok(())
    }
}
