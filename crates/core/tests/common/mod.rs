//! Shared fakes for integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use mealgate_core::{
    AccessError, AccessLedger, Clock, KeyValueStore, LifecycleConfig, ManualClock, MemoryStore,
    PaymentMetadata, RemoteSubscription, StatusClient, StatusData,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn t0() -> DateTime<Utc> {
    at("2025-06-01T12:00:00Z")
}

/// In-memory stand-in for the subscription backend.
pub struct FakeBackend {
    clock: Arc<ManualClock>,
    subscriptions: Mutex<HashMap<String, RemoteSubscription>>,
    payments: Mutex<HashMap<String, RemoteSubscription>>,
    offline: AtomicBool,
    malformed: AtomicBool,
    delay: Mutex<Option<std::time::Duration>>,
    pub status_calls: AtomicUsize,
    pub activate_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            subscriptions: Mutex::new(HashMap::new()),
            payments: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            malformed: AtomicBool::new(false),
            delay: Mutex::new(None),
            status_calls: AtomicUsize::new(0),
            activate_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_malformed(&self, malformed: bool) {
        self.malformed.store(malformed, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<std::time::Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn grant(&self, user_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.subscriptions.lock().unwrap().insert(
            user_id.to_string(),
            RemoteSubscription {
                start_date: start.to_rfc3339(),
                end_date: end.to_rfc3339(),
                plan_id: "monthly".to_string(),
                plan_name: "Monthly".to_string(),
            },
        );
    }

    pub fn register_payment(&self, reference: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.payments.lock().unwrap().insert(
            reference.to_string(),
            RemoteSubscription {
                start_date: start.to_rfc3339(),
                end_date: end.to_rfc3339(),
                plan_id: "weekly".to_string(),
                plan_name: "Weekly".to_string(),
            },
        );
    }

    fn check_online(&self) -> Result<(), AccessError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(AccessError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

impl StatusClient for FakeBackend {
    fn subscription_status(&self, user_id: &str) -> Result<StatusData, AccessError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.malformed.load(Ordering::SeqCst) {
            return Err(AccessError::Parse("expected value at line 1".to_string()));
        }
        let subscription = self.subscriptions.lock().unwrap().get(user_id).cloned();
        let now = self.clock.now();
        let has_active = subscription
            .as_ref()
            .map(|s| s.to_window().unwrap().is_active(now))
            .unwrap_or(false);
        Ok(StatusData {
            has_active_subscription: has_active,
            subscription,
            can_access_app: has_active,
        })
    }

    fn activate_days(
        &self,
        user_id: &str,
        duration_days: u32,
        _metadata: &PaymentMetadata,
    ) -> Result<(), AccessError> {
        self.activate_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let now = self.clock.now();
        self.grant(user_id, now, now + Duration::days(duration_days as i64));
        Ok(())
    }

    fn verify_payment(&self, reference: &str) -> Result<Option<RemoteSubscription>, AccessError> {
        self.check_online()?;
        match self.payments.lock().unwrap().get(reference) {
            Some(sub) => Ok(Some(sub.clone())),
            None => Err(AccessError::Rejected("unknown reference".to_string())),
        }
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub backend: Arc<FakeBackend>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        Self {
            backend: Arc::new(FakeBackend::new(Arc::clone(&clock))),
            clock,
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn ledger(&self, user_id: &str) -> AccessLedger {
        AccessLedger::new(
            user_id,
            self.store.clone() as Arc<dyn KeyValueStore>,
            self.clock.clone() as Arc<dyn Clock>,
            self.backend.clone() as Arc<dyn StatusClient>,
            LifecycleConfig::default(),
        )
    }
}
