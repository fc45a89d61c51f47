//! JSON output formatting

use chrono::{DateTime, Utc};
use mealgate_core::{
    AccessSnapshot, GateState, GateView, RecordOrigin, SubscriptionSource, SubscriptionWindow,
    TrialWindow,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub user_id: String,
    pub path: String,
    pub gate: GateState,
    pub view: GateView,
    pub access: AccessSnapshot,
    pub subscription_source: SubscriptionSource,
    pub trial: Option<TrialReport>,
    pub subscription: Option<SubscriptionReport>,
}

/// Result of mounting a gate on one path.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckReport {
    pub path: String,
    pub gate: GateState,
    pub view: GateView,
    pub fresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrialReport {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub expired: bool,
    pub remaining_ms: i64,
    pub progress: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionReport {
    pub plan_id: String,
    pub plan_label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub active: bool,
    pub remaining_ms: i64,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<RecordOrigin>,
}

impl TrialReport {
    pub fn new(trial: &TrialWindow, now: DateTime<Utc>) -> Self {
        Self {
            start: trial.start,
            end: trial.end(),
            expired: trial.is_expired(now),
            remaining_ms: trial.remaining_ms(now),
            progress: trial.progress_ratio(now),
        }
    }
}

impl SubscriptionReport {
    pub fn new(
        window: &SubscriptionWindow,
        origin: Option<RecordOrigin>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            plan_id: window.plan_id.clone(),
            plan_label: window.plan_label.clone(),
            start: window.start,
            end: window.end,
            active: window.is_active(now),
            remaining_ms: window.remaining_ms(now),
            progress: window.progress_ratio(now),
            origin,
        }
    }
}
