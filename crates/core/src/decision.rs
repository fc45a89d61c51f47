//! Access decision engine: turns windows into an `AccessSnapshot`
//!
//! Subscription status is evaluated before anything about the trial. Moving
//! the trial checks above the subscription check would block paying users
//! whose trial ran out long ago.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::freshness::Freshness;
use crate::window::{SubscriptionWindow, TrialWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserState {
    New,
    TrialUsed,
    Paid,
    Expired,
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserState::New => write!(f, "new"),
            UserState::TrialUsed => write!(f, "trial_used"),
            UserState::Paid => write!(f, "paid"),
            UserState::Expired => write!(f, "expired"),
        }
    }
}

/// Point-in-time answer to "may this user use the app?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSnapshot {
    pub has_active_subscription: bool,
    /// Only evaluated when no subscription was ever seen; `false` otherwise.
    pub is_trial_expired: bool,
    pub can_access_app: bool,
    pub user_state: UserState,
}

/// Pure decision over the two windows.
pub fn evaluate(
    trial: Option<&TrialWindow>,
    subscription: Option<&SubscriptionWindow>,
    now: DateTime<Utc>,
) -> AccessSnapshot {
    if let Some(sub) = subscription {
        if sub.is_active(now) {
            return AccessSnapshot {
                has_active_subscription: true,
                is_trial_expired: false,
                can_access_app: true,
                user_state: UserState::Paid,
            };
        }
        return AccessSnapshot {
            has_active_subscription: false,
            is_trial_expired: false,
            can_access_app: false,
            user_state: UserState::Expired,
        };
    }

    match trial {
        // Not started yet: the trial is initialized on the first protected mount.
        None => AccessSnapshot {
            has_active_subscription: false,
            is_trial_expired: false,
            can_access_app: true,
            user_state: UserState::New,
        },
        Some(trial) if trial.is_expired(now) => AccessSnapshot {
            has_active_subscription: false,
            is_trial_expired: true,
            can_access_app: false,
            user_state: UserState::TrialUsed,
        },
        Some(_) => AccessSnapshot {
            has_active_subscription: false,
            is_trial_expired: false,
            can_access_app: true,
            user_state: UserState::New,
        },
    }
}

/// Remembers the last fresh snapshot so refreshes never flicker to blocked.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    last: Option<AccessSnapshot>,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last snapshot computed from resolved inputs.
    pub fn last(&self) -> Option<AccessSnapshot> {
        self.last
    }

    /// While `remote_loading`, returns the last known snapshot (or one derived
    /// from the cached inputs when there is none) as `Stale`. Otherwise
    /// evaluates, remembers and returns `Fresh`.
    pub fn decide(
        &mut self,
        trial: Option<&TrialWindow>,
        subscription: Option<&SubscriptionWindow>,
        remote_loading: bool,
        now: DateTime<Utc>,
    ) -> Freshness<AccessSnapshot> {
        if remote_loading {
            let snapshot = self
                .last
                .unwrap_or_else(|| evaluate(trial, subscription, now));
            return Freshness::Stale(snapshot);
        }

        let snapshot = evaluate(trial, subscription, now);
        self.last = Some(snapshot);
        Freshness::Fresh(snapshot)
    }
}
