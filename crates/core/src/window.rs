//! Trial and subscription windows and the math derived from them

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The one-time grace period granted to every user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialWindow {
    pub start: DateTime<Utc>,
    pub duration: Duration,
}

impl TrialWindow {
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end()
    }

    /// Time left, never negative.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.end() - now).max(Duration::zero())
    }

    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        self.remaining(now).num_milliseconds()
    }

    pub fn progress_ratio(&self, now: DateTime<Utc>) -> f64 {
        progress(self.start, self.end(), now)
    }
}

/// A paid, time-bounded access grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub plan_id: String,
    pub plan_label: String,
}

impl SubscriptionWindow {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.end
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.end - now).max(Duration::zero())
    }

    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        self.remaining(now).num_milliseconds()
    }

    /// Elapsed share of the window, clamped to `[0, 1]`.
    pub fn progress_ratio(&self, now: DateTime<Utc>) -> f64 {
        progress(self.start, self.end, now)
    }
}

fn progress(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 1.0;
    }
    let elapsed = (now - start).num_milliseconds();
    (elapsed as f64 / total as f64).clamp(0.0, 1.0)
}
