//! Two-phase values: painted from cache first, confirmed by the remote later

use serde::{Deserialize, Serialize};

/// A value tagged with whether the authoritative refresh has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Freshness<T> {
    /// Derived from cached state while a refresh is outstanding.
    Stale(T),
    /// Derived after the refresh resolved.
    Fresh(T),
}

impl<T> Freshness<T> {
    pub fn value(&self) -> &T {
        match self {
            Freshness::Stale(v) | Freshness::Fresh(v) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Freshness::Stale(v) | Freshness::Fresh(v) => v,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh(_))
    }
}
