//! Gate: decides what the host renders for a path given an access snapshot

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decision::AccessSnapshot;
use crate::freshness::Freshness;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Loading,
    Blocked,
    Allowed,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateState::Loading => write!(f, "loading"),
            GateState::Blocked => write!(f, "blocked"),
            GateState::Allowed => write!(f, "allowed"),
        }
    }
}

/// Render decision handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateView {
    Children,
    Placeholder,
    /// Children stay mounted beneath the paywall overlay.
    ChildrenUnderOverlay,
}

/// Paths that stay reachable when access is denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    paths: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| normalize_path(p.as_ref()))
                .filter(|p| p != "/")
                .collect(),
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Exact match or a sub-path (`/settings/billing` under `/settings`).
    pub fn permits(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.paths.iter().any(|allowed| {
            path == *allowed
                || path
                    .strip_prefix(allowed.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(["/payment", "/settings", "/login", "/signup"])
    }
}

/// Drops query, fragment and trailing slashes; ensures a leading slash.
pub fn normalize_path(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Pure gate: current path + latest snapshot.
#[derive(Debug, Clone)]
pub struct Gate {
    allow_list: AllowList,
    path: String,
    snapshot: Option<Freshness<AccessSnapshot>>,
}

impl Gate {
    pub fn new(allow_list: AllowList, path: &str) -> Self {
        Self {
            allow_list,
            path: normalize_path(path),
            snapshot: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn snapshot(&self) -> Option<&Freshness<AccessSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn navigate(&mut self, path: &str) {
        self.path = normalize_path(path);
    }

    pub fn apply(&mut self, snapshot: Freshness<AccessSnapshot>) {
        self.snapshot = Some(snapshot);
    }

    pub fn is_protected(&self) -> bool {
        !self.allow_list.permits(&self.path)
    }

    pub fn state(&self) -> GateState {
        if !self.is_protected() {
            return GateState::Allowed;
        }
        match &self.snapshot {
            None | Some(Freshness::Stale(_)) => GateState::Loading,
            Some(Freshness::Fresh(s)) if s.can_access_app => GateState::Allowed,
            Some(Freshness::Fresh(_)) => GateState::Blocked,
        }
    }

    pub fn view(&self) -> GateView {
        match self.state() {
            GateState::Allowed => GateView::Children,
            GateState::Blocked => GateView::ChildrenUnderOverlay,
            GateState::Loading => match &self.snapshot {
                // Optimistic pass-through while the refresh is outstanding.
                Some(Freshness::Stale(s)) if s.can_access_app => GateView::Children,
                _ => GateView::Placeholder,
            },
        }
    }
}
