//! Report rendering for `status`, `check` and `watch`

pub mod json;
pub mod terminal;

pub use json::{CheckReport, StatusReport, SubscriptionReport, TrialReport};
