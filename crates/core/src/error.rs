//! Error taxonomy for the access lifecycle

/// Errors raised while reading or refreshing access state.
///
/// None of these reach the gate: the ledger degrades them to a safe default.
/// Only user-triggered actions (payment verification, CLI commands) surface them.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Network unreachable, timeout, or non-2xx status.
    #[error("Transport error: {0}")]
    Transport(String),
    /// Malformed JSON or a payload that does not match the expected shape.
    #[error("Malformed response: {0}")]
    Parse(String),
    /// No signed-in user, so no key namespace to read from.
    #[error("Not signed in: {0}")]
    Configuration(String),
    /// The local key/value store failed.
    #[error("Storage error: {0}")]
    Storage(String),
    /// The backend answered but reported `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl AccessError {
    /// Transport and parse failures both mean "remote state unknown".
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, AccessError::Transport(_) | AccessError::Parse(_))
    }
}

impl From<anyhow::Error> for AccessError {
    fn from(err: anyhow::Error) -> Self {
        AccessError::Storage(format!("{err:#}"))
    }
}
