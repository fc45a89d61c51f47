//! Storage key layout for lifecycle state
//!
//! Every lifecycle key carries the user id as a `:<uid>` suffix so that two
//! accounts sharing one store never read each other's state.

/// Key holding the signed-in user's profile blob (not lifecycle-owned).
pub const USER_DATA_KEY: &str = "user_data";

const TRIAL_START_PREFIX: &str = "trial_start";
const SUBSCRIPTION_STATUS_PREFIX: &str = "subscription_status";
const SUBSCRIPTION_EXPIRES_PREFIX: &str = "subscription_expires_at";
const SUBSCRIPTION_RECORD_PREFIX: &str = "subscription_record";

/// Value of `subscription_status:<uid>` when a subscription is cached as active.
pub const STATUS_ACTIVE: &str = "active";
/// Value of `subscription_status:<uid>` otherwise.
pub const STATUS_NONE: &str = "none";

/// The lifecycle key namespace for one user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleKeys {
    user_id: String,
}

impl LifecycleKeys {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn trial_start(&self) -> String {
        self.namespaced(TRIAL_START_PREFIX)
    }

    pub fn subscription_status(&self) -> String {
        self.namespaced(SUBSCRIPTION_STATUS_PREFIX)
    }

    pub fn subscription_expires_at(&self) -> String {
        self.namespaced(SUBSCRIPTION_EXPIRES_PREFIX)
    }

    pub fn subscription_record(&self) -> String {
        self.namespaced(SUBSCRIPTION_RECORD_PREFIX)
    }

    /// Every key owned by the ledger for this user.
    pub fn all(&self) -> Vec<String> {
        vec![
            self.trial_start(),
            self.subscription_status(),
            self.subscription_expires_at(),
            self.subscription_record(),
        ]
    }

    fn namespaced(&self, prefix: &str) -> String {
        format!("{}:{}", prefix, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_suffixed_with_user_id() {
        let keys = LifecycleKeys::for_user("u-42");
        assert_eq!(keys.trial_start(), "trial_start:u-42");
        assert_eq!(keys.subscription_status(), "subscription_status:u-42");
        assert_eq!(keys.subscription_expires_at(), "subscription_expires_at:u-42");
        assert_eq!(keys.subscription_record(), "subscription_record:u-42");
    }

    #[test]
    fn all_keys_never_include_user_data() {
        let keys = LifecycleKeys::for_user("u-42");
        assert_eq!(keys.all().len(), 4);
        assert!(!keys.all().iter().any(|k| k == USER_DATA_KEY));
    }
}
