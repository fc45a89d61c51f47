//! Signed-in user profile, stored under `user_data`

use serde::{Deserialize, Serialize};

use crate::error::AccessError;
use crate::keys::USER_DATA_KEY;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub role: String,
}

/// Reads the signed-in user, failing with `Configuration` when there is none.
pub fn current_user(store: &dyn KeyValueStore) -> Result<UserProfile, AccessError> {
    let raw = store
        .get(USER_DATA_KEY)?
        .ok_or_else(|| AccessError::Configuration("no user_data entry".to_string()))?;

    let profile: UserProfile = serde_json::from_str(&raw)
        .map_err(|e| AccessError::Configuration(format!("unreadable user_data: {e}")))?;

    if profile.uid.trim().is_empty() {
        return Err(AccessError::Configuration("user_data has an empty uid".to_string()));
    }
    Ok(profile)
}

pub fn save_user(store: &dyn KeyValueStore, profile: &UserProfile) -> anyhow::Result<()> {
    let json = serde_json::to_string(profile)?;
    store.set(USER_DATA_KEY, &json)
}

pub fn clear_user(store: &dyn KeyValueStore) -> anyhow::Result<()> {
    store.remove(USER_DATA_KEY)
}
