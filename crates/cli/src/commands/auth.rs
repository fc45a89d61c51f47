//! Login/logout: manage the signed-in user record (`user_data`)

use anyhow::Result;
use colored::Colorize;
use mealgate_core::user::{clear_user, save_user};
use mealgate_core::UserProfile;

use crate::host::Host;

pub fn run_login(host: &Host, uid: &str, email: &str, name: &str, role: &str) -> Result<()> {
    let uid = uid.trim();
    if uid.is_empty() {
        anyhow::bail!("User id must not be empty");
    }

    if let Some(previous) = host.user() {
        if previous.uid != uid {
            eprintln!("  Switching from {}", previous.uid.dimmed());
        }
    }

    let profile = UserProfile {
        uid: uid.to_string(),
        email: email.to_string(),
        display_name: name.to_string(),
        role: role.to_string(),
    };
    save_user(host.store.as_ref(), &profile)?;
    eprintln!("  {} Signed in as {}", "\u{2713}".green(), uid.bold());
    Ok(())
}

/// Only the identity is removed: trial and subscription keys stay namespaced
/// under the user id and come back on the next login.
pub fn run_logout(host: &Host) -> Result<()> {
    match host.user() {
        Some(user) => {
            clear_user(host.store.as_ref())?;
            eprintln!("  {} Signed out {}", "\u{2713}".green(), user.uid);
        }
        None => eprintln!("  {}", "Not signed in.".dimmed()),
    }
    Ok(())
}
