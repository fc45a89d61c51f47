//! Terminal output formatting

use chrono::Duration;
use colored::Colorize;
use mealgate_core::{GateState, SubscriptionSource, UserState};

use super::json::{CheckReport, StatusReport};

/// `3d 4h`, `5h 12m`, `42m`, or `0m` once elapsed.
pub fn format_remaining(ms: i64) -> String {
    let left = Duration::milliseconds(ms.max(0));
    let days = left.num_days();
    let hours = left.num_hours() % 24;
    let minutes = left.num_minutes() % 60;
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Ten-cell progress bar.
pub fn format_progress(ratio: f64) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}

pub fn format_gate_state(state: GateState) -> String {
    match state {
        GateState::Allowed => "allowed".green().bold().to_string(),
        GateState::Blocked => "blocked".red().bold().to_string(),
        GateState::Loading => "loading".yellow().to_string(),
    }
}

pub fn format_user_state(state: UserState) -> String {
    match state {
        UserState::New => "new".cyan().to_string(),
        UserState::TrialUsed => "trial used".yellow().to_string(),
        UserState::Paid => "paid".green().to_string(),
        UserState::Expired => "expired".red().to_string(),
    }
}

pub fn print_status(report: &StatusReport) {
    eprintln!("  {}: {}", "User".bold(), report.user_id);
    eprintln!(
        "  {}: {} {}",
        "Gate".bold(),
        format_gate_state(report.gate),
        format!("on {}", report.path).dimmed()
    );
    eprintln!("  {}: {}", "State".bold(), format_user_state(report.access.user_state));

    match &report.trial {
        Some(trial) if trial.expired => {
            eprintln!("  {}: {} (ended {})", "Trial".bold(), "expired".red(), trial.end);
        }
        Some(trial) => {
            eprintln!(
                "  {}: {} left {}",
                "Trial".bold(),
                format_remaining(trial.remaining_ms),
                format_progress(trial.progress).dimmed()
            );
        }
        None => eprintln!("  {}: {}", "Trial".bold(), "not started".dimmed()),
    }

    match &report.subscription {
        Some(sub) => {
            let timing = if sub.active {
                format!("{} left", format_remaining(sub.remaining_ms))
            } else {
                format!("lapsed {}", sub.end)
            };
            eprintln!(
                "  {}: {}, {} {}",
                "Subscription".bold(),
                sub.plan_label,
                timing,
                format_progress(sub.progress).dimmed()
            );
        }
        None => eprintln!("  {}: {}", "Subscription".bold(), "none".dimmed()),
    }

    match report.subscription_source {
        SubscriptionSource::Remote => {}
        SubscriptionSource::Cache => {
            eprintln!("  {}", "Backend unreachable, subscription read from cache.".yellow())
        }
        SubscriptionSource::Unavailable => {
            eprintln!("  {}", "Backend unreachable, subscription unknown.".yellow())
        }
    }
    eprintln!();
}

pub fn print_check(report: &CheckReport) {
    let freshness = if report.fresh { "" } else { " (not yet refreshed)" };
    eprintln!(
        "  {} {}{}",
        report.path.bold(),
        format_gate_state(report.gate),
        freshness.dimmed()
    );
    if let Some(redirect) = &report.redirect {
        eprintln!("  {} {}", "Not signed in, redirect to".yellow(), redirect);
    }
}
