//! Trial command: start or reset the free trial

use anyhow::Result;
use colored::Colorize;

use crate::host::Host;
use crate::output::terminal::format_remaining;

#[derive(Debug, Clone, clap::Subcommand)]
pub enum TrialAction {
    /// Start the trial now (no-op if it already started)
    Start,
    /// Delete every lifecycle key for the signed-in user
    Reset,
}

pub fn run(host: &Host, action: &TrialAction) -> Result<()> {
    let ledger = host.ledger()?;
    match action {
        TrialAction::Start => {
            let existed = ledger.trial_window().is_some();
            let trial = ledger.initialize_trial()?;
            let now = ledger.now();
            let verb = if existed { "Trial already started" } else { "Trial started" };
            eprintln!("  {} {} at {}", "\u{2713}".green(), verb, trial.start);
            if trial.is_expired(now) {
                eprintln!("  {} ended {}", "Expired:".red().bold(), trial.end());
            } else {
                eprintln!(
                    "  {} left, ends {}",
                    format_remaining(trial.remaining_ms(now)),
                    trial.end()
                );
            }
        }
        TrialAction::Reset => {
            ledger.reset_trial()?;
            eprintln!(
                "  {} Cleared trial and subscription state for {}",
                "\u{2713}".green(),
                ledger.user_id()
            );
        }
    }
    Ok(())
}
