//! Verify command: confirm a payment reference with the backend

use anyhow::Result;
use colored::Colorize;
use mealgate_core::AccessError;

use crate::host::Host;

pub fn run(host: &Host, reference: &str) -> Result<()> {
    let ledger = host.ledger()?;

    eprint!("  Verifying {}... ", reference.bold());
    match ledger.verify_payment(reference) {
        Ok(Some(window)) => {
            eprintln!("{}", "verified".green());
            let state = if window.is_active(ledger.now()) {
                "active".green()
            } else {
                "lapsed".yellow()
            };
            eprintln!(
                "  {}: {} ({}) until {}",
                "Subscription".bold(),
                window.plan_label,
                state,
                window.end
            );
        }
        Ok(None) => {
            eprintln!("{}", "verified".green());
            eprintln!("  {}", "No subscription attached to this payment.".dimmed());
        }
        Err(AccessError::Rejected(message)) => {
            eprintln!("{}", "rejected".red());
            anyhow::bail!("Payment not verified: {message}");
        }
        Err(e) => {
            eprintln!("{}", "failed".red());
            return Err(e.into());
        }
    }
    Ok(())
}
