//! Activate command: grant access for N days

use anyhow::Result;
use colored::Colorize;
use mealgate_core::{PaymentMetadata, RecordOrigin};

use crate::host::Host;

pub fn run(
    host: &Host,
    days: u32,
    plan_id: Option<String>,
    plan_name: Option<String>,
    reference: Option<String>,
) -> Result<()> {
    if days == 0 {
        anyhow::bail!("--days must be at least 1");
    }
    let ledger = host.ledger()?;
    let metadata = PaymentMetadata {
        reference,
        plan_id,
        plan_name,
        ..Default::default()
    };

    eprint!("  Activating {days} day(s)... ");
    if !ledger.activate_subscription_for_duration(days, metadata) {
        eprintln!("{}", "failed".red());
        anyhow::bail!("Activation could not be recorded");
    }

    match ledger.cached_record() {
        Some(record) => {
            match record.origin {
                RecordOrigin::Remote => eprintln!("{}", "done".green()),
                RecordOrigin::Local => {
                    eprintln!("{}", "offline".yellow());
                    eprintln!(
                        "  {}",
                        "Backend unreachable; access is granted locally until the next sync."
                            .dimmed()
                    );
                }
            }
            eprintln!(
                "  {}: {} until {}",
                "Subscription".bold(),
                record.window.plan_label,
                record.window.end
            );
        }
        None => eprintln!("{}", "done".green()),
    }
    Ok(())
}
