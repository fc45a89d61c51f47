//! Status command: one synchronous refresh, printed

use anyhow::Result;
use colored::Colorize;
use mealgate_core::{AccessLedger, AllowList, DecisionEngine, Gate};

use crate::host::Host;
use crate::output::{terminal, StatusReport, SubscriptionReport, TrialReport};

pub fn run(host: &Host, path: &str, json: bool) -> Result<()> {
    if host.user().is_none() {
        if json {
            let body = serde_json::json!({
                "signed_in": false,
                "redirect": host.config.gate.login_path,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            eprintln!(
                "  {} Run {} first.",
                "Not signed in.".yellow(),
                "mealgate login --uid <id>".bold()
            );
        }
        return Ok(());
    }

    let ledger = host.ledger()?;
    let report = build_report(&ledger, AllowList::new(&host.config.gate.allow_list), path);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        terminal::print_status(&report);
    }
    Ok(())
}

/// Resolves the subscription (remote, else cache) and evaluates the gate for
/// `path` without mounting it, so no trial is started.
pub fn build_report(ledger: &AccessLedger, allow_list: AllowList, path: &str) -> StatusReport {
    let resolution = ledger.resolve_subscription();
    let trial = ledger.trial_window();
    let now = ledger.now();

    let mut engine = DecisionEngine::new();
    let snapshot = engine.decide(trial.as_ref(), resolution.subscription.as_ref(), false, now);
    let access = *snapshot.value();

    let mut gate = Gate::new(allow_list, path);
    gate.apply(snapshot);

    let subscription = resolution.subscription.as_ref().map(|window| {
        let origin = ledger
            .cached_record()
            .filter(|record| record.window == *window)
            .map(|record| record.origin);
        SubscriptionReport::new(window, origin, now)
    });

    StatusReport {
        user_id: ledger.user_id().to_string(),
        path: gate.path().to_string(),
        gate: gate.state(),
        view: gate.view(),
        access,
        subscription_source: resolution.source,
        trial: trial.as_ref().map(|t| TrialReport::new(t, now)),
        subscription,
    }
}
