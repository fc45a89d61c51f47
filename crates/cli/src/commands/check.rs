//! Check command: mount a gate once and report whether it lets the user in

use anyhow::Result;
use mealgate_core::GateState;
use std::time::Duration;

use crate::host::Host;
use crate::output::{terminal, CheckReport};

/// Returns `true` when the gate ends up `Allowed`.
pub fn run(host: &Host, path: &str, json: bool) -> Result<bool> {
    let report = evaluate(host, path);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        terminal::print_check(&report);
    }
    Ok(report.gate == GateState::Allowed)
}

/// Mounts, waits for the first refresh (bounded by the resolve timeout), unmounts.
pub fn evaluate(host: &Host, path: &str) -> CheckReport {
    let gate = host.mount(path);
    if gate.redirect().is_none() {
        let budget = host.options().resolve_timeout + Duration::from_secs(1);
        if !gate.wait_for_refreshes(1, budget) {
            tracing::warn!(path, "Gate did not refresh in time");
        }
    }

    let snapshot = gate.snapshot();
    let report = CheckReport {
        path: gate.path(),
        gate: gate.state(),
        view: gate.view(),
        fresh: snapshot.is_some_and(|s| s.is_fresh()),
        access: snapshot.map(|s| s.into_value()),
        redirect: gate.redirect(),
    };
    gate.unmount();
    report
}
