//! Watch command: keep a gate mounted, navigate from stdin, print changes

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use mealgate_core::{GateState, NavigationEvent, Navigator};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::host::Host;
use crate::output::terminal::{format_gate_state, format_user_state};

pub fn run(host: &Host, path: &str) -> Result<()> {
    eprintln!(
        "{}",
        format!("  mealgate v{}, watch mode", mealgate_core::VERSION).bold()
    );
    eprintln!(
        "  {}",
        format!(
            "Polling every {}s. Type a path to navigate. (Ctrl-C to stop)",
            host.options().poll_interval.as_secs()
        )
        .dimmed()
    );
    eprintln!();

    let gate = host.mount(path);
    if let Some(redirect) = gate.redirect() {
        eprintln!("  {} {}", "Not signed in, redirect to".yellow(), redirect);
    }

    // ── Navigation from stdin ──────────────────────────────────
    let navigator = Arc::new(Navigator::new());
    let subscription = navigator.subscribe(gate.navigation_listener());
    let input = Arc::clone(&navigator);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if !line.is_empty() {
                input.emit(NavigationEvent::Push(line.to_string()));
            }
        }
    });

    // ── Ctrl-C handler ─────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    // ── Event loop ─────────────────────────────────────────────
    let mut last: Option<(String, GateState, u64)> = None;
    while running.load(Ordering::SeqCst) {
        let seen = gate.refresh_count();
        gate.wait_for_refreshes(seen + 1, Duration::from_millis(200));

        let current = (gate.path(), gate.state(), gate.refresh_count());
        if last.as_ref() != Some(&current) {
            let user_state = gate
                .snapshot()
                .map(|s| format_user_state(s.value().user_state))
                .unwrap_or_else(|| "-".dimmed().to_string());
            eprintln!(
                "  {} {} {} {}",
                Local::now().format("%H:%M:%S").to_string().dimmed(),
                current.0.bold(),
                format_gate_state(current.1),
                user_state
            );
            last = Some(current);
        }
    }

    navigator.unsubscribe(subscription);
    gate.unmount();
    eprintln!();
    eprintln!("  {}", "Stopped watching.".bold());
    Ok(())
}
