//! Gate controller: mounts a gate and keeps its snapshot current
//!
//! Mount paints a stale snapshot from the ledger's cache, then a worker thread
//! refreshes against the backend, once immediately and again every poll
//! interval or whenever the host navigates. Each refresh is bounded by a hard
//! timeout after which the cache (or nothing) stands in for the remote.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{GateConfig, LifecycleConfig};
use crate::decision::{AccessSnapshot, DecisionEngine};
use crate::error::AccessError;
use crate::freshness::Freshness;
use crate::gate::{AllowList, Gate, GateState, GateView};
use crate::ledger::{AccessLedger, SubscriptionResolution};
use crate::navigation::{NavigationEvent, NavigationListener};
use crate::remote::StatusClient;
use crate::store::KeyValueStore;
use crate::window::TrialWindow;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    pub resolve_timeout: Duration,
    pub allow_list: AllowList,
    pub login_path: String,
}

impl From<&GateConfig> for ControllerOptions {
    fn from(config: &GateConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            resolve_timeout: config.resolve_timeout(),
            allow_list: AllowList::new(&config.allow_list),
            login_path: config.login_path.clone(),
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&GateConfig::default())
    }
}

enum Command {
    Navigate,
    Refresh,
    Shutdown,
}

struct ControllerState {
    gate: Gate,
    engine: DecisionEngine,
    redirect: Option<String>,
    refreshes: u64,
}

struct Shared {
    state: Mutex<ControllerState>,
    changed: Condvar,
    mounted: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

pub struct GateController {
    shared: Arc<Shared>,
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl GateController {
    /// Mounts a gate for a signed-in user and starts refreshing.
    pub fn mount(ledger: Arc<AccessLedger>, options: ControllerOptions, path: &str) -> Self {
        let mut gate = Gate::new(options.allow_list.clone(), path);
        if gate.is_protected() {
            initialize_trial(&ledger);
        }

        let mut engine = DecisionEngine::new();
        let painted = engine.decide(
            ledger.trial_window().as_ref(),
            ledger.cached_subscription().as_ref(),
            true,
            ledger.now(),
        );
        gate.apply(painted);

        let shared = Arc::new(Shared {
            state: Mutex::new(ControllerState {
                gate,
                engine,
                redirect: None,
                refreshes: 0,
            }),
            changed: Condvar::new(),
            mounted: AtomicBool::new(true),
        });

        let (tx, rx) = mpsc::channel();
        let worker_shared = Arc::clone(&shared);
        let poll_interval = options.poll_interval;
        let resolve_timeout = options.resolve_timeout;

        let worker = thread::Builder::new()
            .name("mealgate-gate".to_string())
            .spawn(move || loop {
                if !worker_shared.mounted.load(Ordering::SeqCst) {
                    break;
                }
                run_cycle(&worker_shared, &ledger, resolve_timeout);

                match rx.recv_timeout(poll_interval) {
                    Ok(Command::Navigate) => {
                        let protected = worker_shared.lock().gate.is_protected();
                        if protected {
                            initialize_trial(&ledger);
                        }
                    }
                    Ok(Command::Refresh) | Err(RecvTimeoutError::Timeout) => {}
                    Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Could not start gate worker: {e}");
                None
            }
        };

        Self {
            shared,
            commands: Some(tx),
            worker,
        }
    }

    /// Mounts a gate with no signed-in user: protected paths stay loading and
    /// the host is asked to go to the login path.
    pub fn mount_signed_out(options: ControllerOptions, path: &str, reason: &AccessError) -> Self {
        info!("Gate mounted without a user ({reason}), redirecting to {}", options.login_path);
        let shared = Arc::new(Shared {
            state: Mutex::new(ControllerState {
                gate: Gate::new(options.allow_list.clone(), path),
                engine: DecisionEngine::new(),
                redirect: Some(options.login_path.clone()),
                refreshes: 0,
            }),
            changed: Condvar::new(),
            mounted: AtomicBool::new(true),
        });
        Self {
            shared,
            commands: None,
            worker: None,
        }
    }

    /// Resolves the signed-in user from `user_data` and mounts accordingly.
    pub fn mount_for_current_user(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        remote: Arc<dyn StatusClient>,
        lifecycle: LifecycleConfig,
        options: ControllerOptions,
        path: &str,
    ) -> Self {
        match AccessLedger::for_current_user(store, clock, remote, lifecycle) {
            Ok(ledger) => Self::mount(Arc::new(ledger), options, path),
            Err(e) => Self::mount_signed_out(options, path, &e),
        }
    }

    pub fn state(&self) -> GateState {
        self.shared.lock().gate.state()
    }

    pub fn view(&self) -> GateView {
        self.shared.lock().gate.view()
    }

    pub fn snapshot(&self) -> Option<Freshness<AccessSnapshot>> {
        self.shared.lock().gate.snapshot().copied()
    }

    pub fn path(&self) -> String {
        self.shared.lock().gate.path().to_string()
    }

    /// Where the host should navigate, if anywhere.
    pub fn redirect(&self) -> Option<String> {
        self.shared.lock().redirect.clone()
    }

    /// Number of completed refresh cycles.
    pub fn refresh_count(&self) -> u64 {
        self.shared.lock().refreshes
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::SeqCst)
    }

    /// Blocks until at least `count` refreshes completed or `timeout` elapsed.
    pub fn wait_for_refreshes(&self, count: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        while state.refreshes < count {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = match self.shared.changed.wait_timeout(state, deadline - now) {
                Ok((guard, _)) => guard,
                Err(p) => p.into_inner().0,
            };
        }
        true
    }

    /// Moves the gate to `path` and schedules a refresh.
    pub fn navigate(&self, path: &str) {
        {
            let mut state = self.shared.lock();
            state.gate.navigate(path);
            debug!(path = state.gate.path(), "Gate navigated");
        }
        self.shared.changed.notify_all();
        self.send(Command::Navigate);
    }

    pub fn refresh_now(&self) {
        self.send(Command::Refresh);
    }

    /// A listener to subscribe on the host's `Navigator`.
    pub fn navigation_listener(&self) -> Arc<dyn NavigationListener> {
        Arc::new(GateNavigation {
            shared: Arc::clone(&self.shared),
            commands: self.commands.clone().map(Mutex::new),
        })
    }

    /// Stops polling and waits for the worker. Later results are discarded.
    pub fn unmount(mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn stop(&mut self) {
        // Under the state lock, so no refresh can land after this returns.
        {
            let _state = self.shared.lock();
            self.shared.mounted.store(false, Ordering::SeqCst);
        }
        if let Some(tx) = self.commands.take() {
            let _ = tx.send(Command::Shutdown);
        }
        self.shared.changed.notify_all();
    }

    fn send(&self, command: Command) {
        if let Some(tx) = &self.commands {
            let _ = tx.send(command);
        }
    }
}

impl Drop for GateController {
    fn drop(&mut self) {
        // Detach: an in-flight fetch finishes on its own and is ignored.
        self.stop();
    }
}

struct GateNavigation {
    shared: Arc<Shared>,
    commands: Option<Mutex<Sender<Command>>>,
}

impl NavigationListener for GateNavigation {
    fn on_navigate(&self, event: &NavigationEvent) {
        {
            let mut state = self.shared.lock();
            if !self.shared.mounted.load(Ordering::SeqCst) {
                return;
            }
            state.gate.navigate(event.path());
        }
        self.shared.changed.notify_all();
        if let Some(commands) = &self.commands {
            let tx = commands.lock().unwrap_or_else(|p| p.into_inner());
            let _ = tx.send(Command::Navigate);
        }
    }
}

/// One synchronous refresh outside of any controller (CLI status, tests).
pub fn refresh_snapshot(
    ledger: &Arc<AccessLedger>,
    engine: &mut DecisionEngine,
    timeout: Duration,
) -> Freshness<AccessSnapshot> {
    let (trial, resolution) = resolve_inputs(ledger, timeout);
    engine.decide(
        trial.as_ref(),
        resolution.subscription.as_ref(),
        false,
        ledger.now(),
    )
}

fn run_cycle(shared: &Shared, ledger: &Arc<AccessLedger>, timeout: Duration) {
    let (trial, resolution) = resolve_inputs(ledger, timeout);
    let now = ledger.now();

    let mut state = shared.lock();
    if !shared.mounted.load(Ordering::SeqCst) {
        debug!("Discarding refresh result after unmount");
        return;
    }
    let snapshot = state.engine.decide(
        trial.as_ref(),
        resolution.subscription.as_ref(),
        false,
        now,
    );
    state.gate.apply(snapshot);
    state.refreshes += 1;
    debug!(
        user_id = ledger.user_id(),
        source = ?resolution.source,
        state = %state.gate.state(),
        "Gate refreshed"
    );
    drop(state);
    shared.changed.notify_all();
}

/// Reads the trial while the subscription resolves on its own thread; both
/// results are returned together so no partial snapshot is ever emitted.
fn resolve_inputs(
    ledger: &Arc<AccessLedger>,
    timeout: Duration,
) -> (Option<TrialWindow>, SubscriptionResolution) {
    let (tx, rx) = mpsc::channel();
    let fetch_ledger = Arc::clone(ledger);
    let spawned = thread::Builder::new()
        .name("mealgate-fetch".to_string())
        .spawn(move || {
            let _ = tx.send(fetch_ledger.resolve_subscription());
        });

    let trial = ledger.trial_window();

    let resolution = match spawned {
        Ok(_) => match rx.recv_timeout(timeout) {
            Ok(resolution) => resolution,
            Err(_) => {
                warn!(
                    user_id = ledger.user_id(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Subscription refresh did not resolve in time"
                );
                ledger.cached_resolution()
            }
        },
        Err(e) => {
            warn!("Could not spawn fetch thread, resolving inline: {e}");
            ledger.resolve_subscription()
        }
    };
    (trial, resolution)
}

fn initialize_trial(ledger: &AccessLedger) {
    if let Err(e) = ledger.initialize_trial() {
        warn!(user_id = ledger.user_id(), "Could not initialize trial: {e}");
    }
}
