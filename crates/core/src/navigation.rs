//! Navigation events fed by the host router
//!
//! The router calls `Navigator::emit` for every push, replace and pop. The
//! gate subscribes instead of intercepting the host's history primitives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Push(String),
    Replace(String),
    Pop(String),
}

impl NavigationEvent {
    pub fn path(&self) -> &str {
        match self {
            NavigationEvent::Push(p) | NavigationEvent::Replace(p) | NavigationEvent::Pop(p) => p,
        }
    }
}

pub trait NavigationListener: Send + Sync {
    fn on_navigate(&self, event: &NavigationEvent);
}

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listeners = Vec<(Subscription, Arc<dyn NavigationListener>)>;

#[derive(Default)]
pub struct Navigator {
    next_id: AtomicU64,
    listeners: Mutex<Listeners>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn NavigationListener>) -> Subscription {
        let id = Subscription(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.lock().push((id, listener));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    pub fn emit(&self, event: NavigationEvent) {
        // Snapshot first so listeners may (un)subscribe from inside the callback.
        let listeners: Vec<Arc<dyn NavigationListener>> =
            self.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener.on_navigate(&event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(|p| p.into_inner())
    }
}
