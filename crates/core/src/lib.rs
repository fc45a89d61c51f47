//! Mealgate Core - Access Lifecycle Engine
//!
//! This crate decides whether a user of the meal-planning client may use the
//! protected application:
//! - Trial and subscription windows derived from per-user stored timestamps
//! - A ledger that reconciles the local cache with the subscription backend
//! - A pure decision engine where an active subscription always wins
//! - A gate state machine with an allow-list, polling and a hard refresh timeout

pub mod clock;
pub mod config;
pub mod controller;
pub mod decision;
pub mod error;
pub mod freshness;
pub mod gate;
pub mod keys;
pub mod ledger;
pub mod navigation;
pub mod remote;
pub mod store;
pub mod user;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LifecycleConfig, MealgateConfig};
pub use controller::{refresh_snapshot, ControllerOptions, GateController};
pub use decision::{evaluate, AccessSnapshot, DecisionEngine, UserState};
pub use error::AccessError;
pub use freshness::Freshness;
pub use gate::{AllowList, Gate, GateState, GateView};
pub use keys::LifecycleKeys;
pub use ledger::{
    AccessLedger, RecordOrigin, SubscriptionRecord, SubscriptionResolution, SubscriptionSource,
};
pub use navigation::{NavigationEvent, NavigationListener, Navigator, Subscription};
pub use remote::{HttpStatusClient, PaymentMetadata, RemoteSubscription, StatusClient, StatusData};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use user::UserProfile;
pub use window::{SubscriptionWindow, TrialWindow};

/// Mealgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
