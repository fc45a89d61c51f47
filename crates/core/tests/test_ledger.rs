mod common;

use chrono::Duration;
use common::{t0, Harness};
use mealgate_core::{
    keys::{LifecycleKeys, STATUS_ACTIVE, STATUS_NONE},
    AccessError, AccessLedger, Clock, KeyValueStore, LifecycleConfig, PaymentMetadata,
    RecordOrigin, StatusClient, SubscriptionSource, UserProfile,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

// --- trial ---

#[test]
fn initialize_trial_records_now() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    let trial = ledger.initialize_trial().unwrap();
    assert_eq!(trial.start, t0());
    assert_eq!(ledger.trial_window().unwrap().start, t0());
    assert_eq!(trial.end(), t0() + Duration::hours(24));
}

#[test]
fn initialize_trial_is_idempotent() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    let first = ledger.initialize_trial().unwrap();
    h.clock.advance(Duration::hours(5));
    let second = ledger.initialize_trial().unwrap();
    assert_eq!(first.start, second.start);
    assert_eq!(ledger.trial_window().unwrap().start, t0());
}

#[test]
fn trial_window_absent_before_init() {
    let h = Harness::new();
    assert!(h.ledger("alice").trial_window().is_none());
}

#[test]
fn unreadable_trial_start_is_treated_as_absent() {
    let h = Harness::new();
    h.store.set("trial_start:alice", "yesterday-ish").unwrap();
    let ledger = h.ledger("alice");
    assert!(ledger.trial_window().is_none());
    let trial = ledger.initialize_trial().unwrap();
    assert_eq!(trial.start, t0());
}

#[test]
fn trial_remaining_never_increases() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    let trial = ledger.initialize_trial().unwrap();
    let mut previous = trial.remaining_ms(h.clock.now());
    for _ in 0..40 {
        h.clock.advance(Duration::minutes(45));
        let remaining = trial.remaining_ms(h.clock.now());
        assert!(remaining <= previous);
        assert!(remaining >= 0);
        previous = remaining;
    }
    assert_eq!(previous, 0);
}

#[test]
fn reset_trial_removes_every_lifecycle_key() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    ledger.initialize_trial().unwrap();
    assert!(ledger.activate_subscription_for_duration(7, PaymentMetadata::default()));

    ledger.reset_trial().unwrap();

    for key in LifecycleKeys::for_user("alice").all() {
        assert!(h.store.get(&key).unwrap().is_none(), "{key} survived reset");
    }
    assert!(ledger.trial_window().is_none());
}

#[test]
fn reset_trial_leaves_other_users_alone() {
    let h = Harness::new();
    let alice = h.ledger("alice");
    let bob = h.ledger("bob");
    alice.initialize_trial().unwrap();
    bob.initialize_trial().unwrap();

    alice.reset_trial().unwrap();
    assert!(alice.trial_window().is_none());
    assert!(bob.trial_window().is_some());
}

// --- namespace isolation ---

#[test]
fn users_never_see_each_others_state() {
    let h = Harness::new();
    let alice = h.ledger("alice");
    alice.initialize_trial().unwrap();
    assert!(alice.activate_subscription_for_duration(30, PaymentMetadata::default()));

    h.clock.advance(Duration::hours(2));
    let bob = h.ledger("bob");
    assert!(bob.trial_window().is_none());
    assert!(bob.cached_record().is_none());
    assert!(bob.cached_subscription().is_none());

    let bob_trial = bob.initialize_trial().unwrap();
    assert_eq!(bob_trial.start, t0() + Duration::hours(2));
    assert_eq!(alice.trial_window().unwrap().start, t0());
}

#[test]
fn for_current_user_reads_user_data() {
    let h = Harness::new();
    let profile = UserProfile {
        uid: "carol".into(),
        email: "carol@example.com".into(),
        display_name: "Carol".into(),
        role: "user".into(),
    };
    mealgate_core::user::save_user(h.store.as_ref(), &profile).unwrap();

    let ledger = AccessLedger::for_current_user(
        h.store.clone() as Arc<dyn KeyValueStore>,
        h.clock.clone() as Arc<dyn Clock>,
        h.backend.clone() as Arc<dyn StatusClient>,
        LifecycleConfig::default(),
    )
    .unwrap();
    assert_eq!(ledger.user_id(), "carol");
}

#[test]
fn for_current_user_without_user_is_configuration_error() {
    let h = Harness::new();
    let result = AccessLedger::for_current_user(
        h.store.clone() as Arc<dyn KeyValueStore>,
        h.clock.clone() as Arc<dyn Clock>,
        h.backend.clone() as Arc<dyn StatusClient>,
        LifecycleConfig::default(),
    );
    assert!(matches!(result, Err(AccessError::Configuration(_))));
}

// --- remote fetch ---

#[test]
fn fetch_returns_active_subscription_and_caches_it() {
    let h = Harness::new();
    h.backend
        .grant("alice", t0() - Duration::days(1), t0() + Duration::days(3));
    let ledger = h.ledger("alice");

    let window = ledger.fetch_subscription_from_remote().unwrap();
    assert_eq!(window.end, t0() + Duration::days(3));
    assert_eq!(window.plan_id, "monthly");

    let record = ledger.cached_record().unwrap();
    assert_eq!(record.origin, RecordOrigin::Remote);
    assert_eq!(record.cached_at, t0());
    assert_eq!(
        h.store.get("subscription_status:alice").unwrap().as_deref(),
        Some(STATUS_ACTIVE)
    );
    assert_eq!(
        h.store.get("subscription_expires_at:alice").unwrap(),
        Some((t0() + Duration::days(3)).to_rfc3339())
    );
}

#[test]
fn fetch_returns_none_for_lapsed_subscription() {
    let h = Harness::new();
    h.backend
        .grant("alice", t0() - Duration::days(30), t0() - Duration::hours(1));
    let ledger = h.ledger("alice");
    assert!(ledger.fetch_subscription_from_remote().is_none());
    assert_eq!(
        h.store.get("subscription_status:alice").unwrap().as_deref(),
        Some(STATUS_NONE)
    );
}

#[test]
fn fetch_network_error_returns_none_without_panicking() {
    let h = Harness::new();
    h.backend.set_offline(true);
    assert!(h.ledger("alice").fetch_subscription_from_remote().is_none());
}

#[test]
fn fetch_parse_error_returns_none() {
    let h = Harness::new();
    h.backend
        .grant("alice", t0() - Duration::days(1), t0() + Duration::days(3));
    h.backend.set_malformed(true);
    assert!(h.ledger("alice").fetch_subscription_from_remote().is_none());
}

#[test]
fn absent_remote_subscription_clears_cache() {
    let h = Harness::new();
    h.backend
        .grant("alice", t0() - Duration::days(1), t0() + Duration::days(3));
    let ledger = h.ledger("alice");
    ledger.fetch_subscription_from_remote().unwrap();

    let other = Harness::new();
    let fresh_backend_ledger = AccessLedger::new(
        "alice",
        h.store.clone() as Arc<dyn KeyValueStore>,
        h.clock.clone() as Arc<dyn Clock>,
        other.backend.clone() as Arc<dyn StatusClient>,
        LifecycleConfig::default(),
    );
    assert!(fresh_backend_ledger.fetch_subscription_from_remote().is_none());
    assert!(ledger.cached_record().is_none());
}

// --- resolution / fail-closed ---

#[test]
fn resolution_reports_lapsed_window_from_remote() {
    let h = Harness::new();
    h.backend
        .grant("alice", t0() - Duration::days(30), t0() - Duration::hours(1));
    let resolution = h.ledger("alice").resolve_subscription();
    assert_eq!(resolution.source, SubscriptionSource::Remote);
    assert!(resolution.subscription.is_some());
}

#[test]
fn offline_without_cache_means_no_subscription() {
    let h = Harness::new();
    h.backend
        .grant("alice", t0() - Duration::days(1), t0() + Duration::days(3));
    h.backend.set_offline(true);
    let resolution = h.ledger("alice").resolve_subscription();
    assert_eq!(resolution.source, SubscriptionSource::Unavailable);
    assert!(resolution.subscription.is_none());
}

#[test]
fn offline_with_fresh_cache_uses_cache() {
    let h = Harness::new();
    h.backend
        .grant("alice", t0() - Duration::days(1), t0() + Duration::days(3));
    let ledger = h.ledger("alice");
    ledger.fetch_subscription_from_remote().unwrap();

    h.clock.advance(Duration::minutes(4));
    h.backend.set_offline(true);
    let resolution = ledger.resolve_subscription();
    assert_eq!(resolution.source, SubscriptionSource::Cache);
    assert!(resolution.subscription.is_some());
}

#[test]
fn offline_with_stale_cache_fails_closed() {
    let h = Harness::new();
    h.backend
        .grant("alice", t0() - Duration::days(1), t0() + Duration::days(3));
    let ledger = h.ledger("alice");
    ledger.fetch_subscription_from_remote().unwrap();

    h.clock.advance(Duration::minutes(6));
    h.backend.set_offline(true);
    let resolution = ledger.resolve_subscription();
    assert_eq!(resolution.source, SubscriptionSource::Unavailable);
    assert!(resolution.subscription.is_none());
    assert!(ledger.cached_record().is_some(), "stale record is kept, only ignored");
}

// --- activation ---

#[test]
fn activation_goes_to_remote_first() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    assert!(ledger.activate_subscription_for_duration(7, PaymentMetadata::default()));
    assert_eq!(h.backend.activate_calls.load(Ordering::SeqCst), 1);

    let record = ledger.cached_record().unwrap();
    assert_eq!(record.origin, RecordOrigin::Remote);
    assert_eq!(record.window.end, t0() + Duration::days(7));
    assert_eq!(record.window.plan_id, "days-7");

    let remote = ledger.fetch_subscription_from_remote().unwrap();
    assert_eq!(remote.end, t0() + Duration::days(7));
}

#[test]
fn activation_falls_back_to_local_window_when_offline() {
    let h = Harness::new();
    h.backend.set_offline(true);
    let ledger = h.ledger("alice");

    let metadata = PaymentMetadata {
        reference: Some("ref-1".into()),
        plan_id: Some("weekly".into()),
        plan_name: Some("Weekly".into()),
        ..Default::default()
    };
    assert!(ledger.activate_subscription_for_duration(7, metadata));

    let record = ledger.cached_record().unwrap();
    assert_eq!(record.origin, RecordOrigin::Local);
    assert_eq!(record.window.plan_label, "Weekly");

    // Still honored long after the TTL while the backend stays unreachable.
    h.clock.advance(Duration::hours(6));
    let resolution = ledger.resolve_subscription();
    assert_eq!(resolution.source, SubscriptionSource::Cache);
    assert!(resolution.subscription.unwrap().is_active(h.clock.now()));
}

#[test]
fn successful_fetch_overwrites_local_activation() {
    let h = Harness::new();
    h.backend.set_offline(true);
    let ledger = h.ledger("alice");
    assert!(ledger.activate_subscription_for_duration(7, PaymentMetadata::default()));

    h.backend.set_offline(false);
    assert!(ledger.fetch_subscription_from_remote().is_none());
    assert!(ledger.cached_record().is_none());
}

#[test]
fn activation_extends_an_active_window() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    assert!(ledger.activate_subscription_for_duration(7, PaymentMetadata::default()));
    h.clock.advance(Duration::days(2));
    assert!(ledger.activate_subscription_for_duration(7, PaymentMetadata::default()));
    assert_eq!(
        ledger.cached_record().unwrap().window.end,
        t0() + Duration::days(14)
    );
}

#[test]
fn zero_day_activation_is_refused() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    assert!(!ledger.activate_subscription_for_duration(0, PaymentMetadata::default()));
    assert_eq!(h.backend.activate_calls.load(Ordering::SeqCst), 0);
    assert!(ledger.cached_record().is_none());
}

#[test]
fn out_of_range_activation_is_refused() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    assert!(!ledger.activate_subscription_for_duration(u32::MAX, PaymentMetadata::default()));
    assert_eq!(h.backend.activate_calls.load(Ordering::SeqCst), 0);
    assert!(ledger.cached_record().is_none());

    // A large but representable extension still works.
    assert!(ledger.activate_subscription_for_duration(36_500, PaymentMetadata::default()));
    assert_eq!(
        ledger.cached_record().unwrap().window.end,
        t0() + Duration::days(36_500)
    );
}

// --- payment verification ---

#[test]
fn verify_payment_caches_returned_subscription() {
    let h = Harness::new();
    h.backend
        .register_payment("pay_123", t0(), t0() + Duration::days(7));
    let ledger = h.ledger("alice");

    let window = ledger.verify_payment("pay_123").unwrap().unwrap();
    assert_eq!(window.plan_id, "weekly");
    assert_eq!(ledger.cached_subscription().unwrap(), window);
}

#[test]
fn verify_payment_surfaces_errors() {
    let h = Harness::new();
    let ledger = h.ledger("alice");
    assert!(matches!(
        ledger.verify_payment("nope"),
        Err(AccessError::Rejected(_))
    ));
    assert!(matches!(
        ledger.verify_payment("   "),
        Err(AccessError::Rejected(_))
    ));
    h.backend.set_offline(true);
    assert!(matches!(
        ledger.verify_payment("pay_123"),
        Err(AccessError::Transport(_))
    ));
}
