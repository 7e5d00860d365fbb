//! Security domain integration tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use core_kernel::{BusinessTimezone, Money, UserId};
use domain_security::ports::mock::MemorySecurityStore;
use domain_security::{
    check_limits, DailyTracker, PinManager, SecurityError, SecurityStore, TransactionLimits,
};

fn manager(store: Arc<MemorySecurityStore>) -> PinManager {
    // Low cost keeps the suite fast; production uses the default
    PinManager::new(store).with_cost(4)
}

#[tokio::test]
async fn test_set_then_status() {
    let store = Arc::new(MemorySecurityStore::new());
    let pins = manager(store.clone());
    let user = UserId::new();

    let before = pins.status(user).await.unwrap();
    assert!(!before.is_set);

    pins.set(user, "4242").await.unwrap();

    let after = pins.status(user).await.unwrap();
    assert!(after.is_set);
    assert!(!after.is_locked);
}

#[tokio::test]
async fn test_set_twice_rejected() {
    let store = Arc::new(MemorySecurityStore::new());
    let pins = manager(store);
    let user = UserId::new();

    pins.set(user, "4242").await.unwrap();
    assert!(matches!(
        pins.set(user, "9999").await,
        Err(SecurityError::PinAlreadySet)
    ));
}

#[tokio::test]
async fn test_change_requires_current_pin() {
    let store = Arc::new(MemorySecurityStore::new());
    let pins = manager(store.clone());
    let user = UserId::new();

    pins.set(user, "4242").await.unwrap();

    let wrong = pins.change(user, "0000", "5151").await;
    assert!(matches!(wrong, Err(SecurityError::IncorrectPin { .. })));

    pins.change(user, "4242", "5151").await.unwrap();

    let record = store.pin_record(user).await.unwrap().unwrap();
    assert!(record.hash.verify("5151"));
    assert_eq!(record.failed_attempts, 0);
}

#[tokio::test]
async fn test_failed_changes_count_toward_lockout() {
    let store = Arc::new(MemorySecurityStore::new());
    let pins = manager(store.clone());
    let user = UserId::new();

    pins.set(user, "4242").await.unwrap();
    for _ in 0..3 {
        let _ = pins.change(user, "0000", "5151").await;
    }

    let status = pins.status(user).await.unwrap();
    assert!(status.is_locked);

    // Even the correct current PIN is refused while locked
    assert!(matches!(
        pins.change(user, "4242", "5151").await,
        Err(SecurityError::Locked { .. })
    ));
}

#[tokio::test]
async fn test_reset_clears_lock() {
    let store = Arc::new(MemorySecurityStore::new());
    let pins = manager(store.clone());
    let user = UserId::new();

    pins.set(user, "4242").await.unwrap();
    for _ in 0..3 {
        let _ = pins.change(user, "0000", "5151").await;
    }
    assert!(pins.status(user).await.unwrap().is_locked);

    pins.reset(user, "7777").await.unwrap();

    let status = pins.status(user).await.unwrap();
    assert!(status.is_set);
    assert!(!status.is_locked);

    let record = store.pin_record(user).await.unwrap().unwrap();
    assert!(record.hash.verify("7777"));
}

#[tokio::test]
async fn test_limit_check_against_stored_tracker() {
    let store = MemorySecurityStore::new();
    let user = UserId::new();
    let tz = BusinessTimezone::default();
    let now = Utc::now();

    store
        .set_tracker(
            user,
            DailyTracker {
                spent: Money::inr(dec!(49000)),
                last_reset: now,
            },
        )
        .await;

    let limits = store.limits(user).await.unwrap();
    let tracker = store.daily_tracker(user).await.unwrap();

    let over = check_limits(&limits, tracker.as_ref(), Money::inr(dec!(2000)), now, tz);
    assert!(!over.is_allowed());

    let under = check_limits(&limits, tracker.as_ref(), Money::inr(dec!(1000)), now, tz);
    assert!(under.is_allowed());
}

#[tokio::test]
async fn test_limit_headroom_returns_after_rollover() {
    let store = MemorySecurityStore::new();
    let user = UserId::new();
    let tz = BusinessTimezone::default();
    let now = Utc::now();

    store
        .set_tracker(
            user,
            DailyTracker {
                spent: Money::inr(dec!(50000)),
                last_reset: now - Duration::days(1),
            },
        )
        .await;

    let limits = TransactionLimits::default();
    let tracker = store.daily_tracker(user).await.unwrap();

    let decision = check_limits(&limits, tracker.as_ref(), Money::inr(dec!(10000)), now, tz);
    assert!(decision.is_allowed());
}
