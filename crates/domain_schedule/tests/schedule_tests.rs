//! Schedule domain integration tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Money, UserId};
use domain_ledger::ports::mock::MemoryWalletStore;
use domain_ledger::{NullNotificationSink, TransferService};
use domain_schedule::ports::mock::MemoryScheduleStore;
use domain_schedule::{Frequency, ScheduleRunner, ScheduleStatus, ScheduleStore, ScheduledPayment};
use domain_security::ports::mock::MemorySecurityStore;

async fn setup(
    accounts: &[(UserId, Money)],
) -> (ScheduleRunner, Arc<MemoryScheduleStore>) {
    let wallet = MemoryWalletStore::with_accounts(accounts).await;
    let schedules = Arc::new(MemoryScheduleStore::new());
    let transfers = TransferService::new(
        Arc::new(wallet),
        Arc::new(MemorySecurityStore::new()),
        Arc::new(NullNotificationSink),
    );
    (ScheduleRunner::new(schedules.clone(), transfers), schedules)
}

#[tokio::test]
async fn test_monthly_schedule_lifecycle_through_runner() {
    let owner = UserId::new();
    let beneficiary = UserId::new();
    let (runner, schedules) = setup(&[
        (owner, Money::inr(dec!(10000))),
        (beneficiary, Money::inr(dec!(0))),
    ])
    .await;

    let start = Utc::now();
    let monthly = ScheduledPayment::new(
        owner,
        beneficiary,
        Money::inr(dec!(1000)),
        Some("subscription".to_string()),
        Frequency::Monthly,
        start,
        None,
    )
    .unwrap();
    schedules.create(&monthly).await.unwrap();

    // Three monthly fires, each exactly one calendar month apart
    let mut at = start;
    for expected_runs in 1..=3u32 {
        let summary = runner.sweep(at).await;
        assert_eq!(summary.processed, 1);

        let current = schedules.get(monthly.id).await.unwrap();
        assert_eq!(current.status, ScheduleStatus::Active);
        assert_eq!(current.run_count, expected_runs);
        at = current.next_run;
    }
}

#[tokio::test]
async fn test_end_date_retires_schedule() {
    let owner = UserId::new();
    let beneficiary = UserId::new();
    let (runner, schedules) = setup(&[
        (owner, Money::inr(dec!(10000))),
        (beneficiary, Money::inr(dec!(0))),
    ])
    .await;

    let start = Utc::now();
    let weekly = ScheduledPayment::new(
        owner,
        beneficiary,
        Money::inr(dec!(200)),
        None,
        Frequency::Weekly,
        start,
        Some(start + Duration::days(10)),
    )
    .unwrap();
    schedules.create(&weekly).await.unwrap();

    // First run fires; the advance (start + 7d) is within the end date
    runner.sweep(start).await;
    let after_first = schedules.get(weekly.id).await.unwrap();
    assert_eq!(after_first.status, ScheduleStatus::Active);

    // Second run advances past the end date and retires the schedule
    runner.sweep(after_first.next_run).await;
    let after_second = schedules.get(weekly.id).await.unwrap();
    assert_eq!(after_second.status, ScheduleStatus::Completed);
    assert_eq!(after_second.run_count, 2);
}

#[tokio::test]
async fn test_paused_schedule_is_skipped_then_resumes() {
    let owner = UserId::new();
    let beneficiary = UserId::new();
    let (runner, schedules) = setup(&[
        (owner, Money::inr(dec!(10000))),
        (beneficiary, Money::inr(dec!(0))),
    ])
    .await;

    let mut daily = ScheduledPayment::new(
        owner,
        beneficiary,
        Money::inr(dec!(100)),
        None,
        Frequency::Daily,
        Utc::now(),
        None,
    )
    .unwrap();
    daily.toggle().unwrap();
    schedules.create(&daily).await.unwrap();

    assert_eq!(runner.sweep(Utc::now()).await.processed, 0);

    let mut stored = schedules.get(daily.id).await.unwrap();
    stored.toggle().unwrap();
    schedules.update(&stored).await.unwrap();

    assert_eq!(runner.sweep(Utc::now()).await.processed, 1);
}

#[tokio::test]
async fn test_delete_enforces_ownership() {
    let owner = UserId::new();
    let beneficiary = UserId::new();
    let (_, schedules) = setup(&[]).await;

    let schedule = ScheduledPayment::new(
        owner,
        beneficiary,
        Money::inr(dec!(100)),
        None,
        Frequency::Once,
        Utc::now(),
        None,
    )
    .unwrap();
    schedules.create(&schedule).await.unwrap();

    let stranger = UserId::new();
    assert!(schedules.delete(schedule.id, stranger).await.is_err());
    schedules.delete(schedule.id, owner).await.unwrap();
    assert!(schedules.get(schedule.id).await.is_err());
}
