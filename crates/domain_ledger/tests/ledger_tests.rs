//! Ledger domain integration tests
//!
//! End-to-end scenarios over the orchestrator with in-memory adapters.

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Money, UserId};
use domain_ledger::ports::mock::MemoryWalletStore;
use domain_ledger::{
    EntryFilter, EntryKind, EntryStatus, Initiator, NullNotificationSink, PaymentMethod,
    PayoutSettlement, TransferCommand, TransferService, WalletError, WalletStore,
};
use domain_security::ports::mock::MemorySecurityStore;
use domain_security::{PinHash, PinRecord, SecurityStore};

const TEST_COST: u32 = 4;

struct Harness {
    service: TransferService,
    store: MemoryWalletStore,
    security: Arc<MemorySecurityStore>,
}

async fn harness(accounts: &[(UserId, Money)]) -> Harness {
    let store = MemoryWalletStore::with_accounts(accounts).await;
    let security = Arc::new(MemorySecurityStore::new());
    let service = TransferService::new(
        Arc::new(store.clone()),
        security.clone(),
        Arc::new(NullNotificationSink),
    );
    Harness { service, store, security }
}

async fn with_pin(h: &Harness, user: UserId, pin: &str) {
    let record = PinRecord::new(PinHash::derive(pin, TEST_COST));
    h.security.save_pin_record(user, &record).await.unwrap();
}

fn cmd(source: UserId, target: UserId, amount: Money) -> TransferCommand {
    TransferCommand {
        source,
        target,
        amount,
        description: None,
        initiator: Initiator::User { pin: Some("4242".to_string()) },
    }
}

/// A transfers 300 to B with a correct PIN: balances 700/800 and exactly
/// one completed ledger entry. A then attempts 800: rejected, balance
/// unchanged, no new entry.
#[tokio::test]
async fn test_transfer_then_overdraft_scenario() {
    let a = UserId::new();
    let b = UserId::new();
    let h = harness(&[(a, Money::inr(dec!(1000))), (b, Money::inr(dec!(500)))]).await;
    with_pin(&h, a, "4242").await;

    let receipt = h.service.transfer(cmd(a, b, Money::inr(dec!(300)))).await.unwrap();
    assert_eq!(receipt.entry.status, EntryStatus::Completed);
    assert!(matches!(receipt.entry.kind, EntryKind::Transfer { from, to } if from == a && to == b));
    assert_eq!(h.store.balance(a).await.unwrap().amount(), dec!(700));
    assert_eq!(h.store.balance(b).await.unwrap().amount(), dec!(800));
    assert_eq!(h.store.all_entries().await.len(), 1);

    let overdraft = h.service.transfer(cmd(a, b, Money::inr(dec!(800)))).await;
    assert!(matches!(overdraft, Err(WalletError::InsufficientFunds)));
    assert_eq!(h.store.balance(a).await.unwrap().amount(), dec!(700));
    assert_eq!(h.store.all_entries().await.len(), 1);
}

/// Injected failure at the ledger-append step rolls the whole unit back.
#[tokio::test]
async fn test_append_failure_rolls_back_balances() {
    let a = UserId::new();
    let b = UserId::new();
    let h = harness(&[(a, Money::inr(dec!(1000))), (b, Money::inr(dec!(500)))]).await;
    with_pin(&h, a, "4242").await;

    h.store.fail_appends(true);
    let result = h.service.transfer(cmd(a, b, Money::inr(dec!(300)))).await;
    assert!(matches!(result, Err(WalletError::Store(_))));

    assert_eq!(h.store.balance(a).await.unwrap().amount(), dec!(1000));
    assert_eq!(h.store.balance(b).await.unwrap().amount(), dec!(500));
    assert!(h.store.all_entries().await.is_empty());

    // A failed unit must not consume daily headroom either
    assert!(h.security.daily_tracker(a).await.unwrap().is_none());
}

/// Transfers conserve the total across all accounts.
#[tokio::test]
async fn test_conservation() {
    let a = UserId::new();
    let b = UserId::new();
    let c = UserId::new();
    let h = harness(&[
        (a, Money::inr(dec!(1000))),
        (b, Money::inr(dec!(250))),
        (c, Money::inr(dec!(0))),
    ])
    .await;
    with_pin(&h, a, "4242").await;
    with_pin(&h, b, "4242").await;

    let before = h.store.total_balance().await;
    h.service.transfer(cmd(a, b, Money::inr(dec!(400)))).await.unwrap();
    h.service.transfer(cmd(b, c, Money::inr(dec!(650)))).await.unwrap();
    h.service.transfer(cmd(a, c, Money::inr(dec!(100)))).await.unwrap();
    assert_eq!(h.store.total_balance().await, before);
}

/// Deposits are credit-only with no PIN involvement, and provider retries
/// replay idempotently on the reference.
#[tokio::test]
async fn test_deposit_idempotency() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(0)))]).await;

    let first = h
        .service
        .deposit(
            user,
            Money::inr(dec!(2500)),
            PaymentMethod::Upi,
            None,
            Some("pay_42".to_string()),
        )
        .await
        .unwrap();
    let second = h
        .service
        .deposit(
            user,
            Money::inr(dec!(2500)),
            PaymentMethod::Upi,
            None,
            Some("pay_42".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(first.entry.id, second.entry.id);
    assert_eq!(h.store.balance(user).await.unwrap().amount(), dec!(2500));
}

/// A provider payout commits as processing, then settles; failure credits
/// the money back and flips the entry exactly once.
#[tokio::test]
async fn test_payout_failure_compensation() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(1000)))]).await;

    h.service
        .withdraw(
            user,
            Money::inr(dec!(700)),
            PaymentMethod::BankTransfer,
            EntryStatus::Processing,
            None,
            Some("pout_7".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(h.store.balance(user).await.unwrap().amount(), dec!(300));

    let settled = h
        .store
        .settle_payout("pout_7", PayoutSettlement::Failed)
        .await
        .unwrap();
    assert_eq!(settled.status, EntryStatus::Failed);
    assert_eq!(h.store.balance(user).await.unwrap().amount(), dec!(1000));

    // Redelivered webhook: no double refund
    h.store.settle_payout("pout_7", PayoutSettlement::Failed).await.unwrap();
    assert_eq!(h.store.balance(user).await.unwrap().amount(), dec!(1000));
}

/// History honors direction and limit filters, newest first.
#[tokio::test]
async fn test_history_filters() {
    let a = UserId::new();
    let b = UserId::new();
    let h = harness(&[(a, Money::inr(dec!(1000))), (b, Money::inr(dec!(1000)))]).await;
    with_pin(&h, a, "4242").await;
    with_pin(&h, b, "4242").await;

    h.service.transfer(cmd(a, b, Money::inr(dec!(10)))).await.unwrap();
    h.service.transfer(cmd(b, a, Money::inr(dec!(20)))).await.unwrap();
    h.service.transfer(cmd(a, b, Money::inr(dec!(30)))).await.unwrap();

    let all = h.store.entries(a, EntryFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    // Newest first
    assert_eq!(all[0].amount.amount(), dec!(30));

    let outgoing = h
        .store
        .entries(
            a,
            EntryFilter {
                direction: Some(domain_ledger::entry::EntryDirection::Outgoing),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outgoing.len(), 2);

    let limited = h.store.entries(a, EntryFilter::recent(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}
