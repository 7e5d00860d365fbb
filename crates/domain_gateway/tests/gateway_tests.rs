//! Gateway domain integration tests
//!
//! Signed deposit confirmation, payout lifecycle, and webhook settlement
//! over in-memory adapters.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Money, UserId};
use domain_gateway::provider::mock::{MemoryGatewayStore, SimulatedProvider};
use domain_gateway::{
    hmac_sha256_hex, DepositConfirmation, GatewayError, PaymentGateway, WebhookOutcome,
};
use domain_ledger::ports::mock::MemoryWalletStore;
use domain_ledger::{EntryStatus, NullNotificationSink, TransferService, WalletStore};
use domain_security::ports::mock::MemorySecurityStore;

const SECRET: &[u8] = b"test-provider-secret";

struct Harness {
    gateway: PaymentGateway,
    wallet: MemoryWalletStore,
    provider: Arc<SimulatedProvider>,
}

async fn harness(accounts: &[(UserId, Money)]) -> Harness {
    let wallet = MemoryWalletStore::with_accounts(accounts).await;
    let provider = Arc::new(SimulatedProvider::new());
    let transfers = TransferService::new(
        Arc::new(wallet.clone()),
        Arc::new(MemorySecurityStore::new()),
        Arc::new(NullNotificationSink),
    );
    let gateway = PaymentGateway::new(
        provider.clone(),
        Arc::new(MemoryGatewayStore::new()),
        transfers,
        SECRET,
    );
    Harness { gateway, wallet, provider }
}

fn signed_confirmation(order_ref: &str, payment_ref: &str) -> DepositConfirmation {
    let signature = hmac_sha256_hex(SECRET, format!("{order_ref}|{payment_ref}").as_bytes());
    DepositConfirmation {
        order_ref: order_ref.to_string(),
        payment_ref: payment_ref.to_string(),
        signature,
    }
}

#[tokio::test]
async fn test_confirmed_deposit_credits_wallet() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(0)))]).await;

    let order = h.gateway.create_order(Money::inr(dec!(1500))).await.unwrap();
    let confirmation = signed_confirmation(&order.order_ref, "pay_1");

    h.gateway
        .confirm_deposit(user, confirmation, Money::inr(dec!(1500)))
        .await
        .unwrap();
    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(1500));
}

#[tokio::test]
async fn test_bad_signature_credits_nothing() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(0)))]).await;

    let confirmation = DepositConfirmation {
        order_ref: "order_0".to_string(),
        payment_ref: "pay_1".to_string(),
        signature: "0".repeat(64),
    };

    let result = h
        .gateway
        .confirm_deposit(user, confirmation, Money::inr(dec!(1500)))
        .await;
    assert!(matches!(result, Err(GatewayError::InvalidSignature)));
    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(0));
}

#[tokio::test]
async fn test_retried_confirmation_credits_once() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(0)))]).await;
    let confirmation = signed_confirmation("order_0", "pay_1");

    h.gateway
        .confirm_deposit(user, confirmation.clone(), Money::inr(dec!(900)))
        .await
        .unwrap();
    h.gateway
        .confirm_deposit(user, confirmation, Money::inr(dec!(900)))
        .await
        .unwrap();

    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(900));
    assert_eq!(h.wallet.all_entries().await.len(), 1);
}

#[tokio::test]
async fn test_payout_requires_linked_account() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(1000)))]).await;

    let result = h.gateway.initiate_payout(user, Money::inr(dec!(500))).await;
    assert!(matches!(result, Err(GatewayError::NoPayoutTarget)));
    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(1000));
}

#[tokio::test]
async fn test_expired_link_rejected() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(1000)))]).await;

    h.gateway
        .link_payout_account(
            user,
            "A Holder",
            "HDFC0001234",
            "123456789012",
            Some(Utc::now() - Duration::days(1)),
        )
        .await
        .unwrap();

    let result = h.gateway.initiate_payout(user, Money::inr(dec!(500))).await;
    assert!(matches!(result, Err(GatewayError::PayoutTargetExpired)));
}

#[tokio::test]
async fn test_payout_lifecycle_processed() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(1000)))]).await;

    let linked = h
        .gateway
        .link_payout_account(user, "A Holder", "HDFC0001234", "123456789012", None)
        .await
        .unwrap();
    assert_eq!(linked.account_last4, "9012");

    let (receipt, reference) = h
        .gateway
        .initiate_payout(user, Money::inr(dec!(400)))
        .await
        .unwrap();
    assert_eq!(receipt.entry.status, EntryStatus::Processing);
    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(600));

    let body = format!(
        r#"{{"event":"payout.processed","payload":{{"payout":{{"reference_id":"{reference}"}}}}}}"#
    );
    let signature = hmac_sha256_hex(SECRET, body.as_bytes());

    let outcome = h.gateway.handle_webhook(&body, &signature).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::PayoutCompleted { reference: reference.clone() });

    let entry = h.wallet.find_by_reference(&reference).await.unwrap().unwrap();
    assert_eq!(entry.status, EntryStatus::Completed);
    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(600));
}

#[tokio::test]
async fn test_payout_failure_webhook_refunds_once() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(1000)))]).await;

    h.gateway
        .link_payout_account(user, "A Holder", "HDFC0001234", "123456789012", None)
        .await
        .unwrap();
    let (_, reference) = h
        .gateway
        .initiate_payout(user, Money::inr(dec!(400)))
        .await
        .unwrap();

    let body = format!(
        r#"{{"event":"payout.failed","payload":{{"payout":{{"reference_id":"{reference}"}}}}}}"#
    );
    let signature = hmac_sha256_hex(SECRET, body.as_bytes());

    let first = h.gateway.handle_webhook(&body, &signature).await.unwrap();
    assert_eq!(first, WebhookOutcome::PayoutRefunded { reference: reference.clone() });
    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(1000));

    // Duplicate delivery settles nothing further
    h.gateway.handle_webhook(&body, &signature).await.unwrap();
    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(1000));
}

#[tokio::test]
async fn test_provider_error_compensates_immediately() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(1000)))]).await;

    h.gateway
        .link_payout_account(user, "A Holder", "HDFC0001234", "123456789012", None)
        .await
        .unwrap();
    h.provider.fail_payouts(true);

    let result = h.gateway.initiate_payout(user, Money::inr(dec!(400))).await;
    assert!(result.is_err());

    // Debit was compensated; the failed attempt is visible in the ledger
    assert_eq!(h.wallet.balance(user).await.unwrap().amount(), dec!(1000));
    let entries = h.wallet.all_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, EntryStatus::Failed);
}

#[tokio::test]
async fn test_webhook_with_bad_signature_rejected() {
    let user = UserId::new();
    let h = harness(&[(user, Money::inr(dec!(1000)))]).await;

    let body = r#"{"event":"payout.failed","payload":{"payout":{"reference_id":"pout_x"}}}"#;
    let result = h.gateway.handle_webhook(body, "deadbeef").await;
    assert!(matches!(result, Err(GatewayError::InvalidSignature)));
}

#[tokio::test]
async fn test_irrelevant_event_ignored() {
    let h = harness(&[]).await;
    let body = r#"{"event":"order.paid","payload":{}}"#;
    let signature = hmac_sha256_hex(SECRET, body.as_bytes());

    let outcome = h.gateway.handle_webhook(body, &signature).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Ignored { event: "order.paid".to_string() });
}
