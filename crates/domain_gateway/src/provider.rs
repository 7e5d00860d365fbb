//! Payment provider port and the gateway service
//!
//! The provider is external: orders, fund-account registration, and payout
//! execution happen on its side. The gateway composes those calls with the
//! transfer orchestrator so that money only enters the wallet behind a
//! verified signature and only leaves toward a persisted, unexpired payout
//! target.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use core_kernel::{DomainPort, Money, PortError, UserId};
use domain_ledger::{
    EntryStatus, PaymentMethod, PayoutSettlement, Receipt, TransferService, WalletStore,
};

use crate::error::GatewayError;
use crate::signature::verify_signature;
use crate::webhook::{parse_event, WebhookOutcome};

/// A funding order created at the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub order_ref: String,
    pub amount: Money,
}

/// A signed confirmation that the customer paid a funding order
#[derive(Debug, Clone, Deserialize)]
pub struct DepositConfirmation {
    pub order_ref: String,
    pub payment_ref: String,
    pub signature: String,
}

/// A persisted payout target
///
/// Stored durably with an explicit expiry, never as process-local state: a
/// restart or scale-out must not lose linked accounts. Only the last four
/// digits of the account number are retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedPayoutAccount {
    pub user: UserId,
    /// Provider-side fund account credential
    pub fund_account_ref: String,
    pub holder_name: String,
    pub ifsc: String,
    pub account_last4: String,
    pub linked_at: DateTime<Utc>,
    /// When the provider credential lapses and re-linking is required
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkedPayoutAccount {
    /// Returns true if the credential is still usable at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Port to the external payment provider
#[async_trait]
pub trait PaymentProvider: DomainPort {
    /// Creates a funding order for the given amount
    async fn create_order(&self, amount: Money) -> Result<ProviderOrder, PortError>;

    /// Registers a bank account for payouts, returning the provider's
    /// fund-account credential
    async fn register_fund_account(
        &self,
        holder_name: &str,
        ifsc: &str,
        account_number: &str,
    ) -> Result<String, PortError>;

    /// Executes a payout to a registered fund account
    ///
    /// `reference` is our idempotency key; the provider echoes it back in
    /// webhooks.
    async fn create_payout(
        &self,
        fund_account_ref: &str,
        amount: Money,
        reference: &str,
    ) -> Result<(), PortError>;
}

/// Port over persisted payout targets
#[async_trait]
pub trait GatewayStore: DomainPort {
    /// Saves or replaces the user's payout target
    async fn save_payout_account(&self, account: &LinkedPayoutAccount) -> Result<(), PortError>;

    /// Loads the user's payout target, if linked
    async fn payout_account(&self, user: UserId)
        -> Result<Option<LinkedPayoutAccount>, PortError>;
}

/// Orders, confirmations, payouts, and webhook settlement
#[derive(Clone)]
pub struct PaymentGateway {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn GatewayStore>,
    transfers: TransferService,
    /// Shared secret for confirmation and webhook signatures
    secret: Vec<u8>,
}

impl PaymentGateway {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn GatewayStore>,
        transfers: TransferService,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            provider,
            store,
            transfers,
            secret: secret.into(),
        }
    }

    /// Creates a funding order at the provider
    pub async fn create_order(&self, amount: Money) -> Result<ProviderOrder, GatewayError> {
        if !amount.is_positive() {
            return Err(GatewayError::InvalidAmount);
        }
        Ok(self.provider.create_order(amount).await?)
    }

    /// Verifies a payment confirmation and credits the wallet
    ///
    /// The signature covers `"{order_ref}|{payment_ref}"`. The payment
    /// reference doubles as the deposit's idempotency key, so a retried
    /// confirmation credits exactly once.
    pub async fn confirm_deposit(
        &self,
        user: UserId,
        confirmation: DepositConfirmation,
        amount: Money,
    ) -> Result<Receipt, GatewayError> {
        let message = format!("{}|{}", confirmation.order_ref, confirmation.payment_ref);
        if !verify_signature(&self.secret, message.as_bytes(), &confirmation.signature) {
            warn!(user = %user, order = %confirmation.order_ref, "Rejected deposit with bad signature");
            return Err(GatewayError::InvalidSignature);
        }

        let receipt = self
            .transfers
            .deposit(
                user,
                amount,
                PaymentMethod::Upi,
                None,
                Some(confirmation.payment_ref),
            )
            .await?;
        Ok(receipt)
    }

    /// Links a bank account for payouts
    ///
    /// Registers the account at the provider and persists the credential;
    /// only the last four digits of the account number are stored.
    pub async fn link_payout_account(
        &self,
        user: UserId,
        holder_name: &str,
        ifsc: &str,
        account_number: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<LinkedPayoutAccount, GatewayError> {
        let fund_account_ref = self
            .provider
            .register_fund_account(holder_name, ifsc, account_number)
            .await?;

        let last4 = account_number
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        let account = LinkedPayoutAccount {
            user,
            fund_account_ref,
            holder_name: holder_name.to_string(),
            ifsc: ifsc.to_string(),
            account_last4: last4,
            linked_at: Utc::now(),
            expires_at,
        };
        self.store.save_payout_account(&account).await?;
        info!(user = %user, "Payout account linked");
        Ok(account)
    }

    /// Debits the wallet and executes a payout to the linked bank account
    ///
    /// The debit commits first with status `processing` under a fresh
    /// payout reference; the provider call follows. If the provider call
    /// fails outright, the debit is compensated immediately; otherwise the
    /// entry settles when the webhook arrives.
    pub async fn initiate_payout(
        &self,
        user: UserId,
        amount: Money,
    ) -> Result<(Receipt, String), GatewayError> {
        if !amount.is_positive() {
            return Err(GatewayError::InvalidAmount);
        }

        let account = self
            .store
            .payout_account(user)
            .await?
            .ok_or(GatewayError::NoPayoutTarget)?;
        if !account.is_fresh(Utc::now()) {
            return Err(GatewayError::PayoutTargetExpired);
        }

        let reference = format!("pout_{}", Uuid::new_v4().simple());
        let receipt = self
            .transfers
            .withdraw(
                user,
                amount,
                PaymentMethod::BankTransfer,
                EntryStatus::Processing,
                Some("Withdraw to bank".to_string()),
                Some(reference.clone()),
            )
            .await?;

        if let Err(e) = self
            .provider
            .create_payout(&account.fund_account_ref, amount, &reference)
            .await
        {
            error!(user = %user, reference = %reference, error = %e, "Provider payout failed; compensating");
            self.transfers
                .store()
                .settle_payout(&reference, PayoutSettlement::Failed)
                .await
                .map_err(domain_ledger::WalletError::from)?;
            return Err(GatewayError::Store(e));
        }

        Ok((receipt, reference))
    }

    /// Verifies and applies a provider webhook
    ///
    /// Settlement is idempotent on the payout reference: redelivered
    /// webhooks return the already-settled entry without moving money.
    pub async fn handle_webhook(
        &self,
        raw_body: &str,
        signature: &str,
    ) -> Result<WebhookOutcome, GatewayError> {
        if !verify_signature(&self.secret, raw_body.as_bytes(), signature) {
            warn!("Rejected webhook with bad signature");
            return Err(GatewayError::InvalidSignature);
        }

        let event = parse_event(raw_body)?;
        let Some(payout) = event.payload.payout.as_ref() else {
            return Ok(WebhookOutcome::Ignored { event: event.event });
        };

        match event.event.as_str() {
            "payout.processed" => {
                self.transfers
                    .store()
                    .settle_payout(&payout.reference_id, PayoutSettlement::Processed)
                    .await
                    .map_err(domain_ledger::WalletError::from)?;
                Ok(WebhookOutcome::PayoutCompleted {
                    reference: payout.reference_id.clone(),
                })
            }
            "payout.failed" => {
                self.transfers
                    .store()
                    .settle_payout(&payout.reference_id, PayoutSettlement::Failed)
                    .await
                    .map_err(domain_ledger::WalletError::from)?;
                info!(reference = %payout.reference_id, "Payout failed; wallet refunded");
                Ok(WebhookOutcome::PayoutRefunded {
                    reference: payout.reference_id.clone(),
                })
            }
            other => Ok(WebhookOutcome::Ignored {
                event: other.to_string(),
            }),
        }
    }
}

/// Provider that fulfills the contract entirely in-process
///
/// Used until a real provider rail is wired up, and by the test suites;
/// references are deterministic counters.
#[derive(Debug, Default)]
pub struct SimulatedProvider {
    counter: std::sync::atomic::AtomicU64,
    fail_payouts: std::sync::atomic::AtomicBool,
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes payout execution fail at the provider
    pub fn fail_payouts(&self, fail: bool) {
        self.fail_payouts
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

impl DomainPort for SimulatedProvider {}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    async fn create_order(&self, amount: Money) -> Result<ProviderOrder, PortError> {
        let n = self.counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(ProviderOrder {
            order_ref: format!("order_{n}"),
            amount,
        })
    }

    async fn register_fund_account(
        &self,
        _holder_name: &str,
        _ifsc: &str,
        _account_number: &str,
    ) -> Result<String, PortError> {
        let n = self.counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(format!("fa_{n}"))
    }

    async fn create_payout(
        &self,
        _fund_account_ref: &str,
        _amount: Money,
        _reference: &str,
    ) -> Result<(), PortError> {
        if self.fail_payouts.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PortError::connection("Provider unavailable"));
        }
        Ok(())
    }
}

/// In-memory gateway store for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    pub use super::SimulatedProvider;

    /// In-memory gateway store
    #[derive(Debug, Default, Clone)]
    pub struct MemoryGatewayStore {
        accounts: Arc<Mutex<HashMap<UserId, LinkedPayoutAccount>>>,
    }

    impl MemoryGatewayStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemoryGatewayStore {}

    #[async_trait]
    impl GatewayStore for MemoryGatewayStore {
        async fn save_payout_account(
            &self,
            account: &LinkedPayoutAccount,
        ) -> Result<(), PortError> {
            self.accounts
                .lock()
                .await
                .insert(account.user, account.clone());
            Ok(())
        }

        async fn payout_account(
            &self,
            user: UserId,
        ) -> Result<Option<LinkedPayoutAccount>, PortError> {
            Ok(self.accounts.lock().await.get(&user).cloned())
        }
    }
}
