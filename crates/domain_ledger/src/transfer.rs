//! Transfer orchestrator
//!
//! Composes the PIN guard, the limit policy, and the wallet store into the
//! single operation every money movement in the system reduces to. The
//! precondition chain short-circuits on the first failure and nothing
//! touches a balance until the store's atomic `commit`; everything after
//! the commit (daily tracker, audit, notifications) is best-effort and is
//! never rolled back.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use core_kernel::{BusinessTimezone, Money, UserId};
use domain_security::{
    check_limits, AuditAction, AuditEvent, LimitDecision, PinVerdict, SecurityStore,
};

use crate::entry::{EntryStatus, LedgerEntry, LedgerPosting, PaymentMethod};
use crate::error::WalletError;
use crate::ports::{NotificationSink, WalletStore};

/// Who asked for the movement
#[derive(Debug, Clone)]
pub enum Initiator {
    /// An end user; the PIN gate and velocity limits apply
    User { pin: Option<String> },
    /// The system itself (scheduled payments); authorization happened when
    /// the schedule was created, so PIN and limits are skipped
    System,
}

/// A wallet-to-wallet transfer command
#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub source: UserId,
    pub target: UserId,
    pub amount: Money,
    pub description: Option<String>,
    pub initiator: Initiator,
}

/// Result of a committed operation
#[derive(Debug, Clone)]
pub struct Receipt {
    pub entry: LedgerEntry,
}

/// The transfer orchestrator
///
/// Holds no state of its own and no locks across store calls; correctness
/// comes entirely from the store's transaction isolation.
#[derive(Clone)]
pub struct TransferService {
    store: Arc<dyn WalletStore>,
    security: Arc<dyn SecurityStore>,
    notifier: Arc<dyn NotificationSink>,
    timezone: BusinessTimezone,
}

impl TransferService {
    /// Creates the orchestrator over its three collaborators
    pub fn new(
        store: Arc<dyn WalletStore>,
        security: Arc<dyn SecurityStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            security,
            notifier,
            timezone: BusinessTimezone::default(),
        }
    }

    /// Overrides the business timezone for day-boundary decisions
    pub fn with_timezone(mut self, timezone: BusinessTimezone) -> Self {
        self.timezone = timezone;
        self
    }

    /// Access to the underlying store for read paths
    pub fn store(&self) -> &Arc<dyn WalletStore> {
        &self.store
    }

    /// Moves money between two wallets
    ///
    /// Precondition order: amount > 0, no self-payment, PIN gate, limit
    /// check, then the atomic commit (which itself enforces balance and
    /// account existence). On commit, the daily tracker, audit trail, and
    /// notifications are updated outside the unit.
    ///
    /// # Errors
    ///
    /// See [`WalletError`]; every rejection names its cause.
    pub async fn transfer(&self, command: TransferCommand) -> Result<Receipt, WalletError> {
        if !command.amount.is_positive() {
            return Err(WalletError::InvalidAmount);
        }
        if command.source == command.target {
            return Err(WalletError::SelfTransfer);
        }

        let user_initiated = matches!(command.initiator, Initiator::User { .. });

        if let Initiator::User { pin } = &command.initiator {
            self.enforce_pin(command.source, pin.as_deref()).await?;
            self.enforce_limits(command.source, command.amount).await?;
        }

        let description = command
            .description
            .clone()
            .unwrap_or_else(|| "Transfer to user".to_string());
        let posting =
            LedgerPosting::transfer(command.source, command.target, command.amount, description);

        let entry = self.store.commit(posting).await?;

        info!(
            entry = %entry.id,
            source = %command.source,
            target = %command.target,
            amount = %command.amount,
            "Transfer committed"
        );

        if user_initiated {
            if let Err(e) = self
                .security
                .record_daily_transfer(command.source, command.amount, Utc::now())
                .await
            {
                warn!(user = %command.source, error = %e, "Daily tracker update failed after commit");
            }
        }
        self.audit(AuditEvent::success(
            command.source,
            AuditAction::Transfer,
            format!("{} to {}", command.amount, command.target),
        ))
        .await;
        self.notify(command.target, &format!("You received {}", command.amount))
            .await;

        Ok(Receipt { entry })
    }

    /// Credits money entering from an external rail
    ///
    /// No PIN or limit check: funding was validated by the provider's
    /// signed confirmation before this is called. A duplicate `reference`
    /// returns the original entry (idempotent).
    pub async fn deposit(
        &self,
        user: UserId,
        amount: Money,
        method: PaymentMethod,
        description: Option<String>,
        reference: Option<String>,
    ) -> Result<Receipt, WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::InvalidAmount);
        }

        let description =
            description.unwrap_or_else(|| format!("Added money via {}", method.as_str()));
        let mut posting = LedgerPosting::deposit(user, amount, method, description);
        if let Some(reference) = reference {
            posting = posting.with_reference(reference);
        }

        let entry = self.store.commit(posting).await?;
        info!(entry = %entry.id, user = %user, amount = %amount, "Deposit committed");

        self.audit(AuditEvent::success(
            user,
            AuditAction::Deposit,
            format!("{} via {}", amount, method.as_str()),
        ))
        .await;
        self.notify(user, &format!("{} added to your wallet", amount))
            .await;

        Ok(Receipt { entry })
    }

    /// Debits money leaving to an external rail
    ///
    /// Direct withdrawals commit `completed`; provider payouts pass
    /// `EntryStatus::Processing` plus a payout reference and are settled
    /// later by the provider's webhook.
    pub async fn withdraw(
        &self,
        user: UserId,
        amount: Money,
        method: PaymentMethod,
        status: EntryStatus,
        description: Option<String>,
        reference: Option<String>,
    ) -> Result<Receipt, WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::InvalidAmount);
        }

        let description =
            description.unwrap_or_else(|| format!("Withdrew money via {}", method.as_str()));
        let mut posting = LedgerPosting::withdrawal(user, amount, method, status, description);
        if let Some(reference) = reference {
            posting = posting.with_reference(reference);
        }

        let entry = self.store.commit(posting).await?;
        info!(entry = %entry.id, user = %user, amount = %amount, "Withdrawal committed");

        self.audit(AuditEvent::success(
            user,
            AuditAction::Withdrawal,
            format!("{} via {}", amount, method.as_str()),
        ))
        .await;

        Ok(Receipt { entry })
    }

    /// Runs the PIN gate for a user-initiated movement
    async fn enforce_pin(&self, user: UserId, pin: Option<&str>) -> Result<(), WalletError> {
        let Some(mut record) = self.security.pin_record(user).await? else {
            return Err(WalletError::PinSetupRequired);
        };

        let now = Utc::now();
        if record.is_locked(now) {
            return Err(WalletError::PinLocked {
                minutes_remaining: record.minutes_until_unlock(now),
            });
        }

        let Some(pin) = pin else {
            return Err(WalletError::PinRequired);
        };

        let verdict = record.verify(pin, now);
        // Counter updates persist regardless of the verdict; a lost write
        // here only under-counts failures, never blocks a valid user.
        if let Err(e) = self.security.save_pin_record(user, &record).await {
            warn!(user = %user, error = %e, "Failed to persist PIN counters");
        }

        match verdict {
            PinVerdict::Approved => Ok(()),
            PinVerdict::Rejected { attempts_remaining } => {
                self.audit(AuditEvent::failure(
                    user,
                    AuditAction::AuthFailure,
                    "Incorrect transaction PIN",
                ))
                .await;
                Err(WalletError::PinIncorrect { attempts_remaining })
            }
            PinVerdict::LockedNow { minutes_remaining } => {
                self.audit(AuditEvent::failure(
                    user,
                    AuditAction::PinLocked,
                    "Failure budget exhausted",
                ))
                .await;
                Err(WalletError::PinLockedNow { minutes_remaining })
            }
            PinVerdict::Locked { minutes_remaining } => {
                Err(WalletError::PinLocked { minutes_remaining })
            }
        }
    }

    /// Runs the advisory limit check for a user-initiated transfer
    async fn enforce_limits(&self, user: UserId, amount: Money) -> Result<(), WalletError> {
        let limits = self.security.limits(user).await?;
        let tracker = self.security.daily_tracker(user).await?;

        match check_limits(&limits, tracker.as_ref(), amount, Utc::now(), self.timezone) {
            LimitDecision::Allowed => Ok(()),
            LimitDecision::Rejected(breach) => {
                self.audit(AuditEvent::failure(
                    user,
                    AuditAction::LimitExceeded,
                    breach.to_string(),
                ))
                .await;
                Err(WalletError::LimitExceeded(breach.to_string()))
            }
        }
    }

    async fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.security.record_audit(event).await {
            warn!(error = %e, "Audit write failed");
        }
    }

    async fn notify(&self, user: UserId, message: &str) {
        if let Err(e) = self.notifier.notify(user, message).await {
            warn!(user = %user, error = %e, "Notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MemoryWalletStore;
    use domain_security::ports::mock::MemorySecurityStore;
    use domain_security::{PinHash, PinRecord};
    use crate::ports::NullNotificationSink;
    use rust_decimal_macros::dec;

    const TEST_COST: u32 = 4;

    async fn service_with(
        accounts: &[(UserId, Money)],
    ) -> (TransferService, MemoryWalletStore, Arc<MemorySecurityStore>) {
        let store = MemoryWalletStore::with_accounts(accounts).await;
        let security = Arc::new(MemorySecurityStore::new());
        let service = TransferService::new(
            Arc::new(store.clone()),
            security.clone(),
            Arc::new(NullNotificationSink),
        );
        (service, store, security)
    }

    async fn set_pin(security: &MemorySecurityStore, user: UserId, pin: &str) {
        let record = PinRecord::new(PinHash::derive(pin, TEST_COST));
        security.save_pin_record(user, &record).await.unwrap();
    }

    fn user_command(source: UserId, target: UserId, amount: Money, pin: &str) -> TransferCommand {
        TransferCommand {
            source,
            target,
            amount,
            description: None,
            initiator: Initiator::User {
                pin: Some(pin.to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_before_store() {
        let a = UserId::new();
        let b = UserId::new();
        let (service, store, _) = service_with(&[(a, Money::inr(dec!(100)))]).await;

        let result = service
            .transfer(user_command(a, b, Money::zero(Default::default()), "4242"))
            .await;

        assert!(matches!(result, Err(WalletError::InvalidAmount)));
        assert!(store.all_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_self_transfer_rejected() {
        let a = UserId::new();
        let (service, _, security) = service_with(&[(a, Money::inr(dec!(100)))]).await;
        set_pin(&security, a, "4242").await;

        let result = service
            .transfer(user_command(a, a, Money::inr(dec!(10)), "4242"))
            .await;
        assert!(matches!(result, Err(WalletError::SelfTransfer)));
    }

    #[tokio::test]
    async fn test_missing_pin_record_asks_for_setup() {
        let a = UserId::new();
        let b = UserId::new();
        let (service, _, _) =
            service_with(&[(a, Money::inr(dec!(100))), (b, Money::inr(dec!(0)))]).await;

        let result = service
            .transfer(user_command(a, b, Money::inr(dec!(10)), "4242"))
            .await;
        assert!(matches!(result, Err(WalletError::PinSetupRequired)));
    }

    #[tokio::test]
    async fn test_happy_path_transfer() {
        let a = UserId::new();
        let b = UserId::new();
        let (service, store, security) =
            service_with(&[(a, Money::inr(dec!(1000))), (b, Money::inr(dec!(500)))]).await;
        set_pin(&security, a, "4242").await;

        let receipt = service
            .transfer(user_command(a, b, Money::inr(dec!(300)), "4242"))
            .await
            .unwrap();

        assert_eq!(receipt.entry.amount.amount(), dec!(300));
        assert_eq!(store.balance(a).await.unwrap().amount(), dec!(700));
        assert_eq!(store.balance(b).await.unwrap().amount(), dec!(800));
        assert_eq!(store.all_entries().await.len(), 1);

        // Daily tracker recorded post-commit
        let tracker = security.daily_tracker(a).await.unwrap().unwrap();
        assert_eq!(tracker.spent.amount(), dec!(300));
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_balance_unchanged() {
        let a = UserId::new();
        let b = UserId::new();
        let (service, store, security) =
            service_with(&[(a, Money::inr(dec!(700))), (b, Money::inr(dec!(800)))]).await;
        set_pin(&security, a, "4242").await;

        let result = service
            .transfer(user_command(a, b, Money::inr(dec!(800)), "4242"))
            .await;

        assert!(matches!(result, Err(WalletError::InsufficientFunds)));
        assert_eq!(store.balance(a).await.unwrap().amount(), dec!(700));
        assert!(store.all_entries().await.is_empty());

        // A failed debit must not count against the daily cap
        assert!(security.daily_tracker(a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_pin_counts_down_then_locks() {
        let a = UserId::new();
        let b = UserId::new();
        let (service, _, security) =
            service_with(&[(a, Money::inr(dec!(1000))), (b, Money::inr(dec!(0)))]).await;
        set_pin(&security, a, "4242").await;

        let r1 = service
            .transfer(user_command(a, b, Money::inr(dec!(10)), "0000"))
            .await;
        assert!(matches!(r1, Err(WalletError::PinIncorrect { attempts_remaining: 2 })));

        let r2 = service
            .transfer(user_command(a, b, Money::inr(dec!(10)), "0000"))
            .await;
        assert!(matches!(r2, Err(WalletError::PinIncorrect { attempts_remaining: 1 })));

        let r3 = service
            .transfer(user_command(a, b, Money::inr(dec!(10)), "0000"))
            .await;
        assert!(matches!(r3, Err(WalletError::PinLockedNow { minutes_remaining: 30 })));

        // Correct PIN is refused while the lock holds
        let r4 = service
            .transfer(user_command(a, b, Money::inr(dec!(10)), "4242"))
            .await;
        assert!(matches!(r4, Err(WalletError::PinLocked { .. })));
    }

    #[tokio::test]
    async fn test_limit_breach_rejected_and_audited() {
        let a = UserId::new();
        let b = UserId::new();
        let (service, store, security) =
            service_with(&[(a, Money::inr(dec!(100000))), (b, Money::inr(dec!(0)))]).await;
        set_pin(&security, a, "4242").await;

        let result = service
            .transfer(user_command(a, b, Money::inr(dec!(10001)), "4242"))
            .await;

        match result {
            Err(WalletError::LimitExceeded(reason)) => {
                assert!(reason.contains("per-transaction limit"));
            }
            other => panic!("Expected limit rejection, got {other:?}"),
        }
        assert!(store.all_entries().await.is_empty());

        let events = security.audit_events().await;
        assert!(events
            .iter()
            .any(|e| e.action == AuditAction::LimitExceeded));
    }

    #[tokio::test]
    async fn test_system_initiator_skips_pin_and_limits() {
        let a = UserId::new();
        let b = UserId::new();
        let (service, store, _) =
            service_with(&[(a, Money::inr(dec!(100000))), (b, Money::inr(dec!(0)))]).await;

        // No PIN record, amount over the per-transaction cap: still allowed
        let receipt = service
            .transfer(TransferCommand {
                source: a,
                target: b,
                amount: Money::inr(dec!(20000)),
                description: Some("Scheduled: rent".to_string()),
                initiator: Initiator::System,
            })
            .await
            .unwrap();

        assert_eq!(receipt.entry.description, "Scheduled: rent");
        assert_eq!(store.balance(b).await.unwrap().amount(), dec!(20000));
    }

    #[tokio::test]
    async fn test_concurrent_debits_cannot_double_spend() {
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        let (service, store, security) = service_with(&[
            (a, Money::inr(dec!(1000))),
            (b, Money::inr(dec!(0))),
            (c, Money::inr(dec!(0))),
        ])
        .await;
        set_pin(&security, a, "4242").await;

        let s1 = service.clone();
        let s2 = service.clone();
        let t1 = tokio::spawn(async move {
            s1.transfer(user_command(a, b, Money::inr(dec!(600)), "4242")).await
        });
        let t2 = tokio::spawn(async move {
            s2.transfer(user_command(a, c, Money::inr(dec!(600)), "4242")).await
        });

        let (r1, r2) = (t1.await.unwrap(), t2.await.unwrap());
        let successes = [r1.is_ok(), r2.is_ok()].iter().filter(|&&ok| ok).count();

        assert_eq!(successes, 1, "exactly one of the two debits may win");
        assert_eq!(store.balance(a).await.unwrap().amount(), dec!(400));
        assert_eq!(store.all_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_conservation_across_transfers() {
        let a = UserId::new();
        let b = UserId::new();
        let (service, store, security) =
            service_with(&[(a, Money::inr(dec!(1000))), (b, Money::inr(dec!(500)))]).await;
        set_pin(&security, a, "4242").await;

        let before = store.total_balance().await;
        for _ in 0..5 {
            service
                .transfer(user_command(a, b, Money::inr(dec!(50)), "4242"))
                .await
                .unwrap();
        }
        assert_eq!(store.total_balance().await, before);
    }
}
