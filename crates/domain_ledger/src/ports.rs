//! Ledger Domain Ports
//!
//! The [`WalletStore`] port is where the system's one non-negotiable
//! invariant lives: `commit` applies a posting's balance mutations and the
//! ledger append as a single atomic unit. Adapters enforce this with the
//! store's own transaction isolation (row-level locking in PostgreSQL, a
//! single state lock in the mock) - never with application-level locks held
//! across I/O.

use async_trait::async_trait;
use thiserror::Error;

use core_kernel::{DomainPort, Money, PortError, UserId};

use crate::account::WalletAccount;
use crate::entry::{EntryFilter, LedgerEntry, LedgerPosting, PayoutSettlement};

/// Failure modes of the atomic unit
///
/// `InsufficientFunds` and `AccountNotFound` are detected *inside* the
/// unit (the conditional debit / target lookup) and guarantee the unit was
/// rolled back: no balance change, no ledger entry.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The conditional debit found the balance short of the amount
    #[error("Insufficient funds for {user}")]
    InsufficientFunds { user: UserId },

    /// A party to the posting has no wallet account
    #[error("No wallet account for {user}")]
    AccountNotFound { user: UserId },

    /// The store itself failed; the unit was rolled back
    #[error(transparent)]
    Store(#[from] PortError),
}

/// Port over the account balances and the transaction ledger
///
/// Two transfers touching disjoint account pairs may proceed fully in
/// parallel; two debits of the same account serialize on the store's own
/// conditional update.
#[async_trait]
pub trait WalletStore: DomainPort {
    /// Opens a wallet account for a user
    ///
    /// # Errors
    ///
    /// Returns `PortError::Conflict` if the user already has an account
    async fn open_account(&self, user: UserId, opening_balance: Money)
        -> Result<WalletAccount, PortError>;

    /// Returns true if the user has a wallet account
    async fn account_exists(&self, user: UserId) -> Result<bool, PortError>;

    /// Point-in-time balance read
    ///
    /// No ordering guarantee relative to concurrent mutations.
    async fn balance(&self, user: UserId) -> Result<Money, PortError>;

    /// Applies a posting as one atomic unit
    ///
    /// For a transfer: conditional debit of the source (only if the balance
    /// covers the amount), credit of the target, and the ledger append
    /// commit or roll back together. Deposits skip the debit, withdrawals
    /// skip the credit.
    ///
    /// If the posting carries a reference that has been committed before,
    /// the original entry is returned unchanged - duplicate provider
    /// retries are no-ops.
    async fn commit(&self, posting: LedgerPosting) -> Result<LedgerEntry, CommitError>;

    /// Looks up an entry by its idempotency reference
    async fn find_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>, PortError>;

    /// Settles a `processing` payout entry by reference
    ///
    /// `Processed` flips the status to completed. `Failed` flips it to
    /// failed AND credits the debited amount back to the source, in the
    /// same atomic unit as the flip. Settling an already-settled entry is
    /// a no-op returning the entry as-is.
    async fn settle_payout(
        &self,
        reference: &str,
        settlement: PayoutSettlement,
    ) -> Result<LedgerEntry, CommitError>;

    /// Entries involving the user, newest-first, filtered
    async fn entries(&self, user: UserId, filter: EntryFilter)
        -> Result<Vec<LedgerEntry>, PortError>;
}

/// Fire-and-forget notification delivery
///
/// Failures here must never affect the financial operation that triggered
/// them; callers log and move on.
#[async_trait]
pub trait NotificationSink: DomainPort {
    async fn notify(&self, user: UserId, message: &str) -> Result<(), PortError>;
}

/// Sink that drops every notification; useful for batch contexts
#[derive(Debug, Default, Clone)]
pub struct NullNotificationSink;

impl DomainPort for NullNotificationSink {}

#[async_trait]
impl NotificationSink for NullNotificationSink {
    async fn notify(&self, _user: UserId, _message: &str) -> Result<(), PortError> {
        Ok(())
    }
}

/// In-memory mock implementation of WalletStore for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::EntryId;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    use crate::entry::EntryStatus;

    #[derive(Debug, Default)]
    struct State {
        balances: HashMap<UserId, Decimal>,
        entries: Vec<LedgerEntry>,
    }

    /// In-memory wallet store
    ///
    /// All state sits behind one lock, so every `commit` is trivially
    /// atomic: checks happen and mutations apply without interleaving.
    /// `fail_appends` injects a store failure at the append step to let
    /// tests observe that nothing else was applied.
    #[derive(Debug, Default, Clone)]
    pub struct MemoryWalletStore {
        state: Arc<Mutex<State>>,
        fail_appends: Arc<AtomicBool>,
    }

    impl MemoryWalletStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates accounts for testing
        pub async fn with_accounts(accounts: &[(UserId, Money)]) -> Self {
            let store = Self::new();
            {
                let mut state = store.state.lock().await;
                for (user, balance) in accounts {
                    state.balances.insert(*user, balance.amount());
                }
            }
            store
        }

        /// Makes the next commits fail at the ledger-append step
        pub fn fail_appends(&self, fail: bool) {
            self.fail_appends.store(fail, Ordering::SeqCst);
        }

        /// Snapshot of all committed entries, newest-first
        pub async fn all_entries(&self) -> Vec<LedgerEntry> {
            let state = self.state.lock().await;
            let mut entries = state.entries.clone();
            entries.reverse();
            entries
        }

        /// Sum of every account balance (conservation checks)
        pub async fn total_balance(&self) -> Decimal {
            let state = self.state.lock().await;
            state.balances.values().copied().sum()
        }
    }

    impl DomainPort for MemoryWalletStore {}

    #[async_trait]
    impl WalletStore for MemoryWalletStore {
        async fn open_account(
            &self,
            user: UserId,
            opening_balance: Money,
        ) -> Result<WalletAccount, PortError> {
            let mut state = self.state.lock().await;
            if state.balances.contains_key(&user) {
                return Err(PortError::conflict(format!("Account already exists for {user}")));
            }
            state.balances.insert(user, opening_balance.amount());
            Ok(WalletAccount::open(user, opening_balance))
        }

        async fn account_exists(&self, user: UserId) -> Result<bool, PortError> {
            Ok(self.state.lock().await.balances.contains_key(&user))
        }

        async fn balance(&self, user: UserId) -> Result<Money, PortError> {
            let state = self.state.lock().await;
            state
                .balances
                .get(&user)
                .map(|amount| Money::new(*amount, Default::default()))
                .ok_or_else(|| PortError::not_found("WalletAccount", user))
        }

        async fn commit(&self, posting: LedgerPosting) -> Result<LedgerEntry, CommitError> {
            let mut state = self.state.lock().await;

            // Idempotent replay on a known reference
            if let Some(reference) = posting.reference.as_deref() {
                if let Some(existing) = state
                    .entries
                    .iter()
                    .find(|e| e.reference.as_deref() == Some(reference))
                {
                    return Ok(existing.clone());
                }
            }

            let amount = posting.amount.amount();

            // All checks before any mutation; the single lock makes the
            // whole block one atomic unit.
            if let Some(debited) = posting.kind.debited() {
                let balance = state
                    .balances
                    .get(&debited)
                    .ok_or(CommitError::AccountNotFound { user: debited })?;
                if *balance < amount {
                    return Err(CommitError::InsufficientFunds { user: debited });
                }
            }
            if let Some(credited) = posting.kind.credited() {
                if !state.balances.contains_key(&credited) {
                    return Err(CommitError::AccountNotFound { user: credited });
                }
            }
            if self.fail_appends.load(Ordering::SeqCst) {
                return Err(CommitError::Store(PortError::internal(
                    "Injected append failure",
                )));
            }

            if let Some(debited) = posting.kind.debited() {
                *state.balances.get_mut(&debited).unwrap() -= amount;
            }
            if let Some(credited) = posting.kind.credited() {
                *state.balances.get_mut(&credited).unwrap() += amount;
            }

            let entry = LedgerEntry {
                id: EntryId::new_v7(),
                kind: posting.kind,
                amount: posting.amount,
                status: posting.status,
                description: posting.description,
                reference: posting.reference,
                created_at: Utc::now(),
            };
            state.entries.push(entry.clone());
            Ok(entry)
        }

        async fn find_by_reference(
            &self,
            reference: &str,
        ) -> Result<Option<LedgerEntry>, PortError> {
            let state = self.state.lock().await;
            Ok(state
                .entries
                .iter()
                .find(|e| e.reference.as_deref() == Some(reference))
                .cloned())
        }

        async fn settle_payout(
            &self,
            reference: &str,
            settlement: PayoutSettlement,
        ) -> Result<LedgerEntry, CommitError> {
            let mut state = self.state.lock().await;

            let index = state
                .entries
                .iter()
                .position(|e| e.reference.as_deref() == Some(reference))
                .ok_or_else(|| {
                    CommitError::Store(PortError::not_found("LedgerEntry", reference))
                })?;

            // Already settled: no-op
            if state.entries[index].status != EntryStatus::Processing {
                return Ok(state.entries[index].clone());
            }

            let (debited, amount) = {
                let entry = &state.entries[index];
                (entry.kind.debited(), entry.amount.amount())
            };

            match settlement {
                PayoutSettlement::Processed => {
                    state.entries[index].status = EntryStatus::Completed;
                }
                PayoutSettlement::Failed => {
                    if let Some(user) = debited {
                        *state.balances.entry(user).or_default() += amount;
                    }
                    state.entries[index].status = EntryStatus::Failed;
                }
            }
            Ok(state.entries[index].clone())
        }

        async fn entries(
            &self,
            user: UserId,
            filter: EntryFilter,
        ) -> Result<Vec<LedgerEntry>, PortError> {
            let state = self.state.lock().await;
            let mut matched: Vec<LedgerEntry> = state
                .entries
                .iter()
                .filter(|e| filter.matches(e, user))
                .cloned()
                .collect();
            matched.reverse();
            if let Some(limit) = filter.limit {
                matched.truncate(limit as usize);
            }
            Ok(matched)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MemoryWalletStore;
    use super::*;
    use crate::entry::{EntryStatus, PaymentMethod};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_open_account_is_unique() {
        let store = MemoryWalletStore::new();
        let user = UserId::new();

        store.open_account(user, Money::inr(dec!(100))).await.unwrap();
        let second = store.open_account(user, Money::inr(dec!(100))).await;
        assert!(second.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_commit_transfer_moves_money_and_appends() {
        let a = UserId::new();
        let b = UserId::new();
        let store =
            MemoryWalletStore::with_accounts(&[(a, Money::inr(dec!(1000))), (b, Money::inr(dec!(500)))])
                .await;

        let entry = store
            .commit(LedgerPosting::transfer(a, b, Money::inr(dec!(300)), "Transfer"))
            .await
            .unwrap();

        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(store.balance(a).await.unwrap().amount(), dec!(700));
        assert_eq!(store.balance(b).await.unwrap().amount(), dec!(800));
        assert_eq!(store.all_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_insufficient_funds_leaves_no_trace() {
        let a = UserId::new();
        let b = UserId::new();
        let store =
            MemoryWalletStore::with_accounts(&[(a, Money::inr(dec!(100))), (b, Money::inr(dec!(0)))])
                .await;

        let result = store
            .commit(LedgerPosting::transfer(a, b, Money::inr(dec!(101)), "Transfer"))
            .await;

        assert!(matches!(result, Err(CommitError::InsufficientFunds { .. })));
        assert_eq!(store.balance(a).await.unwrap().amount(), dec!(100));
        assert!(store.all_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_injected_append_failure_rolls_back_balances() {
        let a = UserId::new();
        let b = UserId::new();
        let store =
            MemoryWalletStore::with_accounts(&[(a, Money::inr(dec!(1000))), (b, Money::inr(dec!(0)))])
                .await;

        store.fail_appends(true);
        let result = store
            .commit(LedgerPosting::transfer(a, b, Money::inr(dec!(300)), "Transfer"))
            .await;

        assert!(matches!(result, Err(CommitError::Store(_))));
        assert_eq!(store.balance(a).await.unwrap().amount(), dec!(1000));
        assert_eq!(store.balance(b).await.unwrap().amount(), dec!(0));
        assert!(store.all_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_reference_is_idempotent() {
        let user = UserId::new();
        let store = MemoryWalletStore::with_accounts(&[(user, Money::inr(dec!(0)))]).await;

        let posting = LedgerPosting::deposit(user, Money::inr(dec!(500)), PaymentMethod::Upi, "Add money")
            .with_reference("pay_001");

        let first = store.commit(posting.clone()).await.unwrap();
        let second = store.commit(posting).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.balance(user).await.unwrap().amount(), dec!(500));
        assert_eq!(store.all_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_payout_settlement_credits_back() {
        let user = UserId::new();
        let store = MemoryWalletStore::with_accounts(&[(user, Money::inr(dec!(1000)))]).await;

        store
            .commit(
                LedgerPosting::withdrawal(
                    user,
                    Money::inr(dec!(400)),
                    PaymentMethod::BankTransfer,
                    EntryStatus::Processing,
                    "Withdraw to bank",
                )
                .with_reference("pout_001"),
            )
            .await
            .unwrap();
        assert_eq!(store.balance(user).await.unwrap().amount(), dec!(600));

        let settled = store
            .settle_payout("pout_001", PayoutSettlement::Failed)
            .await
            .unwrap();

        assert_eq!(settled.status, EntryStatus::Failed);
        assert_eq!(store.balance(user).await.unwrap().amount(), dec!(1000));

        // Duplicate webhook delivery is a no-op
        let again = store
            .settle_payout("pout_001", PayoutSettlement::Failed)
            .await
            .unwrap();
        assert_eq!(again.status, EntryStatus::Failed);
        assert_eq!(store.balance(user).await.unwrap().amount(), dec!(1000));
    }
}
