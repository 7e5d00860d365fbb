//! Ledger Domain - Wallet accounts and the transaction-integrity engine
//!
//! This crate owns the two pieces of state money actually lives in: the
//! per-user wallet account balance and the append-only transaction ledger.
//! Every balance mutation flows through the [`TransferService`], which
//! composes the PIN guard, the limit policy, and the [`WalletStore`] port
//! into a single operation with a hard invariant:
//!
//! # Invariants
//!
//! - A balance mutation and the ledger entry describing it commit or roll
//!   back together (one atomic unit at the store).
//! - Balances never go negative: debits are conditional updates, not
//!   read-then-write.
//! - Ledger entries are immutable after commit; the only exception is the
//!   payout settlement flip (`processing -> completed | failed`), and a
//!   failed payout credits the money back in the same unit as the flip.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{TransferService, TransferCommand, Initiator};
//!
//! let receipt = service
//!     .transfer(TransferCommand {
//!         source: alice,
//!         target: bob,
//!         amount: Money::inr(dec!(300)),
//!         description: None,
//!         initiator: Initiator::User { pin: Some("4242".into()) },
//!     })
//!     .await?;
//! ```

pub mod account;
pub mod entry;
pub mod ports;
pub mod transfer;
pub mod statement;
pub mod error;

pub use account::WalletAccount;
pub use entry::{
    EntryDirection, EntryFilter, EntryKind, EntryStatus, LedgerEntry, LedgerPosting,
    PaymentMethod, PayoutSettlement,
};
pub use ports::{CommitError, NotificationSink, NullNotificationSink, WalletStore};
pub use transfer::{Initiator, Receipt, TransferCommand, TransferService};
pub use statement::{AnalyticsPeriod, AnalyticsSummary, StatementSummary};
pub use error::WalletError;
