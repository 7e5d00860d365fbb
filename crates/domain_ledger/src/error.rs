//! Wallet operation errors
//!
//! Every rejection carries a specific, actionable reason; callers never see
//! a bare failure code. Store failures inside the atomic unit surface as
//! `Store` only after the unit has rolled back.

use thiserror::Error;

use core_kernel::PortError;
use domain_security::SecurityError;

use crate::ports::CommitError;

/// Errors surfaced by wallet operations
#[derive(Debug, Error)]
pub enum WalletError {
    /// Rejected before any store access
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    /// Source and target are the same user
    #[error("Cannot pay yourself")]
    SelfTransfer,

    /// No transaction PIN on record
    #[error("Please set your transaction PIN first")]
    PinSetupRequired,

    /// The operation needs a PIN but none was supplied
    #[error("Transaction PIN required")]
    PinRequired,

    /// PIN mismatch with attempts still remaining
    #[error("Incorrect PIN. {attempts_remaining} attempts left")]
    PinIncorrect { attempts_remaining: u32 },

    /// This attempt exhausted the failure budget
    #[error("Too many attempts. Locked for {minutes_remaining} minutes")]
    PinLockedNow { minutes_remaining: i64 },

    /// The record was already locked
    #[error("Account locked. Try after {minutes_remaining} minutes")]
    PinLocked { minutes_remaining: i64 },

    /// Velocity cap breached; the message cites the cap or headroom
    #[error("{0}")]
    LimitExceeded(String),

    /// The conditional debit found the balance short
    #[error("Insufficient balance")]
    InsufficientFunds,

    /// A party has no wallet account
    #[error("Invalid account")]
    AccountNotFound,

    /// No linked payout target for a provider withdrawal
    #[error("No bank account linked. Please add bank account first.")]
    NoPayoutTarget,

    /// The store failed; the atomic unit was rolled back
    #[error("Operation failed, try again")]
    Store(#[source] PortError),
}

impl From<CommitError> for WalletError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::InsufficientFunds { .. } => WalletError::InsufficientFunds,
            CommitError::AccountNotFound { .. } => WalletError::AccountNotFound,
            CommitError::Store(e) => WalletError::Store(e),
        }
    }
}

impl From<PortError> for WalletError {
    fn from(err: PortError) -> Self {
        WalletError::Store(err)
    }
}

impl From<SecurityError> for WalletError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::PinNotSet => WalletError::PinSetupRequired,
            SecurityError::IncorrectPin { attempts_remaining } => {
                WalletError::PinIncorrect { attempts_remaining }
            }
            SecurityError::Locked { minutes_remaining } => {
                WalletError::PinLocked { minutes_remaining }
            }
            SecurityError::Store(e) => WalletError::Store(e),
            // Format/duplicate-set errors belong to PIN management, not to
            // money movement; map them to the setup signal.
            SecurityError::InvalidPinFormat | SecurityError::PinAlreadySet => {
                WalletError::PinSetupRequired
            }
        }
    }
}
