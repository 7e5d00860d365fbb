//! Gateway domain errors

use thiserror::Error;

use core_kernel::PortError;
use domain_ledger::WalletError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    /// Signature verification failed; nothing was mutated
    #[error("Invalid payment signature")]
    InvalidSignature,

    #[error("No bank account linked. Please add bank account first.")]
    NoPayoutTarget,

    /// The linked payout target has expired and must be re-linked
    #[error("Linked bank account has expired. Please link it again.")]
    PayoutTargetExpired,

    #[error("Malformed webhook payload")]
    MalformedEvent,

    /// The underlying wallet operation was rejected
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The provider or a store failed
    #[error(transparent)]
    Store(#[from] PortError),
}
