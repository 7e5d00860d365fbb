//! Workflow domain errors

use thiserror::Error;

use core_kernel::PortError;
use domain_ledger::WalletError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    #[error("Cannot request money from yourself")]
    SelfRequest,

    #[error("Cannot add yourself as beneficiary")]
    SelfBeneficiary,

    #[error("Already saved as beneficiary")]
    DuplicateBeneficiary,

    #[error("Participant shares must sum to the bill total")]
    SharesMismatch,

    #[error("A bill needs at least one participant")]
    NoParticipants,

    #[error("Not found or already processed")]
    NotFound,

    #[error("No pending payment found")]
    NoPendingShare,

    /// The underlying transfer was rejected; the workflow state is untouched
    #[error(transparent)]
    Transfer(#[from] WalletError),

    #[error(transparent)]
    Store(#[from] PortError),
}
