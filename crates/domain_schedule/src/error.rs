//! Schedule domain errors

use thiserror::Error;

use core_kernel::PortError;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    #[error("Cannot schedule a payment to yourself")]
    SelfPayment,

    #[error("End date must not precede the first run")]
    EndBeforeStart,

    #[error("Payment not found")]
    NotFound,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Store(#[from] PortError),
}
