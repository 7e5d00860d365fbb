//! Security domain errors

use thiserror::Error;

use core_kernel::PortError;

use crate::pin::PinVerdict;

/// Errors from PIN management and limit configuration
#[derive(Debug, Error)]
pub enum SecurityError {
    /// PIN must be exactly 4 digits
    #[error("PIN must be exactly 4 digits")]
    InvalidPinFormat,

    /// PIN already set; use change instead
    #[error("PIN already set. Use change PIN.")]
    PinAlreadySet,

    /// No PIN on record
    #[error("PIN not set. Use set PIN first.")]
    PinNotSet,

    /// Current PIN did not match
    #[error("Incorrect current PIN. {attempts_remaining} attempts left")]
    IncorrectPin { attempts_remaining: u32 },

    /// Record is locked out
    #[error("Account locked. Try after {minutes_remaining} minutes")]
    Locked { minutes_remaining: i64 },

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] PortError),
}

impl SecurityError {
    /// Maps a non-approved verification verdict to the matching error
    pub fn from_verdict(verdict: PinVerdict) -> Self {
        match verdict {
            PinVerdict::Approved => {
                unreachable!("Approved verdicts do not convert to errors")
            }
            PinVerdict::Rejected { attempts_remaining } => {
                SecurityError::IncorrectPin { attempts_remaining }
            }
            PinVerdict::Locked { minutes_remaining }
            | PinVerdict::LockedNow { minutes_remaining } => {
                SecurityError::Locked { minutes_remaining }
            }
        }
    }
}
