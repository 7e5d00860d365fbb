//! API error handling
//!
//! Domain rejections map onto status codes with their actionable messages
//! intact; only store failures collapse to a generic retry message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::PortError;
use domain_gateway::GatewayError;
use domain_ledger::WalletError;
use domain_schedule::ScheduleError;
use domain_security::SecurityError;
use domain_workflows::WorkflowError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Locked: {0}")]
    Locked(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
            ApiError::Locked(msg) => (StatusCode::LOCKED, "locked", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        match &err {
            WalletError::InvalidAmount
            | WalletError::SelfTransfer
            | WalletError::InsufficientFunds
            | WalletError::AccountNotFound
            | WalletError::NoPayoutTarget
            | WalletError::LimitExceeded(_)
            | WalletError::PinSetupRequired
            | WalletError::PinRequired
            | WalletError::PinIncorrect { .. } => ApiError::BadRequest(err.to_string()),
            WalletError::PinLocked { .. } | WalletError::PinLockedNow { .. } => {
                ApiError::Locked(err.to_string())
            }
            WalletError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<SecurityError> for ApiError {
    fn from(err: SecurityError) -> Self {
        match &err {
            SecurityError::Locked { .. } => ApiError::Locked(err.to_string()),
            SecurityError::Store(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match &err {
            ScheduleError::NotFound => ApiError::NotFound(err.to_string()),
            ScheduleError::Store(e) if e.is_not_found() => ApiError::NotFound(err.to_string()),
            ScheduleError::Store(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match &err {
            WorkflowError::NotFound | WorkflowError::NoPendingShare => {
                ApiError::NotFound(err.to_string())
            }
            WorkflowError::DuplicateBeneficiary => ApiError::Conflict(err.to_string()),
            WorkflowError::Transfer(inner) => {
                // Keep the transfer rejection's own status semantics
                ApiError::from(clone_wallet_error(inner))
            }
            WorkflowError::Store(e) if e.is_not_found() => ApiError::NotFound(err.to_string()),
            WorkflowError::Store(e) if e.is_conflict() => ApiError::Conflict(err.to_string()),
            WorkflowError::Store(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match &err {
            GatewayError::InvalidSignature => ApiError::BadRequest(err.to_string()),
            GatewayError::Wallet(inner) => ApiError::from(clone_wallet_error(inner)),
            GatewayError::Store(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_conflict() {
            ApiError::Conflict(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

// WalletError is not Clone (it carries sources); rebuild the variants the
// mappers above need to inspect by reference.
fn clone_wallet_error(err: &WalletError) -> WalletError {
    match err {
        WalletError::InvalidAmount => WalletError::InvalidAmount,
        WalletError::SelfTransfer => WalletError::SelfTransfer,
        WalletError::PinSetupRequired => WalletError::PinSetupRequired,
        WalletError::PinRequired => WalletError::PinRequired,
        WalletError::PinIncorrect { attempts_remaining } => WalletError::PinIncorrect {
            attempts_remaining: *attempts_remaining,
        },
        WalletError::PinLockedNow { minutes_remaining } => WalletError::PinLockedNow {
            minutes_remaining: *minutes_remaining,
        },
        WalletError::PinLocked { minutes_remaining } => WalletError::PinLocked {
            minutes_remaining: *minutes_remaining,
        },
        WalletError::LimitExceeded(reason) => WalletError::LimitExceeded(reason.clone()),
        WalletError::InsufficientFunds => WalletError::InsufficientFunds,
        WalletError::AccountNotFound => WalletError::AccountNotFound,
        WalletError::NoPayoutTarget => WalletError::NoPayoutTarget,
        WalletError::Store(_) => {
            WalletError::Store(core_kernel::PortError::internal(err.to_string()))
        }
    }
}
