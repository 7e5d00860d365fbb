//! Audit trail of sensitive operations
//!
//! Best-effort records: writing an audit event must never roll back or
//! block the financial operation that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AuditEventId, UserId};

/// The operation being audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Transfer,
    Deposit,
    Withdrawal,
    LimitExceeded,
    AuthFailure,
    PinLocked,
    PinChanged,
    ScheduleRun,
    PayoutSettled,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Transfer => "transfer",
            AuditAction::Deposit => "deposit",
            AuditAction::Withdrawal => "withdrawal",
            AuditAction::LimitExceeded => "limit_exceeded",
            AuditAction::AuthFailure => "auth_failure",
            AuditAction::PinLocked => "pin_locked",
            AuditAction::PinChanged => "pin_changed",
            AuditAction::ScheduleRun => "schedule_run",
            AuditAction::PayoutSettled => "payout_settled",
        }
    }
}

/// Whether the audited operation succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// One audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub user_id: UserId,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates a success event
    pub fn success(user_id: UserId, action: AuditAction, detail: impl Into<String>) -> Self {
        Self::new(user_id, action, AuditOutcome::Success, detail)
    }

    /// Creates a failure event
    pub fn failure(user_id: UserId, action: AuditAction, detail: impl Into<String>) -> Self {
        Self::new(user_id, action, AuditOutcome::Failure, detail)
    }

    fn new(
        user_id: UserId,
        action: AuditAction,
        outcome: AuditOutcome,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditEventId::new_v7(),
            user_id,
            action,
            outcome,
            detail: detail.into(),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_construction() {
        let user = UserId::new();
        let event = AuditEvent::failure(user, AuditAction::LimitExceeded, "daily cap");

        assert_eq!(event.user_id, user);
        assert_eq!(event.outcome, AuditOutcome::Failure);
        assert_eq!(event.action.as_str(), "limit_exceeded");
    }
}
