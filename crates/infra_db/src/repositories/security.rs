//! PostgreSQL adapter for the security store port
//!
//! The daily tracker update is one `INSERT ... ON CONFLICT` statement that
//! either resets (calendar-day change in the business timezone) or
//! increments, with no read-modify-write window.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{BusinessTimezone, DomainPort, Money, PortError, UserId};
use domain_security::{
    AuditEvent, AuditOutcome, DailyTracker, PinHash, PinRecord, SecurityStore, TransactionLimits,
};

use crate::error::to_port_error;

/// Security store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresSecurityStore {
    pool: PgPool,
    timezone: BusinessTimezone,
}

impl PostgresSecurityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timezone: BusinessTimezone::default(),
        }
    }

    pub fn with_timezone(mut self, timezone: BusinessTimezone) -> Self {
        self.timezone = timezone;
        self
    }
}

impl DomainPort for PostgresSecurityStore {}

#[async_trait]
impl SecurityStore for PostgresSecurityStore {
    async fn pin_record(&self, user: UserId) -> Result<Option<PinRecord>, PortError> {
        let row: Option<(String, i32, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT pin_hash, failed_attempts, locked_until FROM transaction_pins WHERE user_id = $1",
        )
        .bind(*user.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?;

        Ok(row.map(|(hash, failed_attempts, locked_until)| PinRecord {
            hash: PinHash::from_encoded(hash),
            failed_attempts: failed_attempts.max(0) as u32,
            locked_until,
        }))
    }

    async fn save_pin_record(&self, user: UserId, record: &PinRecord) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO transaction_pins (user_id, pin_hash, failed_attempts, locked_until, updated_at) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 pin_hash = EXCLUDED.pin_hash, \
                 failed_attempts = EXCLUDED.failed_attempts, \
                 locked_until = EXCLUDED.locked_until, \
                 updated_at = now()",
        )
        .bind(*user.as_uuid())
        .bind(record.hash.as_str())
        .bind(record.failed_attempts as i32)
        .bind(record.locked_until)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(())
    }

    async fn limits(&self, user: UserId) -> Result<TransactionLimits, PortError> {
        let row: Option<(Decimal, Decimal, Decimal)> = sqlx::query_as(
            "SELECT per_transaction, daily, monthly FROM transaction_limits WHERE user_id = $1",
        )
        .bind(*user.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?;

        Ok(row
            .map(|(per_transaction, daily, monthly)| TransactionLimits {
                per_transaction: Money::new(per_transaction, Default::default()),
                daily: Money::new(daily, Default::default()),
                monthly: Money::new(monthly, Default::default()),
            })
            .unwrap_or_default())
    }

    async fn daily_tracker(&self, user: UserId) -> Result<Option<DailyTracker>, PortError> {
        let row: Option<(Decimal, DateTime<Utc>)> =
            sqlx::query_as("SELECT amount, last_reset FROM daily_transfers WHERE user_id = $1")
                .bind(*user.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(to_port_error)?;

        Ok(row.map(|(amount, last_reset)| DailyTracker {
            spent: Money::new(amount, Default::default()),
            last_reset,
        }))
    }

    async fn record_daily_transfer(
        &self,
        user: UserId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), PortError> {
        // Reset-if-new-day-then-increment in one statement; the calendar
        // comparison happens in the business timezone.
        sqlx::query(
            "INSERT INTO daily_transfers (user_id, amount, last_reset) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 amount = CASE \
                     WHEN (daily_transfers.last_reset AT TIME ZONE $4)::date = ($3 AT TIME ZONE $4)::date \
                     THEN daily_transfers.amount + EXCLUDED.amount \
                     ELSE EXCLUDED.amount \
                 END, \
                 last_reset = CASE \
                     WHEN (daily_transfers.last_reset AT TIME ZONE $4)::date = ($3 AT TIME ZONE $4)::date \
                     THEN daily_transfers.last_reset \
                     ELSE EXCLUDED.last_reset \
                 END",
        )
        .bind(*user.as_uuid())
        .bind(amount.amount())
        .bind(now)
        .bind(self.timezone.0.name())
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(())
    }

    async fn record_audit(&self, event: AuditEvent) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO audit_events (id, user_id, action, outcome, detail, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*event.id.as_uuid())
        .bind(*event.user_id.as_uuid())
        .bind(event.action.as_str())
        .bind(match event.outcome {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
        })
        .bind(&event.detail)
        .bind(event.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(())
    }
}

/// Recent audit rows for the security dashboard
impl PostgresSecurityStore {
    /// Last `limit` audit events for a user, newest first
    pub async fn recent_audit_events(
        &self,
        user: UserId,
        limit: i64,
    ) -> Result<Vec<AuditRow>, PortError> {
        sqlx::query_as::<_, AuditRow>(
            "SELECT id, user_id, action, outcome, detail, recorded_at \
             FROM audit_events WHERE user_id = $1 \
             ORDER BY recorded_at DESC LIMIT $2",
        )
        .bind(*user.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)
    }
}

/// Database row for an audit event
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct AuditRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub outcome: String,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}
