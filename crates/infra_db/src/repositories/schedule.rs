//! PostgreSQL adapter for the schedule store port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{DomainPort, Money, PortError, ScheduleId, UserId};
use domain_schedule::{Frequency, ScheduleStatus, ScheduleStore, ScheduledPayment};

use crate::error::to_port_error;

/// Schedule store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresScheduleStore {
    pool: PgPool,
}

impl PostgresScheduleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresScheduleStore {}

#[async_trait]
impl ScheduleStore for PostgresScheduleStore {
    async fn create(&self, payment: &ScheduledPayment) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO scheduled_payments \
                 (id, owner_id, beneficiary, amount, description, frequency, next_run, \
                  end_date, status, last_run, run_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(*payment.id.as_uuid())
        .bind(*payment.owner.as_uuid())
        .bind(*payment.beneficiary.as_uuid())
        .bind(payment.amount.amount())
        .bind(&payment.description)
        .bind(payment.frequency.as_str())
        .bind(payment.next_run)
        .bind(payment.end_date)
        .bind(status_str(payment.status))
        .bind(payment.last_run)
        .bind(payment.run_count as i32)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(())
    }

    async fn get(&self, id: ScheduleId) -> Result<ScheduledPayment, PortError> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            "SELECT id, owner_id, beneficiary, amount, description, frequency, next_run, \
                    end_date, status, last_run, run_count, created_at \
             FROM scheduled_payments WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?
        .ok_or_else(|| PortError::not_found("ScheduledPayment", id))?;

        row.try_into()
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<ScheduledPayment>, PortError> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            "SELECT id, owner_id, beneficiary, amount, description, frequency, next_run, \
                    end_date, status, last_run, run_count, created_at \
             FROM scheduled_payments WHERE owner_id = $1 \
             ORDER BY next_run ASC",
        )
        .bind(*owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, payment: &ScheduledPayment) -> Result<(), PortError> {
        let updated = sqlx::query(
            "UPDATE scheduled_payments SET \
                 next_run = $2, end_date = $3, status = $4, last_run = $5, run_count = $6 \
             WHERE id = $1",
        )
        .bind(*payment.id.as_uuid())
        .bind(payment.next_run)
        .bind(payment.end_date)
        .bind(status_str(payment.status))
        .bind(payment.last_run)
        .bind(payment.run_count as i32)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;

        if updated.rows_affected() == 0 {
            return Err(PortError::not_found("ScheduledPayment", payment.id));
        }
        Ok(())
    }

    async fn delete(&self, id: ScheduleId, owner: UserId) -> Result<(), PortError> {
        let deleted = sqlx::query("DELETE FROM scheduled_payments WHERE id = $1 AND owner_id = $2")
            .bind(*id.as_uuid())
            .bind(*owner.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(to_port_error)?;

        if deleted.rows_affected() == 0 {
            return Err(PortError::not_found("ScheduledPayment", id));
        }
        Ok(())
    }

    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledPayment>, PortError> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            "SELECT id, owner_id, beneficiary, amount, description, frequency, next_run, \
                    end_date, status, last_run, run_count, created_at \
             FROM scheduled_payments \
             WHERE status = 'active' AND next_run <= $1 \
             ORDER BY next_run ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    owner_id: Uuid,
    beneficiary: Uuid,
    amount: Decimal,
    description: String,
    frequency: String,
    next_run: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    status: String,
    last_run: Option<DateTime<Utc>>,
    run_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for ScheduledPayment {
    type Error = PortError;

    fn try_from(row: ScheduleRow) -> Result<Self, PortError> {
        Ok(ScheduledPayment {
            id: row.id.into(),
            owner: row.owner_id.into(),
            beneficiary: row.beneficiary.into(),
            amount: Money::new(row.amount, Default::default()),
            description: row.description,
            frequency: parse_frequency(&row.frequency)?,
            next_run: row.next_run,
            end_date: row.end_date,
            status: parse_status(&row.status)?,
            last_run: row.last_run,
            run_count: row.run_count.max(0) as u32,
            created_at: row.created_at,
        })
    }
}

fn status_str(status: ScheduleStatus) -> &'static str {
    match status {
        ScheduleStatus::Active => "active",
        ScheduleStatus::Paused => "paused",
        ScheduleStatus::Completed => "completed",
        ScheduleStatus::Failed => "failed",
    }
}

fn parse_status(value: &str) -> Result<ScheduleStatus, PortError> {
    match value {
        "active" => Ok(ScheduleStatus::Active),
        "paused" => Ok(ScheduleStatus::Paused),
        "completed" => Ok(ScheduleStatus::Completed),
        "failed" => Ok(ScheduleStatus::Failed),
        other => Err(PortError::internal(format!("Unknown schedule status {other}"))),
    }
}

fn parse_frequency(value: &str) -> Result<Frequency, PortError> {
    match value {
        "once" => Ok(Frequency::Once),
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        other => Err(PortError::internal(format!("Unknown frequency {other}"))),
    }
}
