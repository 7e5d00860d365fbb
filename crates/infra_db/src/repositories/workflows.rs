//! PostgreSQL adapter for the workflow store port
//!
//! Split-bill participants are embedded as JSONB; the (owner, target)
//! beneficiary pair is enforced by a unique constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{BeneficiaryId, BillId, DomainPort, Money, PortError, RequestId, UserId};
use domain_workflows::{
    Beneficiary, BillStatus, Participant, PaymentRequest, RequestStatus, SplitBill, WorkflowStore,
};

use crate::error::{is_unique_violation, to_port_error};

/// Workflow store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresWorkflowStore {
    pool: PgPool,
}

impl PostgresWorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresWorkflowStore {}

#[async_trait]
impl WorkflowStore for PostgresWorkflowStore {
    async fn create_request(&self, request: &PaymentRequest) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO payment_requests \
                 (id, requester, payer, amount, message, status, created_at, resolved_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*request.id.as_uuid())
        .bind(*request.requester.as_uuid())
        .bind(*request.payer.as_uuid())
        .bind(request.amount.amount())
        .bind(&request.message)
        .bind(request_status_str(request.status))
        .bind(request.created_at)
        .bind(request.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(())
    }

    async fn get_request(&self, id: RequestId) -> Result<PaymentRequest, PortError> {
        sqlx::query_as::<_, RequestRow>(
            "SELECT id, requester, payer, amount, message, status, created_at, resolved_at \
             FROM payment_requests WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?
        .ok_or_else(|| PortError::not_found("PaymentRequest", id))?
        .try_into()
    }

    async fn update_request(&self, request: &PaymentRequest) -> Result<(), PortError> {
        let updated = sqlx::query(
            "UPDATE payment_requests SET status = $2, resolved_at = $3 WHERE id = $1",
        )
        .bind(*request.id.as_uuid())
        .bind(request_status_str(request.status))
        .bind(request.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;

        if updated.rows_affected() == 0 {
            return Err(PortError::not_found("PaymentRequest", request.id));
        }
        Ok(())
    }

    async fn requests_sent(&self, user: UserId) -> Result<Vec<PaymentRequest>, PortError> {
        let rows = sqlx::query_as::<_, RequestRow>(
            "SELECT id, requester, payer, amount, message, status, created_at, resolved_at \
             FROM payment_requests WHERE requester = $1 ORDER BY created_at DESC",
        )
        .bind(*user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn requests_received(&self, user: UserId) -> Result<Vec<PaymentRequest>, PortError> {
        let rows = sqlx::query_as::<_, RequestRow>(
            "SELECT id, requester, payer, amount, message, status, created_at, resolved_at \
             FROM payment_requests WHERE payer = $1 ORDER BY created_at DESC",
        )
        .bind(*user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn pending_request_count(&self, user: UserId) -> Result<u64, PortError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM payment_requests WHERE payer = $1 AND status = 'pending'",
        )
        .bind(*user.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(count.0.max(0) as u64)
    }

    async fn create_bill(&self, bill: &SplitBill) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO split_bills (id, created_by, title, total, participants, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*bill.id.as_uuid())
        .bind(*bill.created_by.as_uuid())
        .bind(&bill.title)
        .bind(bill.total.amount())
        .bind(participants_json(&bill.participants)?)
        .bind(bill_status_str(bill.status))
        .bind(bill.created_at)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(())
    }

    async fn get_bill(&self, id: BillId) -> Result<SplitBill, PortError> {
        sqlx::query_as::<_, BillRow>(
            "SELECT id, created_by, title, total, participants, status, created_at \
             FROM split_bills WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?
        .ok_or_else(|| PortError::not_found("SplitBill", id))?
        .try_into()
    }

    async fn update_bill(&self, bill: &SplitBill) -> Result<(), PortError> {
        let updated =
            sqlx::query("UPDATE split_bills SET participants = $2, status = $3 WHERE id = $1")
                .bind(*bill.id.as_uuid())
                .bind(participants_json(&bill.participants)?)
                .bind(bill_status_str(bill.status))
                .execute(&self.pool)
                .await
                .map_err(to_port_error)?;

        if updated.rows_affected() == 0 {
            return Err(PortError::not_found("SplitBill", bill.id));
        }
        Ok(())
    }

    async fn bills_created_by(&self, user: UserId) -> Result<Vec<SplitBill>, PortError> {
        let rows = sqlx::query_as::<_, BillRow>(
            "SELECT id, created_by, title, total, participants, status, created_at \
             FROM split_bills WHERE created_by = $1 ORDER BY created_at DESC",
        )
        .bind(*user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn bills_participating(&self, user: UserId) -> Result<Vec<SplitBill>, PortError> {
        // JSONB containment against the participants array
        let rows = sqlx::query_as::<_, BillRow>(
            "SELECT id, created_by, title, total, participants, status, created_at \
             FROM split_bills \
             WHERE created_by <> $1 \
               AND participants @> jsonb_build_array(jsonb_build_object('user', $1::uuid)) \
             ORDER BY created_at DESC",
        )
        .bind(*user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn add_beneficiary(&self, beneficiary: &Beneficiary) -> Result<(), PortError> {
        let inserted = sqlx::query(
            "INSERT INTO beneficiaries (id, owner_id, target_id, nickname, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*beneficiary.id.as_uuid())
        .bind(*beneficiary.owner.as_uuid())
        .bind(*beneficiary.target.as_uuid())
        .bind(&beneficiary.nickname)
        .bind(beneficiary.created_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(PortError::conflict("Beneficiary pair already saved"))
            }
            Err(e) => Err(to_port_error(e)),
        }
    }

    async fn list_beneficiaries(&self, owner: UserId) -> Result<Vec<Beneficiary>, PortError> {
        let rows = sqlx::query_as::<_, BeneficiaryRow>(
            "SELECT id, owner_id, target_id, nickname, created_at \
             FROM beneficiaries WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(*owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn rename_beneficiary(
        &self,
        id: BeneficiaryId,
        owner: UserId,
        nickname: &str,
    ) -> Result<Beneficiary, PortError> {
        let row = sqlx::query_as::<_, BeneficiaryRow>(
            "UPDATE beneficiaries SET nickname = $3 \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING id, owner_id, target_id, nickname, created_at",
        )
        .bind(*id.as_uuid())
        .bind(*owner.as_uuid())
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?
        .ok_or_else(|| PortError::not_found("Beneficiary", id))?;
        Ok(row.into())
    }

    async fn remove_beneficiary(&self, id: BeneficiaryId, owner: UserId) -> Result<(), PortError> {
        let deleted = sqlx::query("DELETE FROM beneficiaries WHERE id = $1 AND owner_id = $2")
            .bind(*id.as_uuid())
            .bind(*owner.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(to_port_error)?;

        if deleted.rows_affected() == 0 {
            return Err(PortError::not_found("Beneficiary", id));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    requester: Uuid,
    payer: Uuid,
    amount: Decimal,
    message: String,
    status: String,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for PaymentRequest {
    type Error = PortError;

    fn try_from(row: RequestRow) -> Result<Self, PortError> {
        Ok(PaymentRequest {
            id: row.id.into(),
            requester: row.requester.into(),
            payer: row.payer.into(),
            amount: Money::new(row.amount, Default::default()),
            message: row.message,
            status: parse_request_status(&row.status)?,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: Uuid,
    created_by: Uuid,
    title: String,
    total: Decimal,
    participants: serde_json::Value,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BillRow> for SplitBill {
    type Error = PortError;

    fn try_from(row: BillRow) -> Result<Self, PortError> {
        let participants: Vec<Participant> = serde_json::from_value(row.participants)
            .map_err(|e| PortError::internal(format!("Malformed participants JSON: {e}")))?;

        Ok(SplitBill {
            id: row.id.into(),
            created_by: row.created_by.into(),
            title: row.title,
            total: Money::new(row.total, Default::default()),
            participants,
            status: parse_bill_status(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BeneficiaryRow {
    id: Uuid,
    owner_id: Uuid,
    target_id: Uuid,
    nickname: String,
    created_at: DateTime<Utc>,
}

impl From<BeneficiaryRow> for Beneficiary {
    fn from(row: BeneficiaryRow) -> Self {
        Beneficiary {
            id: row.id.into(),
            owner: row.owner_id.into(),
            target: row.target_id.into(),
            nickname: row.nickname,
            created_at: row.created_at,
        }
    }
}

fn participants_json(participants: &[Participant]) -> Result<serde_json::Value, PortError> {
    serde_json::to_value(participants)
        .map_err(|e| PortError::internal(format!("Participants serialization failed: {e}")))
}

fn request_status_str(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "pending",
        RequestStatus::Paid => "paid",
        RequestStatus::Declined => "declined",
        RequestStatus::Cancelled => "cancelled",
    }
}

fn parse_request_status(value: &str) -> Result<RequestStatus, PortError> {
    match value {
        "pending" => Ok(RequestStatus::Pending),
        "paid" => Ok(RequestStatus::Paid),
        "declined" => Ok(RequestStatus::Declined),
        "cancelled" => Ok(RequestStatus::Cancelled),
        other => Err(PortError::internal(format!("Unknown request status {other}"))),
    }
}

fn bill_status_str(status: BillStatus) -> &'static str {
    match status {
        BillStatus::Active => "active",
        BillStatus::Settled => "settled",
        BillStatus::Cancelled => "cancelled",
    }
}

fn parse_bill_status(value: &str) -> Result<BillStatus, PortError> {
    match value {
        "active" => Ok(BillStatus::Active),
        "settled" => Ok(BillStatus::Settled),
        "cancelled" => Ok(BillStatus::Cancelled),
        other => Err(PortError::internal(format!("Unknown bill status {other}"))),
    }
}
