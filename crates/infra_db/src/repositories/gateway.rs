//! PostgreSQL adapter for the gateway store port
//!
//! Payout targets are persisted per user; a restart or scale-out never
//! loses a linked account.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{DomainPort, PortError, UserId};
use domain_gateway::{GatewayStore, LinkedPayoutAccount};

use crate::error::to_port_error;

/// Gateway store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresGatewayStore {
    pool: PgPool,
}

impl PostgresGatewayStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresGatewayStore {}

#[async_trait]
impl GatewayStore for PostgresGatewayStore {
    async fn save_payout_account(&self, account: &LinkedPayoutAccount) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO payout_accounts \
                 (user_id, fund_account_ref, holder_name, ifsc, account_last4, linked_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 fund_account_ref = EXCLUDED.fund_account_ref, \
                 holder_name = EXCLUDED.holder_name, \
                 ifsc = EXCLUDED.ifsc, \
                 account_last4 = EXCLUDED.account_last4, \
                 linked_at = EXCLUDED.linked_at, \
                 expires_at = EXCLUDED.expires_at",
        )
        .bind(*account.user.as_uuid())
        .bind(&account.fund_account_ref)
        .bind(&account.holder_name)
        .bind(&account.ifsc)
        .bind(&account.account_last4)
        .bind(account.linked_at)
        .bind(account.expires_at)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(())
    }

    async fn payout_account(
        &self,
        user: UserId,
    ) -> Result<Option<LinkedPayoutAccount>, PortError> {
        let row = sqlx::query_as::<_, PayoutAccountRow>(
            "SELECT user_id, fund_account_ref, holder_name, ifsc, account_last4, linked_at, expires_at \
             FROM payout_accounts WHERE user_id = $1",
        )
        .bind(*user.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?;

        Ok(row.map(Into::into))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PayoutAccountRow {
    user_id: Uuid,
    fund_account_ref: String,
    holder_name: String,
    ifsc: String,
    account_last4: String,
    linked_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<PayoutAccountRow> for LinkedPayoutAccount {
    fn from(row: PayoutAccountRow) -> Self {
        LinkedPayoutAccount {
            user: row.user_id.into(),
            fund_account_ref: row.fund_account_ref,
            holder_name: row.holder_name,
            ifsc: row.ifsc,
            account_last4: row.account_last4,
            linked_at: row.linked_at,
            expires_at: row.expires_at,
        }
    }
}
