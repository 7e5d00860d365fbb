//! PostgreSQL adapter for the wallet store port
//!
//! The atomic unit lives here. A `commit` runs one database transaction
//! containing the conditional debit (`UPDATE ... WHERE balance >= amount`),
//! the credit, and the ledger append; PostgreSQL row locking serializes
//! concurrent debits of the same account, and the whole unit rolls back on
//! any failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use core_kernel::{DomainPort, EntryId, Money, PortError, UserId};
use domain_ledger::{
    CommitError, EntryDirection, EntryFilter, EntryKind, EntryStatus, LedgerEntry, LedgerPosting,
    PaymentMethod, PayoutSettlement, WalletAccount, WalletStore,
};

use crate::error::{is_unique_violation, to_port_error};

/// Wallet store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresWalletStore {
    pool: PgPool,
}

impl PostgresWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conditional debit inside the transaction; distinguishes a missing
    /// account from a short balance after a zero-row update
    async fn debit(
        tx: &mut Transaction<'_, Postgres>,
        user: UserId,
        amount: Decimal,
    ) -> Result<(), CommitError> {
        let updated = sqlx::query(
            "UPDATE accounts SET balance = balance - $1, updated_at = now() \
             WHERE user_id = $2 AND balance >= $1",
        )
        .bind(amount)
        .bind(*user.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| CommitError::Store(to_port_error(e)))?;

        if updated.rows_affected() == 1 {
            return Ok(());
        }

        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM accounts WHERE user_id = $1)")
                .bind(*user.as_uuid())
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| CommitError::Store(to_port_error(e)))?;

        if exists.0 {
            Err(CommitError::InsufficientFunds { user })
        } else {
            Err(CommitError::AccountNotFound { user })
        }
    }

    async fn credit(
        tx: &mut Transaction<'_, Postgres>,
        user: UserId,
        amount: Decimal,
    ) -> Result<(), CommitError> {
        let updated = sqlx::query(
            "UPDATE accounts SET balance = balance + $1, updated_at = now() WHERE user_id = $2",
        )
        .bind(amount)
        .bind(*user.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| CommitError::Store(to_port_error(e)))?;

        if updated.rows_affected() == 1 {
            Ok(())
        } else {
            Err(CommitError::AccountNotFound { user })
        }
    }

    async fn entry_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<LedgerEntry>, PortError> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, kind, from_user, to_user, method, amount, status, description, \
                    reference, created_at \
             FROM ledger_entries WHERE reference = $1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?;

        row.map(LedgerEntry::try_from).transpose()
    }
}

impl DomainPort for PostgresWalletStore {}

#[async_trait]
impl WalletStore for PostgresWalletStore {
    async fn open_account(
        &self,
        user: UserId,
        opening_balance: Money,
    ) -> Result<WalletAccount, PortError> {
        let account = WalletAccount::open(user, opening_balance);
        sqlx::query(
            "INSERT INTO accounts (user_id, balance, opened_at, updated_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(*user.as_uuid())
        .bind(opening_balance.amount())
        .bind(account.opened_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(to_port_error)?;
        Ok(account)
    }

    async fn account_exists(&self, user: UserId) -> Result<bool, PortError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM accounts WHERE user_id = $1)")
                .bind(*user.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(to_port_error)?;
        Ok(exists.0)
    }

    async fn balance(&self, user: UserId) -> Result<Money, PortError> {
        let row: Option<(Decimal,)> =
            sqlx::query_as("SELECT balance FROM accounts WHERE user_id = $1")
                .bind(*user.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(to_port_error)?;

        row.map(|(balance,)| Money::new(balance, Default::default()))
            .ok_or_else(|| PortError::not_found("WalletAccount", user))
    }

    async fn commit(&self, posting: LedgerPosting) -> Result<LedgerEntry, CommitError> {
        // Fast idempotency path before opening a transaction
        if let Some(reference) = posting.reference.as_deref() {
            if let Some(existing) = self.entry_by_reference(reference).await? {
                return Ok(existing);
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CommitError::Store(to_port_error(e)))?;

        let amount = posting.amount.amount();
        if let Some(debited) = posting.kind.debited() {
            Self::debit(&mut tx, debited, amount).await?;
        }
        if let Some(credited) = posting.kind.credited() {
            Self::credit(&mut tx, credited, amount).await?;
        }

        let entry = LedgerEntry {
            id: EntryId::new_v7(),
            kind: posting.kind,
            amount: posting.amount,
            status: posting.status,
            description: posting.description,
            reference: posting.reference,
            created_at: Utc::now(),
        };

        let (from_user, to_user, method) = split_kind(&entry.kind);
        let inserted = sqlx::query(
            "INSERT INTO ledger_entries \
                 (id, kind, from_user, to_user, method, amount, status, description, reference, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(*entry.id.as_uuid())
        .bind(entry.kind.label())
        .bind(from_user)
        .bind(to_user)
        .bind(method)
        .bind(amount)
        .bind(status_str(entry.status))
        .bind(&entry.description)
        .bind(&entry.reference)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            // Two concurrent commits raced on the same reference; the
            // other one won. Roll back ours and return the winner.
            Err(e) if is_unique_violation(&e) => {
                drop(tx);
                if let Some(reference) = entry.reference.as_deref() {
                    if let Some(existing) = self.entry_by_reference(reference).await? {
                        return Ok(existing);
                    }
                }
                return Err(CommitError::Store(to_port_error(e)));
            }
            Err(e) => return Err(CommitError::Store(to_port_error(e))),
        }

        tx.commit()
            .await
            .map_err(|e| CommitError::Store(to_port_error(e)))?;
        Ok(entry)
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<LedgerEntry>, PortError> {
        self.entry_by_reference(reference).await
    }

    async fn settle_payout(
        &self,
        reference: &str,
        settlement: PayoutSettlement,
    ) -> Result<LedgerEntry, CommitError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CommitError::Store(to_port_error(e)))?;

        // Row lock makes duplicate webhook deliveries serialize here
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, kind, from_user, to_user, method, amount, status, description, \
                    reference, created_at \
             FROM ledger_entries WHERE reference = $1 FOR UPDATE",
        )
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| CommitError::Store(to_port_error(e)))?
        .ok_or_else(|| CommitError::Store(PortError::not_found("LedgerEntry", reference)))?;

        let mut entry = LedgerEntry::try_from(row).map_err(CommitError::Store)?;

        // Already settled: no-op
        if entry.status != EntryStatus::Processing {
            return Ok(entry);
        }

        let new_status = match settlement {
            PayoutSettlement::Processed => EntryStatus::Completed,
            PayoutSettlement::Failed => {
                if let Some(user) = entry.kind.debited() {
                    Self::credit(&mut tx, user, entry.amount.amount()).await?;
                }
                EntryStatus::Failed
            }
        };

        sqlx::query("UPDATE ledger_entries SET status = $1 WHERE id = $2")
            .bind(status_str(new_status))
            .bind(*entry.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| CommitError::Store(to_port_error(e)))?;

        tx.commit()
            .await
            .map_err(|e| CommitError::Store(to_port_error(e)))?;

        entry.status = new_status;
        Ok(entry)
    }

    async fn entries(
        &self,
        user: UserId,
        filter: EntryFilter,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        let uuid = *user.as_uuid();
        let direction_clause = match filter.direction {
            Some(EntryDirection::Outgoing) => "from_user = $1",
            Some(EntryDirection::Incoming) => "to_user = $1",
            None => "(from_user = $1 OR to_user = $1)",
        };

        let sql = format!(
            "SELECT id, kind, from_user, to_user, method, amount, status, description, \
                    reference, created_at \
             FROM ledger_entries \
             WHERE {direction_clause} \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::timestamptz IS NULL OR created_at >= $3) \
               AND ($4::timestamptz IS NULL OR created_at <= $4) \
             ORDER BY created_at DESC \
             LIMIT $5"
        );

        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(uuid)
            .bind(filter.status.map(status_str))
            .bind(filter.since)
            .bind(filter.until)
            .bind(filter.limit.map(i64::from).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(to_port_error)?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }
}

/// Database row for a ledger entry
#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    kind: String,
    from_user: Option<Uuid>,
    to_user: Option<Uuid>,
    method: Option<String>,
    amount: Decimal,
    status: String,
    description: String,
    reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = PortError;

    fn try_from(row: EntryRow) -> Result<Self, PortError> {
        let kind = match (row.kind.as_str(), row.from_user, row.to_user) {
            ("transfer", Some(from), Some(to)) => EntryKind::Transfer {
                from: from.into(),
                to: to.into(),
            },
            ("deposit", None, Some(to)) => EntryKind::Deposit {
                to: to.into(),
                method: parse_method(row.method.as_deref())?,
            },
            ("withdrawal", Some(from), None) => EntryKind::Withdrawal {
                from: from.into(),
                method: parse_method(row.method.as_deref())?,
            },
            _ => {
                return Err(PortError::internal(format!(
                    "Ledger row {} violates the kind shape",
                    row.id
                )))
            }
        };

        Ok(LedgerEntry {
            id: row.id.into(),
            kind,
            amount: Money::new(row.amount, Default::default()),
            status: parse_status(&row.status)?,
            description: row.description,
            reference: row.reference,
            created_at: row.created_at,
        })
    }
}

fn split_kind(kind: &EntryKind) -> (Option<Uuid>, Option<Uuid>, Option<&'static str>) {
    match kind {
        EntryKind::Transfer { from, to } => (Some(*from.as_uuid()), Some(*to.as_uuid()), None),
        EntryKind::Deposit { to, method } => (None, Some(*to.as_uuid()), Some(method.as_str())),
        EntryKind::Withdrawal { from, method } => {
            (Some(*from.as_uuid()), None, Some(method.as_str()))
        }
    }
}

fn status_str(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Pending => "pending",
        EntryStatus::Processing => "processing",
        EntryStatus::Completed => "completed",
        EntryStatus::Failed => "failed",
    }
}

fn parse_status(value: &str) -> Result<EntryStatus, PortError> {
    match value {
        "pending" => Ok(EntryStatus::Pending),
        "processing" => Ok(EntryStatus::Processing),
        "completed" => Ok(EntryStatus::Completed),
        "failed" => Ok(EntryStatus::Failed),
        other => Err(PortError::internal(format!("Unknown entry status {other}"))),
    }
}

fn parse_method(value: Option<&str>) -> Result<PaymentMethod, PortError> {
    match value {
        Some("wallet") => Ok(PaymentMethod::Wallet),
        Some("upi") => Ok(PaymentMethod::Upi),
        Some("card") => Ok(PaymentMethod::Card),
        Some("net_banking") => Ok(PaymentMethod::NetBanking),
        Some("bank_transfer") => Ok(PaymentMethod::BankTransfer),
        other => Err(PortError::internal(format!(
            "Unknown payment method {other:?}"
        ))),
    }
}
