//! Wallet DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::UserId;
use domain_ledger::{LedgerEntry, PaymentMethod};

/// Balance response
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
    pub currency: String,
}

/// Transfer request
#[derive(Debug, Deserialize, Validate)]
pub struct TransferRequest {
    pub to: Uuid,
    pub amount: Decimal,
    #[validate(length(min = 4, max = 4))]
    pub pin: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

/// Direct add-money / withdraw request
#[derive(Debug, Deserialize, Validate)]
pub struct MoveMoneyRequest {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

/// One ledger entry from the caller's point of view
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: String,
    pub kind: &'static str,
    pub amount: Decimal,
    /// Negative when money left the caller's wallet
    pub signed_amount: Decimal,
    pub status: String,
    pub description: String,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EntryResponse {
    pub fn from_entry(entry: &LedgerEntry, viewer: UserId) -> Self {
        Self {
            id: entry.id.to_string(),
            kind: entry.kind.label(),
            amount: entry.amount.amount(),
            signed_amount: entry.signed_amount(viewer).amount(),
            status: format!("{:?}", entry.status).to_lowercase(),
            description: entry.description.clone(),
            reference: entry.reference.clone(),
            created_at: entry.created_at,
        }
    }
}

/// History response
#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<EntryResponse>,
}

/// History/statement query parameters
#[derive(Debug, Deserialize, Default)]
pub struct HistoryParams {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// Analytics query parameters
#[derive(Debug, Deserialize, Default)]
pub struct AnalyticsParams {
    pub period: Option<String>,
}
