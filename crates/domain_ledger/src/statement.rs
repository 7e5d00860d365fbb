//! Statements and spending analytics
//!
//! Pure read-side aggregation over ledger entries: period summaries, CSV
//! statement export, monthly flows, and top counterparties. Nothing here
//! is load-bearing for correctness; it only ever reads committed entries.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

use core_kernel::{Money, UserId};

use crate::entry::{EntryKind, LedgerEntry};
use crate::error::WalletError;

/// Reporting window for analytics queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsPeriod {
    Week,
    Month,
    Year,
    All,
}

impl AnalyticsPeriod {
    /// Start of the window, relative to `now`
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            AnalyticsPeriod::Week => now - chrono::Duration::days(7),
            AnalyticsPeriod::Month => now - chrono::Duration::days(30),
            AnalyticsPeriod::Year => now - chrono::Duration::days(365),
            AnalyticsPeriod::All => DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// Totals for a statement period
#[derive(Debug, Clone, Serialize)]
pub struct StatementSummary {
    pub total_in: Money,
    pub total_out: Money,
    pub entry_count: usize,
}

/// Money in and out for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyFlow {
    pub year: i32,
    pub month: u32,
    pub sent: Decimal,
    pub received: Decimal,
}

/// Aggregate flow toward one counterparty
#[derive(Debug, Clone, Serialize)]
pub struct CounterpartyTotal {
    pub user_id: UserId,
    pub total: Decimal,
    pub count: usize,
}

/// Full analytics response
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_sent: Money,
    pub total_received: Money,
    pub monthly: Vec<MonthlyFlow>,
    pub top_counterparties: Vec<CounterpartyTotal>,
}

/// Builds the statement summary for a user over the given entries
pub fn statement_summary(entries: &[LedgerEntry], user: UserId) -> StatementSummary {
    let currency = Default::default();
    let mut total_in = Money::zero(currency);
    let mut total_out = Money::zero(currency);

    for entry in entries {
        let signed = entry.signed_amount(user);
        if signed.is_negative() {
            total_out = total_out + signed.abs();
        } else {
            total_in = total_in + signed;
        }
    }

    StatementSummary {
        total_in,
        total_out,
        entry_count: entries.len(),
    }
}

/// Builds the analytics summary for a user
///
/// `entries` should already be restricted to completed entries in the
/// requested period; `monthly` additionally buckets by calendar month and
/// `top_counterparties` ranks transfer targets by outgoing volume (top 5).
pub fn analytics_summary(entries: &[LedgerEntry], user: UserId) -> AnalyticsSummary {
    let currency = Default::default();
    let mut total_sent = Money::zero(currency);
    let mut total_received = Money::zero(currency);
    let mut monthly: HashMap<(i32, u32), MonthlyFlow> = HashMap::new();
    let mut counterparties: HashMap<UserId, (Decimal, usize)> = HashMap::new();

    for entry in entries {
        let outgoing = entry.kind.debited() == Some(user);
        let incoming = entry.kind.credited() == Some(user);
        let key = (entry.created_at.year(), entry.created_at.month());
        let bucket = monthly.entry(key).or_insert(MonthlyFlow {
            year: key.0,
            month: key.1,
            sent: Decimal::ZERO,
            received: Decimal::ZERO,
        });

        if outgoing {
            total_sent = total_sent + entry.amount;
            bucket.sent += entry.amount.amount();

            if let EntryKind::Transfer { to, .. } = entry.kind {
                let slot = counterparties.entry(to).or_insert((Decimal::ZERO, 0));
                slot.0 += entry.amount.amount();
                slot.1 += 1;
            }
        }
        if incoming {
            total_received = total_received + entry.amount;
            bucket.received += entry.amount.amount();
        }
    }

    let mut monthly: Vec<MonthlyFlow> = monthly.into_values().collect();
    monthly.sort_by_key(|m| (m.year, m.month));

    let mut top_counterparties: Vec<CounterpartyTotal> = counterparties
        .into_iter()
        .map(|(user_id, (total, count))| CounterpartyTotal { user_id, total, count })
        .collect();
    top_counterparties.sort_by(|a, b| b.total.cmp(&a.total));
    top_counterparties.truncate(5);

    AnalyticsSummary {
        total_sent,
        total_received,
        monthly,
        top_counterparties,
    }
}

/// Writes a CSV statement for the user
///
/// Columns: date, type, description, signed amount, status. Amounts are
/// signed from the user's point of view.
pub fn write_csv_statement<W: Write>(
    entries: &[LedgerEntry],
    user: UserId,
    writer: W,
) -> Result<(), WalletError> {
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(["Date", "Type", "Description", "Amount", "Status"])
        .map_err(csv_error)?;

    for entry in entries {
        let signed = entry.signed_amount(user);
        let sign = if signed.is_negative() { "-" } else { "+" };
        csv.write_record([
            entry.created_at.format("%Y-%m-%d").to_string(),
            entry.kind.label().to_string(),
            entry.description.clone(),
            format!("{}{}", sign, entry.amount.amount()),
            format!("{:?}", entry.status).to_lowercase(),
        ])
        .map_err(csv_error)?;
    }

    csv.flush().map_err(|e| csv_error(csv::Error::from(e)))?;
    Ok(())
}

fn csv_error(e: csv::Error) -> WalletError {
    WalletError::Store(core_kernel::PortError::internal(format!(
        "Statement export failed: {e}"
    )))
}
