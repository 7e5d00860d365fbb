//! Wallet handlers - balance, transfers, history, statements, analytics

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use core_kernel::Money;
use domain_ledger::statement::{analytics_summary, statement_summary, write_csv_statement};
use domain_ledger::{
    AnalyticsPeriod, EntryFilter, EntryStatus, Initiator, TransferCommand, WalletStore,
};

use crate::dto::security::MessageResponse;
use crate::dto::wallet::*;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Current balance
pub async fn balance(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.transfers.store().balance(user).await?;
    Ok(Json(BalanceResponse {
        balance: balance.amount(),
        currency: balance.currency().code().to_string(),
    }))
}

/// Wallet-to-wallet transfer
pub async fn transfer(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    state
        .transfers
        .transfer(TransferCommand {
            source: user,
            target: request.to.into(),
            amount: Money::new(request.amount, Default::default()),
            description: request.description,
            initiator: Initiator::User { pin: request.pin },
        })
        .await?;

    Ok(Json(MessageResponse::new("Transfer successful")))
}

/// Direct deposit into the wallet
pub async fn add_money(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<MoveMoneyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    state
        .transfers
        .deposit(
            user,
            Money::new(request.amount, Default::default()),
            request.payment_method,
            request.description,
            None,
        )
        .await?;

    Ok(Json(MessageResponse::new("Money added successfully")))
}

/// Direct withdrawal from the wallet
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<MoveMoneyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    state
        .transfers
        .withdraw(
            user,
            Money::new(request.amount, Default::default()),
            request.payment_method,
            EntryStatus::Completed,
            request.description,
            None,
        )
        .await?;

    Ok(Json(MessageResponse::new("Withdrawal successful")))
}

/// Transaction history, newest first
pub async fn transactions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let filter = EntryFilter {
        since: params.start_date,
        until: params.end_date,
        limit: Some(params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)),
        ..Default::default()
    };

    let entries = state.transfers.store().entries(user, filter).await?;
    Ok(Json(TransactionsResponse {
        transactions: entries
            .iter()
            .map(|e| EntryResponse::from_entry(e, user))
            .collect(),
    }))
}

/// Statement summary over a date range
pub async fn statement(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = EntryFilter {
        since: params.start_date,
        until: params.end_date,
        ..Default::default()
    };
    let entries = state.transfers.store().entries(user, filter).await?;
    let summary = statement_summary(&entries, user);

    Ok(Json(serde_json::json!({
        "summary": summary,
        "transactions": entries
            .iter()
            .map(|e| EntryResponse::from_entry(e, user))
            .collect::<Vec<_>>(),
    })))
}

/// CSV statement export
pub async fn statement_csv(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<HistoryParams>,
) -> Result<axum::response::Response, ApiError> {
    use axum::http::header;
    use axum::response::IntoResponse;

    let filter = EntryFilter {
        since: params.start_date,
        until: params.end_date,
        ..Default::default()
    };
    let entries = state.transfers.store().entries(user, filter).await?;

    let mut buffer = Vec::new();
    write_csv_statement(&entries, user, &mut buffer)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=statement.csv".to_string(),
            ),
        ],
        buffer,
    )
        .into_response())
}

/// Spending analytics for a period
pub async fn analytics(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<domain_ledger::AnalyticsSummary>, ApiError> {
    let period = match params.period.as_deref() {
        Some("week") => AnalyticsPeriod::Week,
        Some("year") => AnalyticsPeriod::Year,
        Some("all") => AnalyticsPeriod::All,
        _ => AnalyticsPeriod::Month,
    };

    let filter = EntryFilter {
        status: Some(EntryStatus::Completed),
        since: Some(period.start(Utc::now())),
        ..Default::default()
    };
    let entries = state.transfers.store().entries(user, filter).await?;
    Ok(Json(analytics_summary(&entries, user)))
}
