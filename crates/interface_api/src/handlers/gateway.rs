//! Gateway handlers - funding orders, payouts, and the provider webhook

use axum::{
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use serde_json::{json, Value};
use validator::Validate;

use core_kernel::Money;
use domain_gateway::DepositConfirmation;

use crate::dto::gateway::*;
use crate::dto::security::MessageResponse;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

const SIGNATURE_HEADER: &str = "x-provider-signature";

/// Create a funding order at the provider
pub async fn create_order(
    State(state): State<AppState>,
    Extension(CurrentUser(_user)): Extension<CurrentUser>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    request.validate()?;

    let order = state
        .gateway
        .create_order(Money::new(request.amount, Default::default()))
        .await?;
    Ok(Json(OrderResponse {
        order_ref: order.order_ref,
        amount: order.amount.amount(),
    }))
}

/// Verify a signed payment confirmation and credit the wallet
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let receipt = state
        .gateway
        .confirm_deposit(
            user,
            DepositConfirmation {
                order_ref: request.order_ref,
                payment_ref: request.payment_ref,
                signature: request.signature,
            },
            Money::new(request.amount, Default::default()),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment successful! Wallet credited.",
        "payment_ref": receipt.entry.reference,
    })))
}

/// Link a bank account for payouts
pub async fn add_bank_account(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<LinkBankAccountRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let account = state
        .gateway
        .link_payout_account(
            user,
            &request.account_name,
            &request.ifsc,
            &request.account_number,
            None,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Bank account linked successfully",
        "fund_account_ref": account.fund_account_ref,
    })))
}

/// Withdraw to the linked bank account
pub async fn payout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<PayoutRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    request.validate()?;

    let (_, payout_ref) = state
        .gateway
        .initiate_payout(user, Money::new(request.amount, Default::default()))
        .await?;

    Ok(Json(PayoutResponse {
        payout_ref,
        status: "processing".to_string(),
    }))
}

/// Provider webhook (public route; authenticated by signature)
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<MessageResponse>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing signature header".to_string()))?;

    state.gateway.handle_webhook(&body, signature).await?;
    Ok(Json(MessageResponse::new("received")))
}
