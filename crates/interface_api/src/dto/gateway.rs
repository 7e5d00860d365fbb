//! Gateway DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create funding order request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub amount: Decimal,
}

/// Funding order response
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_ref: String,
    pub amount: Decimal,
}

/// Signed payment confirmation
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    pub order_ref: String,
    pub payment_ref: String,
    pub signature: String,
    pub amount: Decimal,
}

/// Link bank account request
#[derive(Debug, Deserialize, Validate)]
pub struct LinkBankAccountRequest {
    #[validate(length(min = 1, max = 120))]
    pub account_name: String,
    #[validate(length(min = 4, max = 16))]
    pub ifsc: String,
    #[validate(length(min = 6, max = 24))]
    pub account_number: String,
}

/// Payout request
#[derive(Debug, Deserialize, Validate)]
pub struct PayoutRequest {
    pub amount: Decimal,
}

/// Payout response
#[derive(Debug, Serialize)]
pub struct PayoutResponse {
    pub payout_ref: String,
    pub status: String,
}
