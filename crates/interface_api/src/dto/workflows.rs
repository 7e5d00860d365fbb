//! Workflow DTOs

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create payment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestRequest {
    pub to: Uuid,
    pub amount: Decimal,
    #[validate(length(max = 255))]
    pub message: Option<String>,
}

/// PIN-gated settlement body (pay a request or a split share)
#[derive(Debug, Deserialize, Validate)]
pub struct PayRequest {
    #[validate(length(min = 4, max = 4))]
    pub pin: Option<String>,
}

/// Create split bill request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSplitRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    pub total_amount: Decimal,
    /// Participant user ids for an equal split
    pub participants: Vec<Uuid>,
    /// Explicit amounts keyed by participant; overrides the equal split
    pub custom_shares: Option<Vec<CustomShare>>,
}

#[derive(Debug, Deserialize)]
pub struct CustomShare {
    pub user: Uuid,
    pub amount: Decimal,
}

/// Add beneficiary request
#[derive(Debug, Deserialize, Validate)]
pub struct AddBeneficiaryRequest {
    pub beneficiary: Uuid,
    #[validate(length(max = 80))]
    pub nickname: Option<String>,
}

/// Rename beneficiary request
#[derive(Debug, Deserialize, Validate)]
pub struct RenameBeneficiaryRequest {
    #[validate(length(min = 1, max = 80))]
    pub nickname: String,
}
