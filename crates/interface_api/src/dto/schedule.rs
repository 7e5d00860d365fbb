//! Schedule DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_schedule::Frequency;

/// Create schedule request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub beneficiary: Uuid,
    pub amount: Decimal,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub next_run: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Sweep trigger response
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub processed: usize,
    pub failed: usize,
}
