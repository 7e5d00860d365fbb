//! Scheduled payment handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use core_kernel::Money;
use domain_schedule::{Frequency, ScheduleStore, ScheduledPayment};

use crate::dto::schedule::*;
use crate::dto::security::MessageResponse;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

/// All schedules owned by the caller, soonest first
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let payments = state.schedules.list_for_owner(user).await?;
    Ok(Json(json!({ "payments": payments })))
}

/// Create a schedule
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let payment = ScheduledPayment::new(
        user,
        request.beneficiary.into(),
        Money::new(request.amount, Default::default()),
        request.description,
        request.frequency.unwrap_or(Frequency::Once),
        request.next_run,
        request.end_date,
    )?;
    state.schedules.create(&payment).await?;

    Ok(Json(json!({ "message": "Payment scheduled", "payment": payment })))
}

/// Pause or resume a schedule
pub async fn toggle(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut payment = state.schedules.get(id.into()).await?;
    if payment.owner != user {
        return Err(ApiError::NotFound("Payment not found".to_string()));
    }

    let status = payment.toggle()?;
    state.schedules.update(&payment).await?;
    Ok(Json(json!({ "message": format!("Payment {:?}", status).to_lowercase(), "payment": payment })))
}

/// Delete a schedule
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.schedules.delete(id.into(), user).await?;
    Ok(Json(MessageResponse::new("Scheduled payment deleted")))
}

/// Manually trigger a sweep (also runs on the hourly timer)
pub async fn process(State(state): State<AppState>) -> Result<Json<SweepResponse>, ApiError> {
    let summary = state.runner.sweep(Utc::now()).await;
    Ok(Json(SweepResponse {
        processed: summary.processed,
        failed: summary.failed,
    }))
}
