//! Security handlers - transaction PIN management and the audit trail

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use validator::Validate;

use domain_security::PinStatus;

use crate::dto::security::*;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

/// PIN status (set / locked)
pub async fn pin_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<PinStatus>, ApiError> {
    Ok(Json(state.pins.status(user).await?))
}

/// First-time PIN setup
pub async fn set_pin(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<SetPinRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    state.pins.set(user, &request.pin).await?;
    Ok(Json(MessageResponse::new("PIN set successfully")))
}

/// Change PIN (requires the current one)
pub async fn change_pin(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<ChangePinRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    state
        .pins
        .change(user, &request.old_pin, &request.new_pin)
        .await?;
    Ok(Json(MessageResponse::new("PIN changed successfully")))
}

/// Reset PIN after identity-provider re-authentication
pub async fn reset_pin(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<ResetPinRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    state.pins.reset(user, &request.new_pin).await?;
    Ok(Json(MessageResponse::new("PIN reset successfully")))
}

/// Recent audit events for the caller
pub async fn audit_events(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let events = state.security.recent_audit_events(user, 50).await?;
    Ok(Json(json!({ "logs": events })))
}
