//! Workflow handlers - payment requests, split bills, beneficiaries

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use core_kernel::Money;
use domain_workflows::{Beneficiary, SplitBill, WorkflowStore};

use crate::dto::security::MessageResponse;
use crate::dto::workflows::*;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

// Payment requests

/// Requests sent and received by the caller
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let sent = state.workflows.requests_sent(user).await?;
    let received = state.workflows.requests_received(user).await?;
    Ok(Json(json!({ "sent": sent, "received": received })))
}

/// Pending request count for notification badges
pub async fn pending_request_count(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let count = state.workflows.pending_request_count(user).await?;
    Ok(Json(json!({ "count": count })))
}

/// Create a payment request
pub async fn create_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateRequestRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let created = state
        .requests
        .create(
            user,
            request.to.into(),
            Money::new(request.amount, Default::default()),
            request.message,
        )
        .await?;
    Ok(Json(json!({ "message": "Request sent", "request": created })))
}

/// Pay a request addressed to the caller
pub async fn pay_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<PayRequest>,
) -> Result<Json<Value>, ApiError> {
    body.validate()?;

    let (request, _) = state.requests.pay(user, id.into(), body.pin).await?;
    Ok(Json(json!({ "message": "Payment successful", "request": request })))
}

/// Decline a request addressed to the caller
pub async fn decline_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let request = state.requests.decline(user, id.into()).await?;
    Ok(Json(json!({ "message": "Request declined", "request": request })))
}

/// Cancel a request the caller created
pub async fn cancel_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.requests.cancel(user, id.into()).await?;
    Ok(Json(MessageResponse::new("Request cancelled")))
}

// Split bills

/// Bills created by and shared with the caller
pub async fn list_bills(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let created = state.workflows.bills_created_by(user).await?;
    let participating = state.workflows.bills_participating(user).await?;
    Ok(Json(json!({ "created": created, "participating": participating })))
}

/// Create a split bill (equal by default, custom shares when provided)
pub async fn create_bill(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateSplitRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let total = Money::new(request.total_amount, Default::default());
    let bill = match request.custom_shares {
        Some(shares) => {
            let shares: Vec<_> = shares
                .into_iter()
                .map(|s| (s.user.into(), Money::new(s.amount, Default::default())))
                .collect();
            SplitBill::custom(user, request.title, total, &shares)?
        }
        None => {
            let participants: Vec<_> =
                request.participants.into_iter().map(Into::into).collect();
            SplitBill::equal(user, request.title, total, &participants)?
        }
    };

    let bill = state.splits.create(bill).await?;
    Ok(Json(json!({ "message": "Split bill created", "bill": bill })))
}

/// Pay the caller's share of a bill
pub async fn pay_share(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<PayRequest>,
) -> Result<Json<Value>, ApiError> {
    body.validate()?;

    let (bill, _) = state.splits.pay_share(user, id.into(), body.pin).await?;
    Ok(Json(json!({ "message": "Payment successful", "bill": bill })))
}

/// Decline the caller's share of a bill
pub async fn decline_share(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let bill = state.splits.decline_share(user, id.into()).await?;
    Ok(Json(json!({ "message": "Declined", "bill": bill })))
}

/// Cancel a bill the caller created
pub async fn cancel_bill(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.splits.cancel(user, id.into()).await?;
    Ok(Json(MessageResponse::new("Bill cancelled")))
}

// Beneficiaries

/// Saved beneficiaries for the caller
pub async fn list_beneficiaries(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let beneficiaries = state.workflows.list_beneficiaries(user).await?;
    Ok(Json(json!({ "beneficiaries": beneficiaries })))
}

/// Save a beneficiary
pub async fn add_beneficiary(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<AddBeneficiaryRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let nickname = request.nickname.unwrap_or_else(|| "Saved recipient".to_string());
    let beneficiary = Beneficiary::new(user, request.beneficiary.into(), nickname)?;
    state.workflows.add_beneficiary(&beneficiary).await?;
    Ok(Json(json!({ "message": "Beneficiary added", "beneficiary": beneficiary })))
}

/// Rename a beneficiary
pub async fn rename_beneficiary(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<RenameBeneficiaryRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let beneficiary = state
        .workflows
        .rename_beneficiary(id.into(), user, &request.nickname)
        .await?;
    Ok(Json(json!({ "message": "Beneficiary updated", "beneficiary": beneficiary })))
}

/// Remove a beneficiary
pub async fn remove_beneficiary(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.workflows.remove_beneficiary(id.into(), user).await?;
    Ok(Json(MessageResponse::new("Beneficiary removed")))
}
