//! Payment requests
//!
//! "Ask user X for amount Y". Accepting a request runs the standard
//! PIN-gated transfer from the payer to the requester; the request row
//! flips to paid immediately after the transfer commits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use core_kernel::{Money, RequestId, UserId};
use domain_ledger::{Initiator, Receipt, TransferCommand, TransferService};

use crate::error::WorkflowError;
use crate::ports::WorkflowStore;

/// Lifecycle of a payment request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Paid,
    Declined,
    Cancelled,
}

/// A request for money from one user to another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: RequestId,
    /// Who asked for the money (and receives it on payment)
    pub requester: UserId,
    /// Who is being asked to pay
    pub payer: UserId,
    pub amount: Money,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PaymentRequest {
    /// Creates a pending request
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts and self-requests
    pub fn new(
        requester: UserId,
        payer: UserId,
        amount: Money,
        message: Option<String>,
    ) -> Result<Self, WorkflowError> {
        if !amount.is_positive() {
            return Err(WorkflowError::InvalidAmount);
        }
        if requester == payer {
            return Err(WorkflowError::SelfRequest);
        }
        Ok(Self {
            id: RequestId::new_v7(),
            requester,
            payer,
            amount,
            message: message.unwrap_or_else(|| "Payment request".to_string()),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    fn resolve(&mut self, status: RequestStatus) {
        self.status = status;
        self.resolved_at = Some(Utc::now());
    }
}

/// Request operations over the store and the transfer orchestrator
#[derive(Clone)]
pub struct RequestWorkflow {
    store: Arc<dyn WorkflowStore>,
    transfers: TransferService,
}

impl RequestWorkflow {
    pub fn new(store: Arc<dyn WorkflowStore>, transfers: TransferService) -> Self {
        Self { store, transfers }
    }

    /// Creates and persists a request
    pub async fn create(
        &self,
        requester: UserId,
        payer: UserId,
        amount: Money,
        message: Option<String>,
    ) -> Result<PaymentRequest, WorkflowError> {
        let request = PaymentRequest::new(requester, payer, amount, message)?;
        self.store.create_request(&request).await?;
        Ok(request)
    }

    /// Pays a pending request addressed to `payer`
    ///
    /// The transfer is the standard PIN-gated orchestrator call. If the
    /// status update after a committed transfer fails, the money has moved
    /// and the request stays pending; that case is logged for
    /// reconciliation rather than unwound.
    pub async fn pay(
        &self,
        payer: UserId,
        request_id: RequestId,
        pin: Option<String>,
    ) -> Result<(PaymentRequest, Receipt), WorkflowError> {
        let mut request = self.store.get_request(request_id).await?;
        if request.payer != payer || !request.is_pending() {
            return Err(WorkflowError::NotFound);
        }

        let receipt = self
            .transfers
            .transfer(TransferCommand {
                source: payer,
                target: request.requester,
                amount: request.amount,
                description: Some(format!("Paid request: {}", request.message)),
                initiator: Initiator::User { pin },
            })
            .await?;

        request.resolve(RequestStatus::Paid);
        if let Err(e) = self.store.update_request(&request).await {
            error!(
                request = %request.id,
                entry = %receipt.entry.id,
                error = %e,
                "Transfer committed but request status update failed"
            );
        }

        Ok((request, receipt))
    }

    /// Declines a pending request addressed to `payer`
    pub async fn decline(
        &self,
        payer: UserId,
        request_id: RequestId,
    ) -> Result<PaymentRequest, WorkflowError> {
        let mut request = self.store.get_request(request_id).await?;
        if request.payer != payer || !request.is_pending() {
            return Err(WorkflowError::NotFound);
        }
        request.resolve(RequestStatus::Declined);
        self.store.update_request(&request).await?;
        Ok(request)
    }

    /// Cancels a pending request created by `requester`
    pub async fn cancel(
        &self,
        requester: UserId,
        request_id: RequestId,
    ) -> Result<PaymentRequest, WorkflowError> {
        let mut request = self.store.get_request(request_id).await?;
        if request.requester != requester || !request.is_pending() {
            return Err(WorkflowError::NotFound);
        }
        request.resolve(RequestStatus::Cancelled);
        self.store.update_request(&request).await?;
        Ok(request)
    }
}
