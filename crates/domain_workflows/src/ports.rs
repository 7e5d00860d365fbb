//! Workflow Domain Ports

use async_trait::async_trait;

use core_kernel::{BeneficiaryId, BillId, DomainPort, PortError, RequestId, UserId};

use crate::beneficiary::Beneficiary;
use crate::request::PaymentRequest;
use crate::split::SplitBill;

/// Port over request, split-bill, and beneficiary persistence
#[async_trait]
pub trait WorkflowStore: DomainPort {
    // Payment requests

    async fn create_request(&self, request: &PaymentRequest) -> Result<(), PortError>;

    async fn get_request(&self, id: RequestId) -> Result<PaymentRequest, PortError>;

    async fn update_request(&self, request: &PaymentRequest) -> Result<(), PortError>;

    /// Requests the user sent, newest first
    async fn requests_sent(&self, user: UserId) -> Result<Vec<PaymentRequest>, PortError>;

    /// Requests addressed to the user, newest first
    async fn requests_received(&self, user: UserId) -> Result<Vec<PaymentRequest>, PortError>;

    /// Count of pending requests addressed to the user (badge counts)
    async fn pending_request_count(&self, user: UserId) -> Result<u64, PortError>;

    // Split bills

    async fn create_bill(&self, bill: &SplitBill) -> Result<(), PortError>;

    async fn get_bill(&self, id: BillId) -> Result<SplitBill, PortError>;

    async fn update_bill(&self, bill: &SplitBill) -> Result<(), PortError>;

    /// Bills the user created, newest first
    async fn bills_created_by(&self, user: UserId) -> Result<Vec<SplitBill>, PortError>;

    /// Bills the user participates in (excluding their own), newest first
    async fn bills_participating(&self, user: UserId) -> Result<Vec<SplitBill>, PortError>;

    // Beneficiaries

    /// Saves a beneficiary; the (owner, target) pair is unique
    async fn add_beneficiary(&self, beneficiary: &Beneficiary) -> Result<(), PortError>;

    async fn list_beneficiaries(&self, owner: UserId) -> Result<Vec<Beneficiary>, PortError>;

    async fn rename_beneficiary(
        &self,
        id: BeneficiaryId,
        owner: UserId,
        nickname: &str,
    ) -> Result<Beneficiary, PortError>;

    async fn remove_beneficiary(&self, id: BeneficiaryId, owner: UserId) -> Result<(), PortError>;
}

/// In-memory mock implementation of WorkflowStore for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct State {
        requests: HashMap<RequestId, PaymentRequest>,
        bills: HashMap<BillId, SplitBill>,
        beneficiaries: HashMap<BeneficiaryId, Beneficiary>,
    }

    /// In-memory workflow store
    #[derive(Debug, Default, Clone)]
    pub struct MemoryWorkflowStore {
        state: Arc<Mutex<State>>,
    }

    impl MemoryWorkflowStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemoryWorkflowStore {}

    #[async_trait]
    impl WorkflowStore for MemoryWorkflowStore {
        async fn create_request(&self, request: &PaymentRequest) -> Result<(), PortError> {
            self.state
                .lock()
                .await
                .requests
                .insert(request.id, request.clone());
            Ok(())
        }

        async fn get_request(&self, id: RequestId) -> Result<PaymentRequest, PortError> {
            self.state
                .lock()
                .await
                .requests
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("PaymentRequest", id))
        }

        async fn update_request(&self, request: &PaymentRequest) -> Result<(), PortError> {
            let mut state = self.state.lock().await;
            if !state.requests.contains_key(&request.id) {
                return Err(PortError::not_found("PaymentRequest", request.id));
            }
            state.requests.insert(request.id, request.clone());
            Ok(())
        }

        async fn requests_sent(&self, user: UserId) -> Result<Vec<PaymentRequest>, PortError> {
            let state = self.state.lock().await;
            let mut list: Vec<PaymentRequest> = state
                .requests
                .values()
                .filter(|r| r.requester == user)
                .cloned()
                .collect();
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(list)
        }

        async fn requests_received(&self, user: UserId) -> Result<Vec<PaymentRequest>, PortError> {
            let state = self.state.lock().await;
            let mut list: Vec<PaymentRequest> = state
                .requests
                .values()
                .filter(|r| r.payer == user)
                .cloned()
                .collect();
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(list)
        }

        async fn pending_request_count(&self, user: UserId) -> Result<u64, PortError> {
            let state = self.state.lock().await;
            Ok(state
                .requests
                .values()
                .filter(|r| r.payer == user && r.is_pending())
                .count() as u64)
        }

        async fn create_bill(&self, bill: &SplitBill) -> Result<(), PortError> {
            self.state.lock().await.bills.insert(bill.id, bill.clone());
            Ok(())
        }

        async fn get_bill(&self, id: BillId) -> Result<SplitBill, PortError> {
            self.state
                .lock()
                .await
                .bills
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("SplitBill", id))
        }

        async fn update_bill(&self, bill: &SplitBill) -> Result<(), PortError> {
            let mut state = self.state.lock().await;
            if !state.bills.contains_key(&bill.id) {
                return Err(PortError::not_found("SplitBill", bill.id));
            }
            state.bills.insert(bill.id, bill.clone());
            Ok(())
        }

        async fn bills_created_by(&self, user: UserId) -> Result<Vec<SplitBill>, PortError> {
            let state = self.state.lock().await;
            let mut list: Vec<SplitBill> = state
                .bills
                .values()
                .filter(|b| b.created_by == user)
                .cloned()
                .collect();
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(list)
        }

        async fn bills_participating(&self, user: UserId) -> Result<Vec<SplitBill>, PortError> {
            let state = self.state.lock().await;
            let mut list: Vec<SplitBill> = state
                .bills
                .values()
                .filter(|b| b.created_by != user && b.participants.iter().any(|p| p.user == user))
                .cloned()
                .collect();
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(list)
        }

        async fn add_beneficiary(&self, beneficiary: &Beneficiary) -> Result<(), PortError> {
            let mut state = self.state.lock().await;
            let duplicate = state
                .beneficiaries
                .values()
                .any(|b| b.owner == beneficiary.owner && b.target == beneficiary.target);
            if duplicate {
                return Err(PortError::conflict("Beneficiary pair already saved"));
            }
            state
                .beneficiaries
                .insert(beneficiary.id, beneficiary.clone());
            Ok(())
        }

        async fn list_beneficiaries(&self, owner: UserId) -> Result<Vec<Beneficiary>, PortError> {
            let state = self.state.lock().await;
            let mut list: Vec<Beneficiary> = state
                .beneficiaries
                .values()
                .filter(|b| b.owner == owner)
                .cloned()
                .collect();
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(list)
        }

        async fn rename_beneficiary(
            &self,
            id: BeneficiaryId,
            owner: UserId,
            nickname: &str,
        ) -> Result<Beneficiary, PortError> {
            let mut state = self.state.lock().await;
            match state.beneficiaries.get_mut(&id) {
                Some(b) if b.owner == owner => {
                    b.nickname = nickname.to_string();
                    Ok(b.clone())
                }
                _ => Err(PortError::not_found("Beneficiary", id)),
            }
        }

        async fn remove_beneficiary(
            &self,
            id: BeneficiaryId,
            owner: UserId,
        ) -> Result<(), PortError> {
            let mut state = self.state.lock().await;
            match state.beneficiaries.get(&id) {
                Some(b) if b.owner == owner => {
                    state.beneficiaries.remove(&id);
                    Ok(())
                }
                _ => Err(PortError::not_found("Beneficiary", id)),
            }
        }
    }
}
