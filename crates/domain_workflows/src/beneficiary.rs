//! Saved beneficiaries
//!
//! Pure convenience data: an (owner, target) pair with a nickname. The
//! only invariant is uniqueness of the pair, enforced by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BeneficiaryId, UserId};

use crate::error::WorkflowError;

/// A saved recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: BeneficiaryId,
    pub owner: UserId,
    pub target: UserId,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

impl Beneficiary {
    /// Saves a recipient under a nickname
    ///
    /// # Errors
    ///
    /// Returns error if the owner tries to save themselves
    pub fn new(
        owner: UserId,
        target: UserId,
        nickname: impl Into<String>,
    ) -> Result<Self, WorkflowError> {
        if owner == target {
            return Err(WorkflowError::SelfBeneficiary);
        }
        Ok(Self {
            id: BeneficiaryId::new_v7(),
            owner,
            target,
            nickname: nickname.into(),
            created_at: Utc::now(),
        })
    }
}
