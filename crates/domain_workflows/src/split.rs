//! Split bills
//!
//! One user fronts a bill; the others pay their shares back through the
//! standard transfer path. Equal splits use money allocation, so the
//! shares always sum exactly to the total: the creator's own share comes
//! first and absorbs the rounding remainder, never the participants'.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use core_kernel::{BillId, Money, UserId};
use domain_ledger::{Initiator, Receipt, TransferCommand, TransferService};

use crate::error::WorkflowError;
use crate::ports::WorkflowStore;

/// Per-participant share state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    Pending,
    Paid,
    Declined,
}

/// Overall bill state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Active,
    Settled,
    Cancelled,
}

/// One participant's slice of a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user: UserId,
    pub share: Money,
    pub status: ShareStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

/// A bill split across participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitBill {
    pub id: BillId,
    pub created_by: UserId,
    pub title: String,
    pub total: Money,
    pub participants: Vec<Participant>,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
}

impl SplitBill {
    /// Splits the total equally between the creator and the participants
    ///
    /// The total is allocated across `participants.len() + 1` heads. The
    /// creator takes the first allocation, which is where any rounding
    /// remainder lands; participant shares are the remaining allocations
    /// in order.
    pub fn equal(
        created_by: UserId,
        title: impl Into<String>,
        total: Money,
        participants: &[UserId],
    ) -> Result<Self, WorkflowError> {
        if !total.is_positive() {
            return Err(WorkflowError::InvalidAmount);
        }
        if participants.is_empty() {
            return Err(WorkflowError::NoParticipants);
        }

        let shares = total
            .allocate(participants.len() as u32 + 1)
            .map_err(|_| WorkflowError::InvalidAmount)?;

        // shares[0] is the creator's own portion and is not collected
        let participants = participants
            .iter()
            .zip(shares.into_iter().skip(1))
            .map(|(user, share)| Participant {
                user: *user,
                share,
                status: ShareStatus::Pending,
                paid_at: None,
            })
            .collect();

        Ok(Self {
            id: BillId::new_v7(),
            created_by,
            title: title.into(),
            total,
            participants,
            status: BillStatus::Active,
            created_at: Utc::now(),
        })
    }

    /// Splits the total with explicit per-participant amounts
    ///
    /// # Errors
    ///
    /// The shares plus the creator's implicit remainder must not exceed
    /// the total; shares must each be positive.
    pub fn custom(
        created_by: UserId,
        title: impl Into<String>,
        total: Money,
        shares: &[(UserId, Money)],
    ) -> Result<Self, WorkflowError> {
        if !total.is_positive() {
            return Err(WorkflowError::InvalidAmount);
        }
        if shares.is_empty() {
            return Err(WorkflowError::NoParticipants);
        }
        let mut sum = Money::zero(total.currency());
        for (_, share) in shares {
            if !share.is_positive() {
                return Err(WorkflowError::InvalidAmount);
            }
            sum = sum
                .checked_add(share)
                .map_err(|_| WorkflowError::InvalidAmount)?;
        }
        if sum.amount() > total.amount() {
            return Err(WorkflowError::SharesMismatch);
        }

        Ok(Self {
            id: BillId::new_v7(),
            created_by,
            title: title.into(),
            total,
            participants: shares
                .iter()
                .map(|(user, share)| Participant {
                    user: *user,
                    share: *share,
                    status: ShareStatus::Pending,
                    paid_at: None,
                })
                .collect(),
            status: BillStatus::Active,
            created_at: Utc::now(),
        })
    }

    /// The pending share owed by `user`, if any
    pub fn pending_share(&self, user: UserId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.user == user && p.status == ShareStatus::Pending)
    }

    /// Marks the user's share paid; settles the bill when none remain
    fn mark_paid(&mut self, user: UserId, now: DateTime<Utc>) {
        if let Some(p) = self
            .participants
            .iter_mut()
            .find(|p| p.user == user && p.status == ShareStatus::Pending)
        {
            p.status = ShareStatus::Paid;
            p.paid_at = Some(now);
        }
        if self
            .participants
            .iter()
            .all(|p| p.status == ShareStatus::Paid)
        {
            self.status = BillStatus::Settled;
        }
    }

    fn mark_declined(&mut self, user: UserId) -> bool {
        match self
            .participants
            .iter_mut()
            .find(|p| p.user == user && p.status == ShareStatus::Pending)
        {
            Some(p) => {
                p.status = ShareStatus::Declined;
                true
            }
            None => false,
        }
    }
}

/// Split bill operations over the store and the transfer orchestrator
#[derive(Clone)]
pub struct SplitBillWorkflow {
    store: Arc<dyn WorkflowStore>,
    transfers: TransferService,
}

impl SplitBillWorkflow {
    pub fn new(store: Arc<dyn WorkflowStore>, transfers: TransferService) -> Self {
        Self { store, transfers }
    }

    /// Persists a new bill
    pub async fn create(&self, bill: SplitBill) -> Result<SplitBill, WorkflowError> {
        self.store.create_bill(&bill).await?;
        Ok(bill)
    }

    /// Pays the caller's pending share of a bill
    ///
    /// Runs the PIN-gated transfer participant -> creator, then updates
    /// the share. A failed status update after a committed transfer is
    /// logged for reconciliation, mirroring the request flow.
    pub async fn pay_share(
        &self,
        user: UserId,
        bill_id: BillId,
        pin: Option<String>,
    ) -> Result<(SplitBill, Receipt), WorkflowError> {
        let mut bill = self.store.get_bill(bill_id).await?;
        if bill.status != BillStatus::Active {
            return Err(WorkflowError::NotFound);
        }
        let share = bill
            .pending_share(user)
            .ok_or(WorkflowError::NoPendingShare)?
            .share;

        let receipt = self
            .transfers
            .transfer(TransferCommand {
                source: user,
                target: bill.created_by,
                amount: share,
                description: Some(format!("Split: {}", bill.title)),
                initiator: Initiator::User { pin },
            })
            .await?;

        bill.mark_paid(user, Utc::now());
        if let Err(e) = self.store.update_bill(&bill).await {
            error!(
                bill = %bill.id,
                entry = %receipt.entry.id,
                error = %e,
                "Transfer committed but bill update failed"
            );
        }

        Ok((bill, receipt))
    }

    /// Declines the caller's pending share
    pub async fn decline_share(
        &self,
        user: UserId,
        bill_id: BillId,
    ) -> Result<SplitBill, WorkflowError> {
        let mut bill = self.store.get_bill(bill_id).await?;
        if !bill.mark_declined(user) {
            return Err(WorkflowError::NoPendingShare);
        }
        self.store.update_bill(&bill).await?;
        Ok(bill)
    }

    /// Cancels an active bill; only the creator may cancel
    pub async fn cancel(&self, user: UserId, bill_id: BillId) -> Result<SplitBill, WorkflowError> {
        let mut bill = self.store.get_bill(bill_id).await?;
        if bill.created_by != user || bill.status != BillStatus::Active {
            return Err(WorkflowError::NotFound);
        }
        bill.status = BillStatus::Cancelled;
        self.store.update_bill(&bill).await?;
        Ok(bill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_equal_split_shares_sum_with_creator_remainder() {
        let creator = UserId::new();
        let participants = [UserId::new(), UserId::new()];
        let bill = SplitBill::equal(creator, "Dinner", Money::inr(dec!(100)), &participants).unwrap();

        // 100 across 3 heads: creator takes 33.34, participants 33.33 each
        let participant_sum: Decimal = bill.participants.iter().map(|p| p.share.amount()).sum();
        assert_eq!(bill.participants.len(), 2);
        assert_eq!(participant_sum, dec!(66.66));
        assert!(bill
            .participants
            .iter()
            .all(|p| p.share.amount() == dec!(33.33)));
    }

    #[test]
    fn test_custom_split_rejects_overflowing_shares() {
        let creator = UserId::new();
        let result = SplitBill::custom(
            creator,
            "Trip",
            Money::inr(dec!(100)),
            &[
                (UserId::new(), Money::inr(dec!(60))),
                (UserId::new(), Money::inr(dec!(60))),
            ],
        );
        assert!(matches!(result, Err(WorkflowError::SharesMismatch)));
    }

    #[test]
    fn test_no_participants_rejected() {
        assert!(matches!(
            SplitBill::equal(UserId::new(), "Solo", Money::inr(dec!(100)), &[]),
            Err(WorkflowError::NoParticipants)
        ));
    }

    #[test]
    fn test_settles_when_all_paid() {
        let creator = UserId::new();
        let a = UserId::new();
        let b = UserId::new();
        let mut bill = SplitBill::equal(creator, "Dinner", Money::inr(dec!(90)), &[a, b]).unwrap();

        bill.mark_paid(a, Utc::now());
        assert_eq!(bill.status, BillStatus::Active);

        bill.mark_paid(b, Utc::now());
        assert_eq!(bill.status, BillStatus::Settled);
    }

    #[test]
    fn test_declined_share_cannot_be_paid() {
        let creator = UserId::new();
        let a = UserId::new();
        let mut bill = SplitBill::equal(creator, "Dinner", Money::inr(dec!(90)), &[a]).unwrap();

        assert!(bill.mark_declined(a));
        assert!(bill.pending_share(a).is_none());
        assert!(!bill.mark_declined(a));
    }
}
