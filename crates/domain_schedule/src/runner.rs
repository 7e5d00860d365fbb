//! Scheduled payment sweep
//!
//! Selects every active schedule that is due and runs each one through the
//! transfer orchestrator. Schedules are processed independently: one
//! failure marks that schedule failed and the sweep moves on - never
//! all-or-nothing batch semantics.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use domain_ledger::{Initiator, TransferCommand, TransferService};

use crate::ports::ScheduleStore;
use crate::schedule::ScheduledPayment;

/// Outcome counts for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Timer-driven caller of the transfer orchestrator
#[derive(Clone)]
pub struct ScheduleRunner {
    schedules: Arc<dyn ScheduleStore>,
    transfers: TransferService,
}

impl ScheduleRunner {
    pub fn new(schedules: Arc<dyn ScheduleStore>, transfers: TransferService) -> Self {
        Self { schedules, transfers }
    }

    /// Processes every schedule due at `now`
    ///
    /// Insufficient funds or any other transfer failure flips that
    /// schedule to failed without retrying in this sweep; the owner must
    /// reactivate it. Successful runs advance or retire the schedule.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepSummary {
        let due = match self.schedules.due(now).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "Sweep query failed");
                return SweepSummary::default();
            }
        };

        if due.is_empty() {
            return SweepSummary::default();
        }

        info!(count = due.len(), "Processing due scheduled payments");

        let mut summary = SweepSummary::default();
        for schedule in due {
            match self.run_one(schedule, now).await {
                true => summary.processed += 1,
                false => summary.failed += 1,
            }
        }

        info!(
            processed = summary.processed,
            failed = summary.failed,
            "Sweep complete"
        );
        summary
    }

    /// Runs a single schedule; returns true on success
    async fn run_one(&self, mut schedule: ScheduledPayment, now: DateTime<Utc>) -> bool {
        let command = TransferCommand {
            source: schedule.owner,
            target: schedule.beneficiary,
            amount: schedule.amount,
            description: Some(format!("Scheduled: {}", schedule.description)),
            initiator: Initiator::System,
        };

        match self.transfers.transfer(command).await {
            Ok(_) => {
                schedule.record_success(now);
                if let Err(e) = self.schedules.update(&schedule).await {
                    // The transfer is committed; the schedule will re-fire
                    // next sweep and the owner sees a duplicate, which is
                    // why this is loud.
                    error!(schedule = %schedule.id, error = %e, "Schedule advance failed after committed transfer");
                }
                true
            }
            Err(e) => {
                warn!(schedule = %schedule.id, error = %e, "Scheduled payment failed");
                schedule.record_failure();
                if let Err(e) = self.schedules.update(&schedule).await {
                    error!(schedule = %schedule.id, error = %e, "Failed to mark schedule failed");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MemoryScheduleStore;
    use crate::schedule::{Frequency, ScheduleStatus, ScheduledPayment};
    use core_kernel::{Money, UserId};
    use domain_ledger::ports::mock::MemoryWalletStore;
    use domain_ledger::NullNotificationSink;
    use domain_security::ports::mock::MemorySecurityStore;
    use rust_decimal_macros::dec;

    async fn runner_with(
        accounts: &[(UserId, Money)],
    ) -> (ScheduleRunner, MemoryWalletStore, Arc<MemoryScheduleStore>) {
        let wallet = MemoryWalletStore::with_accounts(accounts).await;
        let schedules = Arc::new(MemoryScheduleStore::new());
        let transfers = TransferService::new(
            Arc::new(wallet.clone()),
            Arc::new(MemorySecurityStore::new()),
            Arc::new(NullNotificationSink),
        );
        (
            ScheduleRunner::new(schedules.clone(), transfers),
            wallet,
            schedules,
        )
    }

    fn once_schedule(owner: UserId, beneficiary: UserId, amount: Money) -> ScheduledPayment {
        ScheduledPayment::new(
            owner,
            beneficiary,
            amount,
            Some("rent".to_string()),
            Frequency::Once,
            Utc::now(),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sweep_processes_due_and_skips_future() {
        let owner = UserId::new();
        let beneficiary = UserId::new();
        let (runner, wallet, schedules) = runner_with(&[
            (owner, Money::inr(dec!(1000))),
            (beneficiary, Money::inr(dec!(0))),
        ])
        .await;

        let due = once_schedule(owner, beneficiary, Money::inr(dec!(300)));
        let mut future = once_schedule(owner, beneficiary, Money::inr(dec!(300)));
        future.next_run = Utc::now() + chrono::Duration::days(2);
        schedules.create(&due).await.unwrap();
        schedules.create(&future).await.unwrap();

        let summary = runner.sweep(Utc::now()).await;
        assert_eq!(summary, SweepSummary { processed: 1, failed: 0 });

        use domain_ledger::WalletStore;
        assert_eq!(wallet.balance(beneficiary).await.unwrap().amount(), dec!(300));

        let advanced = schedules.get(due.id).await.unwrap();
        assert_eq!(advanced.status, ScheduleStatus::Completed);
        assert_eq!(advanced.run_count, 1);

        let untouched = schedules.get(future.id).await.unwrap();
        assert_eq!(untouched.run_count, 0);
    }

    #[tokio::test]
    async fn test_insufficient_funds_fails_schedule_without_aborting_sweep() {
        let poor = UserId::new();
        let rich = UserId::new();
        let beneficiary = UserId::new();
        let (runner, wallet, schedules) = runner_with(&[
            (poor, Money::inr(dec!(10))),
            (rich, Money::inr(dec!(1000))),
            (beneficiary, Money::inr(dec!(0))),
        ])
        .await;

        let broke = once_schedule(poor, beneficiary, Money::inr(dec!(500)));
        let funded = once_schedule(rich, beneficiary, Money::inr(dec!(500)));
        schedules.create(&broke).await.unwrap();
        schedules.create(&funded).await.unwrap();

        let summary = runner.sweep(Utc::now()).await;
        assert_eq!(summary, SweepSummary { processed: 1, failed: 1 });

        use domain_ledger::WalletStore;
        assert_eq!(wallet.balance(beneficiary).await.unwrap().amount(), dec!(500));
        assert_eq!(wallet.balance(poor).await.unwrap().amount(), dec!(10));

        let failed = schedules.get(broke.id).await.unwrap();
        assert_eq!(failed.status, ScheduleStatus::Failed);

        // Failed schedules are excluded from the next sweep
        let next = runner.sweep(Utc::now()).await;
        assert_eq!(next, SweepSummary::default());
    }

    #[tokio::test]
    async fn test_recurring_schedule_advances_and_refires() {
        let owner = UserId::new();
        let beneficiary = UserId::new();
        let (runner, wallet, schedules) = runner_with(&[
            (owner, Money::inr(dec!(1000))),
            (beneficiary, Money::inr(dec!(0))),
        ])
        .await;

        let daily = ScheduledPayment::new(
            owner,
            beneficiary,
            Money::inr(dec!(100)),
            None,
            Frequency::Daily,
            Utc::now(),
            None,
        )
        .unwrap();
        schedules.create(&daily).await.unwrap();

        runner.sweep(Utc::now()).await;
        // Not due again today
        let today_again = runner.sweep(Utc::now()).await;
        assert_eq!(today_again, SweepSummary::default());

        // Due again tomorrow
        let tomorrow = Utc::now() + chrono::Duration::days(1);
        let summary = runner.sweep(tomorrow).await;
        assert_eq!(summary.processed, 1);

        use domain_ledger::WalletStore;
        assert_eq!(wallet.balance(beneficiary).await.unwrap().amount(), dec!(200));
    }
}
