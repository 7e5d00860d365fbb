//! Scheduled payment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{add_days, add_months_clamped, Money, ScheduleId, UserId};

use crate::error::ScheduleError;

/// How often a schedule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// The next fire time after `from`, or None for one-shot schedules
    ///
    /// Advances by whole calendar units: a monthly schedule created on the
    /// 31st clamps to shorter months rather than drifting.
    pub fn advance(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Frequency::Once => None,
            Frequency::Daily => Some(add_days(from, 1)),
            Frequency::Weekly => Some(add_days(from, 7)),
            Frequency::Monthly => Some(add_months_clamped(from, 1)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Once => "once",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

/// Lifecycle state of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Eligible for the sweep
    Active,
    /// Suspended by the owner
    Paused,
    /// Ran to the end of its life
    Completed,
    /// A run failed; the owner must reactivate
    Failed,
}

/// A recurring payment from an owner to a beneficiary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub id: ScheduleId,
    pub owner: UserId,
    pub beneficiary: UserId,
    pub amount: Money,
    pub description: String,
    pub frequency: Frequency,
    /// When the schedule next fires; the sweep key
    pub next_run: DateTime<Utc>,
    /// Last fire time after which the schedule retires
    pub end_date: Option<DateTime<Utc>>,
    pub status: ScheduleStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ScheduledPayment {
    /// Creates an active schedule
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts, self-payments, and end dates that
    /// precede the first run.
    pub fn new(
        owner: UserId,
        beneficiary: UserId,
        amount: Money,
        description: Option<String>,
        frequency: Frequency,
        next_run: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ScheduleError> {
        if !amount.is_positive() {
            return Err(ScheduleError::InvalidAmount);
        }
        if owner == beneficiary {
            return Err(ScheduleError::SelfPayment);
        }
        if let Some(end) = end_date {
            if end < next_run {
                return Err(ScheduleError::EndBeforeStart);
            }
        }

        Ok(Self {
            id: ScheduleId::new_v7(),
            owner,
            beneficiary,
            amount,
            description: description.unwrap_or_else(|| "Scheduled payment".to_string()),
            frequency,
            next_run,
            end_date,
            status: ScheduleStatus::Active,
            last_run: None,
            run_count: 0,
            created_at: Utc::now(),
        })
    }

    /// Returns true if the sweep should fire this schedule at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ScheduleStatus::Active && self.next_run <= now
    }

    /// Advances the schedule after a successful run
    ///
    /// One-shot schedules complete; recurring schedules advance `next_run`
    /// by one calendar unit, completing instead when the advance passes
    /// `end_date`.
    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
        self.run_count += 1;

        match self.frequency.advance(self.next_run) {
            None => self.status = ScheduleStatus::Completed,
            Some(next) => {
                if self.end_date.is_some_and(|end| next > end) {
                    self.status = ScheduleStatus::Completed;
                } else {
                    self.next_run = next;
                }
            }
        }
    }

    /// Marks the schedule failed; excluded from sweeps until reactivated
    pub fn record_failure(&mut self) {
        self.status = ScheduleStatus::Failed;
    }

    /// Flips between active and paused
    ///
    /// # Errors
    ///
    /// Completed and failed schedules cannot be toggled; failed ones go
    /// through [`reactivate`](Self::reactivate).
    pub fn toggle(&mut self) -> Result<ScheduleStatus, ScheduleError> {
        self.status = match self.status {
            ScheduleStatus::Active => ScheduleStatus::Paused,
            ScheduleStatus::Paused => ScheduleStatus::Active,
            other => {
                return Err(ScheduleError::InvalidState(format!(
                    "Cannot toggle a {other:?} schedule"
                )))
            }
        };
        Ok(self.status)
    }

    /// Puts a failed schedule back into rotation at the given next run
    pub fn reactivate(&mut self, next_run: DateTime<Utc>) -> Result<(), ScheduleError> {
        if self.status != ScheduleStatus::Failed {
            return Err(ScheduleError::InvalidState(
                "Only failed schedules can be reactivated".to_string(),
            ));
        }
        self.status = ScheduleStatus::Active;
        self.next_run = next_run;
        Ok(())
    }
}
