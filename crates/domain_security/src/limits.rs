//! Velocity limit policy
//!
//! Per-transaction and daily transfer caps evaluated before a transfer
//! moves funds. The daily accumulator resets when the calendar date changes
//! in the business timezone - a date comparison, not an elapsed duration.
//!
//! The check is advisory at call time: two concurrent transfers can both
//! pass before either records its amount. That race is accepted; the caps
//! are a soft safety net, while balance integrity is enforced by the
//! ledger's conditional debit.

use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{BusinessTimezone, CoreError, Money};

/// Per-user transfer caps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLimits {
    /// Largest single transfer
    pub per_transaction: Money,
    /// Total transfers within one calendar day
    pub daily: Money,
    /// Configured monthly ceiling
    pub monthly: Money,
}

impl Default for TransactionLimits {
    fn default() -> Self {
        Self {
            per_transaction: Money::inr(dec!(10000)),
            daily: Money::inr(dec!(50000)),
            monthly: Money::inr(dec!(500000)),
        }
    }
}

impl TransactionLimits {
    /// Sanity-checks the cap ordering
    ///
    /// # Errors
    ///
    /// Returns error if per-transaction exceeds daily or daily exceeds monthly
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.per_transaction.amount() > self.daily.amount() {
            return Err(CoreError::validation(
                "Per-transaction limit cannot exceed the daily limit",
            ));
        }
        if self.daily.amount() > self.monthly.amount() {
            return Err(CoreError::validation(
                "Daily limit cannot exceed the monthly limit",
            ));
        }
        Ok(())
    }
}

/// Running total of transfers for the current calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTracker {
    /// Amount accumulated since the last reset
    pub spent: Money,
    /// When the accumulator last started over
    pub last_reset: DateTime<Utc>,
}

impl DailyTracker {
    /// Amount that counts against today's cap; zero if the tracker is stale
    pub fn effective_spent(&self, now: DateTime<Utc>, tz: BusinessTimezone) -> Money {
        if tz.same_local_date(self.last_reset, now) {
            self.spent
        } else {
            Money::zero(self.spent.currency())
        }
    }

    /// Reset-if-new-day-then-increment, as one step
    ///
    /// The persistent adapter performs this as a single conditional SQL
    /// statement; this pure form backs the in-memory adapter and tests.
    pub fn apply(tracker: Option<Self>, amount: Money, now: DateTime<Utc>, tz: BusinessTimezone) -> Self {
        match tracker {
            Some(t) if tz.same_local_date(t.last_reset, now) => Self {
                spent: t.spent + amount,
                last_reset: t.last_reset,
            },
            _ => Self {
                spent: amount,
                last_reset: now,
            },
        }
    }
}

/// Why a transfer was rejected by the limit policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitBreach {
    /// Amount exceeds the single-transfer cap
    PerTransaction { cap: Money },
    /// Amount would push today's total past the daily cap
    Daily { remaining: Money },
}

impl fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitBreach::PerTransaction { cap } => {
                write!(f, "Amount exceeds per-transaction limit of {cap}")
            }
            LimitBreach::Daily { remaining } => {
                write!(f, "Amount exceeds daily limit. Remaining: {remaining}")
            }
        }
    }
}

/// Result of a limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitDecision {
    Allowed,
    Rejected(LimitBreach),
}

impl LimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LimitDecision::Allowed)
    }
}

/// Evaluates a proposed transfer against the caps
///
/// Checks in order: per-transaction cap, then the daily cap against the
/// effective accumulated amount (zero if the tracker's reset date is not
/// today in the business timezone).
///
/// # Arguments
///
/// * `limits` - The user's caps
/// * `tracker` - The user's daily accumulator, if any transfers happened before
/// * `amount` - The proposed transfer amount
/// * `now` - Evaluation instant
/// * `tz` - Business timezone for the day boundary
pub fn check_limits(
    limits: &TransactionLimits,
    tracker: Option<&DailyTracker>,
    amount: Money,
    now: DateTime<Utc>,
    tz: BusinessTimezone,
) -> LimitDecision {
    if amount.amount() > limits.per_transaction.amount() {
        return LimitDecision::Rejected(LimitBreach::PerTransaction {
            cap: limits.per_transaction,
        });
    }

    let spent_today = tracker
        .map(|t| t.effective_spent(now, tz))
        .unwrap_or_else(|| Money::zero(amount.currency()));

    if spent_today.amount() + amount.amount() > limits.daily.amount() {
        let remaining = Money::new(
            limits.daily.amount() - spent_today.amount(),
            limits.daily.currency(),
        );
        return LimitDecision::Rejected(LimitBreach::Daily { remaining });
    }

    LimitDecision::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn tz() -> BusinessTimezone {
        BusinessTimezone::default()
    }

    #[test]
    fn test_default_caps() {
        let limits = TransactionLimits::default();
        assert_eq!(limits.per_transaction.amount(), dec!(10000));
        assert_eq!(limits.daily.amount(), dec!(50000));
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_caps() {
        let limits = TransactionLimits {
            per_transaction: Money::inr(dec!(60000)),
            ..Default::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_per_transaction_cap_rejected_regardless_of_daily_headroom() {
        let limits = TransactionLimits::default();
        let decision = check_limits(&limits, None, Money::inr(dec!(10001)), Utc::now(), tz());
        assert_eq!(
            decision,
            LimitDecision::Rejected(LimitBreach::PerTransaction {
                cap: Money::inr(dec!(10000))
            })
        );
    }

    #[test]
    fn test_daily_cap_counts_accumulated_amount() {
        let limits = TransactionLimits::default();
        let now = Utc::now();
        let tracker = DailyTracker {
            spent: Money::inr(dec!(45000)),
            last_reset: now,
        };

        let decision = check_limits(&limits, Some(&tracker), Money::inr(dec!(6000)), now, tz());
        assert_eq!(
            decision,
            LimitDecision::Rejected(LimitBreach::Daily {
                remaining: Money::inr(dec!(5000))
            })
        );

        let allowed = check_limits(&limits, Some(&tracker), Money::inr(dec!(5000)), now, tz());
        assert!(allowed.is_allowed());
    }

    #[test]
    fn test_stale_tracker_does_not_count() {
        let limits = TransactionLimits::default();
        let now = Utc::now();
        let tracker = DailyTracker {
            spent: Money::inr(dec!(50000)),
            last_reset: now - Duration::days(1),
        };

        let decision = check_limits(&limits, Some(&tracker), Money::inr(dec!(10000)), now, tz());
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_apply_accumulates_same_day() {
        let now = Utc::now();
        let first = DailyTracker::apply(None, Money::inr(dec!(100)), now, tz());
        let second = DailyTracker::apply(Some(first), Money::inr(dec!(250)), now, tz());
        assert_eq!(second.spent.amount(), dec!(350));
    }

    #[test]
    fn test_apply_resets_on_new_day() {
        let yesterday = Utc::now() - Duration::days(1);
        let now = Utc::now();
        let stale = DailyTracker {
            spent: Money::inr(dec!(40000)),
            last_reset: yesterday,
        };

        let fresh = DailyTracker::apply(Some(stale), Money::inr(dec!(500)), now, tz());
        assert_eq!(fresh.spent.amount(), dec!(500));
        assert_eq!(fresh.last_reset, now);
    }

    #[test]
    fn test_breach_messages_are_actionable() {
        let per = LimitBreach::PerTransaction { cap: Money::inr(dec!(10000)) };
        assert_eq!(per.to_string(), "Amount exceeds per-transaction limit of ₹10000.00");

        let daily = LimitBreach::Daily { remaining: Money::inr(dec!(5000)) };
        assert_eq!(daily.to_string(), "Amount exceeds daily limit. Remaining: ₹5000.00");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Anything above the per-transaction cap is rejected no matter how
        /// much daily headroom remains.
        #[test]
        fn per_transaction_cap_is_absolute(excess in 1i64..1_000_000i64) {
            let limits = TransactionLimits::default();
            let amount = Money::inr(limits.per_transaction.amount() + rust_decimal::Decimal::new(excess, 2));
            let decision = check_limits(&limits, None, amount, Utc::now(), BusinessTimezone::default());
            prop_assert!(!decision.is_allowed());
        }

        /// Accumulation never allows crossing the daily cap within one day.
        #[test]
        fn daily_cap_never_crossed(amounts in proptest::collection::vec(1i64..2_000_000i64, 1..20)) {
            let limits = TransactionLimits::default();
            let tz = BusinessTimezone::default();
            let now = Utc::now();
            let mut tracker: Option<DailyTracker> = None;

            for minor in amounts {
                let amount = Money::from_minor(minor, core_kernel::Currency::INR);
                if check_limits(&limits, tracker.as_ref(), amount, now, tz).is_allowed() {
                    tracker = Some(DailyTracker::apply(tracker, amount, now, tz));
                }
            }

            if let Some(t) = tracker {
                prop_assert!(t.spent.amount() <= limits.daily.amount());
            }
        }
    }
}
