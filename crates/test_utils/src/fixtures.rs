//! Canonical test fixtures

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Money, UserId};

/// Standard monetary amounts
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A comfortably funded wallet
    pub fn funded_balance() -> Money {
        Money::inr(dec!(10000))
    }

    /// An everyday transfer amount
    pub fn small_transfer() -> Money {
        Money::inr(dec!(250))
    }

    /// One minor unit over the default per-transaction cap
    pub fn over_per_transaction_cap() -> Money {
        Money::inr(dec!(10000.01))
    }

    /// An empty wallet
    pub fn zero() -> Money {
        Money::zero(Default::default())
    }
}

/// Standard instants
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed, deterministic "now" for date math tests
    pub fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
    }

    /// A month-end instant that exercises calendar clamping
    pub fn month_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
    }
}

/// Standard identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn user() -> UserId {
        UserId::new()
    }

    /// A pair of distinct users
    pub fn user_pair() -> (UserId, UserId) {
        (UserId::new(), UserId::new())
    }
}

/// Cheap key-stretching cost for suites; production uses the default
pub const TEST_PIN_COST: u32 = 4;
