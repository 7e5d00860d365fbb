//! Wallet account model
//!
//! One account per user, holding the current balance. The balance is only
//! ever mutated through the store's atomic primitives; this type is the
//! read-side representation plus the invariant checks shared by adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, UserId};

/// A user's wallet account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAccount {
    /// Owning user (one account per user)
    pub user_id: UserId,
    /// Current balance, never negative
    pub balance: Money,
    /// When the account was opened
    pub opened_at: DateTime<Utc>,
    /// Last balance mutation
    pub updated_at: DateTime<Utc>,
}

impl WalletAccount {
    /// Opens an account with the given balance
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owning user
    /// * `opening_balance` - Initial balance, must not be negative
    pub fn open(user_id: UserId, opening_balance: Money) -> Self {
        debug_assert!(!opening_balance.is_negative());
        let now = Utc::now();
        Self {
            user_id,
            balance: opening_balance,
            opened_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the balance covers the given amount
    pub fn can_cover(&self, amount: &Money) -> bool {
        self.balance.amount() >= amount.amount()
    }
}
