//! Ledger entry model
//!
//! Every balance-affecting event is recorded as exactly one immutable
//! [`LedgerEntry`]. The parties involved are carried by a tagged union per
//! transaction kind, so an entry can never be in an invalid shape (a
//! deposit with a source user, a transfer without a target, and so on).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{EntryId, Money, UserId};

/// External rail used to move money in or out of the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Internal wallet-to-wallet movement
    Wallet,
    /// UPI collect/intent
    Upi,
    /// Debit/credit card
    Card,
    /// Net banking
    NetBanking,
    /// Bank transfer (payouts)
    BankTransfer,
}

impl PaymentMethod {
    /// Returns the wire label used in persistence and APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
            PaymentMethod::NetBanking => "net_banking",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

/// Entry status
///
/// `Processing` is reserved for provider payouts awaiting asynchronous
/// settlement; everything else commits as `Completed` or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// The parties of a ledger entry, tagged by transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    /// Wallet-to-wallet movement between two users
    Transfer { from: UserId, to: UserId },
    /// Money entering the wallet from an external rail
    Deposit { to: UserId, method: PaymentMethod },
    /// Money leaving the wallet to an external rail
    Withdrawal { from: UserId, method: PaymentMethod },
}

impl EntryKind {
    /// Returns the user whose balance is decremented, if any
    pub fn debited(&self) -> Option<UserId> {
        match self {
            EntryKind::Transfer { from, .. } => Some(*from),
            EntryKind::Withdrawal { from, .. } => Some(*from),
            EntryKind::Deposit { .. } => None,
        }
    }

    /// Returns the user whose balance is incremented, if any
    pub fn credited(&self) -> Option<UserId> {
        match self {
            EntryKind::Transfer { to, .. } => Some(*to),
            EntryKind::Deposit { to, .. } => Some(*to),
            EntryKind::Withdrawal { .. } => None,
        }
    }

    /// Returns true if the entry involves the given user on either side
    pub fn involves(&self, user: UserId) -> bool {
        self.debited() == Some(user) || self.credited() == Some(user)
    }

    /// Returns the wire label for the kind
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Transfer { .. } => "transfer",
            EntryKind::Deposit { .. } => "deposit",
            EntryKind::Withdrawal { .. } => "withdrawal",
        }
    }
}

/// An immutable record of one balance-affecting event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier
    pub id: EntryId,
    /// Parties and transaction kind
    pub kind: EntryKind,
    /// Amount moved (always positive)
    pub amount: Money,
    /// Status
    pub status: EntryStatus,
    /// Human-readable description
    pub description: String,
    /// Provider/idempotency reference, unique when present
    pub reference: Option<String>,
    /// When the entry was committed
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed amount from the given user's point of view
    /// (negative for money leaving their wallet)
    pub fn signed_amount(&self, user: UserId) -> Money {
        if self.kind.debited() == Some(user) {
            -self.amount
        } else {
            self.amount
        }
    }
}

/// The command handed to the store's atomic unit
///
/// One posting produces at most one conditional debit, at most one credit,
/// and exactly one ledger entry, committed together.
#[derive(Debug, Clone)]
pub struct LedgerPosting {
    pub kind: EntryKind,
    pub amount: Money,
    pub status: EntryStatus,
    pub description: String,
    pub reference: Option<String>,
}

impl LedgerPosting {
    /// A completed wallet-to-wallet transfer
    pub fn transfer(from: UserId, to: UserId, amount: Money, description: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Transfer { from, to },
            amount,
            status: EntryStatus::Completed,
            description: description.into(),
            reference: None,
        }
    }

    /// A completed external deposit
    pub fn deposit(to: UserId, amount: Money, method: PaymentMethod, description: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Deposit { to, method },
            amount,
            status: EntryStatus::Completed,
            description: description.into(),
            reference: None,
        }
    }

    /// An external withdrawal; `status` distinguishes direct withdrawals
    /// (completed) from provider payouts (processing until the webhook)
    pub fn withdrawal(
        from: UserId,
        amount: Money,
        method: PaymentMethod,
        status: EntryStatus,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: EntryKind::Withdrawal { from, method },
            amount,
            status,
            description: description.into(),
            reference: None,
        }
    }

    /// Attaches an idempotency reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Settlement outcome reported by the payment provider for a payout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutSettlement {
    /// Provider confirmed the payout; entry flips to completed
    Processed,
    /// Provider reported failure; entry flips to failed and the debit is
    /// credited back in the same atomic unit
    Failed,
}

/// Direction of entries relative to the querying user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    Outgoing,
    Incoming,
}

/// History/statement query filters; results are newest-first
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Restrict to one direction relative to the user
    pub direction: Option<EntryDirection>,
    /// Restrict to one status
    pub status: Option<EntryStatus>,
    /// Inclusive start of the date range
    pub since: Option<DateTime<Utc>>,
    /// Inclusive end of the date range
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of entries to return
    pub limit: Option<u32>,
}

impl EntryFilter {
    /// Most recent entries, bounded
    pub fn recent(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Completed entries in a date range (statements, analytics)
    pub fn completed_between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            status: Some(EntryStatus::Completed),
            since: Some(since),
            until: Some(until),
            ..Default::default()
        }
    }

    /// Returns true if an entry matches this filter from `user`'s view
    pub fn matches(&self, entry: &LedgerEntry, user: UserId) -> bool {
        if !entry.kind.involves(user) {
            return false;
        }
        if let Some(direction) = self.direction {
            let outgoing = entry.kind.debited() == Some(user);
            match direction {
                EntryDirection::Outgoing if !outgoing => return false,
                EntryDirection::Incoming if outgoing => return false,
                _ => {}
            }
        }
        if let Some(status) = self.status {
            if entry.status != status {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.created_at > until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(kind: EntryKind) -> LedgerEntry {
        LedgerEntry {
            id: EntryId::new_v7(),
            kind,
            amount: Money::inr(dec!(100)),
            status: EntryStatus::Completed,
            description: "test".to_string(),
            reference: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_transfer_parties() {
        let from = UserId::new();
        let to = UserId::new();
        let kind = EntryKind::Transfer { from, to };

        assert_eq!(kind.debited(), Some(from));
        assert_eq!(kind.credited(), Some(to));
        assert!(kind.involves(from));
        assert!(kind.involves(to));
        assert!(!kind.involves(UserId::new()));
    }

    #[test]
    fn test_deposit_has_no_debit_side() {
        let to = UserId::new();
        let kind = EntryKind::Deposit { to, method: PaymentMethod::Upi };

        assert_eq!(kind.debited(), None);
        assert_eq!(kind.credited(), Some(to));
    }

    #[test]
    fn test_signed_amount() {
        let from = UserId::new();
        let to = UserId::new();
        let e = entry(EntryKind::Transfer { from, to });

        assert!(e.signed_amount(from).is_negative());
        assert!(e.signed_amount(to).is_positive());
    }

    #[test]
    fn test_filter_direction() {
        let from = UserId::new();
        let to = UserId::new();
        let e = entry(EntryKind::Transfer { from, to });

        let outgoing = EntryFilter {
            direction: Some(EntryDirection::Outgoing),
            ..Default::default()
        };
        assert!(outgoing.matches(&e, from));
        assert!(!outgoing.matches(&e, to));
    }

    #[test]
    fn test_filter_status_and_range() {
        let from = UserId::new();
        let to = UserId::new();
        let e = entry(EntryKind::Transfer { from, to });

        let mut filter = EntryFilter::default();
        filter.status = Some(EntryStatus::Failed);
        assert!(!filter.matches(&e, from));

        let old = EntryFilter {
            until: Some(Utc::now() - chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(!old.matches(&e, from));
    }
}
