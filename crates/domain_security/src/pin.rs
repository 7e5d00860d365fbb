//! Transaction PIN guard
//!
//! A secondary authorization gate in front of money movement. PINs are
//! stored as salted, cost-factored digests; verification never touches the
//! digest while the record is locked, and lock expiry is checked lazily on
//! each attempt rather than by a background job.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use core_kernel::UserId;

use crate::error::SecurityError;
use crate::ports::SecurityStore;

/// Consecutive failures that trigger a lockout
pub const MAX_FAILED_ATTEMPTS: u32 = 3;

/// Lockout window once the failure budget is exhausted
pub const LOCK_DURATION_MINUTES: i64 = 30;

/// Default key-stretching rounds for new PINs
pub const DEFAULT_PIN_COST: u32 = 1 << 14;

const SALT_LEN: usize = 16;

/// A salted, iterated PIN digest
///
/// Encoded as `pin$<rounds>$<salt-hex>$<digest-hex>` so the cost factor can
/// be raised later without invalidating existing records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinHash(String);

impl PinHash {
    /// Derives a hash from a plaintext PIN with the given cost
    ///
    /// # Arguments
    ///
    /// * `pin` - The plaintext PIN (already format-validated)
    /// * `rounds` - Key-stretching iterations
    pub fn derive(pin: &str, rounds: u32) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = stretch(pin.as_bytes(), &salt, rounds);
        Self(format!(
            "pin${}${}${}",
            rounds,
            hex::encode(salt),
            hex::encode(digest)
        ))
    }

    /// Verifies a plaintext PIN against this hash in constant time
    pub fn verify(&self, pin: &str) -> bool {
        let mut parts = self.0.split('$');
        let (Some("pin"), Some(rounds), Some(salt), Some(digest)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let Ok(rounds) = rounds.parse::<u32>() else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(digest)) else {
            return false;
        };

        let actual = stretch(pin.as_bytes(), &salt, rounds);
        constant_time_eq(&actual, &expected)
    }

    /// Returns the encoded form for persistence
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an already-encoded hash loaded from storage
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }
}

fn stretch(pin: &[u8], salt: &[u8], rounds: u32) -> [u8; 32] {
    let mut digest = [0u8; 32];
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(pin);
    digest.copy_from_slice(&hasher.finalize());

    for _ in 1..rounds.max(1) {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        hasher.update(salt);
        digest.copy_from_slice(&hasher.finalize());
    }
    digest
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Validates the PIN wire format: exactly four ASCII digits
pub fn validate_pin_format(pin: &str) -> Result<(), SecurityError> {
    if pin.len() != 4 || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SecurityError::InvalidPinFormat);
    }
    Ok(())
}

/// Outcome of one verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinVerdict {
    /// PIN matched; failure counter was reset
    Approved,
    /// Record was already locked; the PIN was not inspected
    Locked { minutes_remaining: i64 },
    /// This miss exhausted the failure budget and started the lock
    LockedNow { minutes_remaining: i64 },
    /// PIN mismatch with attempts still remaining
    Rejected { attempts_remaining: u32 },
}

/// Per-user PIN state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinRecord {
    /// Salted digest
    pub hash: PinHash,
    /// Consecutive failed attempts since the last success
    pub failed_attempts: u32,
    /// Lockout expiry, if a lock is in effect
    pub locked_until: Option<DateTime<Utc>>,
}

impl PinRecord {
    /// Creates a fresh record for a newly set PIN
    pub fn new(hash: PinHash) -> Self {
        Self {
            hash,
            failed_attempts: 0,
            locked_until: None,
        }
    }

    /// Returns true if a lock is in effect at `now`
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Whole minutes until the lock expires, rounded up
    pub fn minutes_until_unlock(&self, now: DateTime<Utc>) -> i64 {
        self.locked_until
            .map(|until| {
                let secs = (until - now).num_seconds().max(0);
                (secs + 59) / 60
            })
            .unwrap_or(0)
    }

    /// Runs one verification attempt, updating the failure counter and lock
    ///
    /// The caller must persist the record afterwards regardless of the
    /// verdict; the counter mutations are deliberately monotonic so a
    /// double-write on retry degrades safely.
    pub fn verify(&mut self, pin: &str, now: DateTime<Utc>) -> PinVerdict {
        if self.is_locked(now) {
            return PinVerdict::Locked {
                minutes_remaining: self.minutes_until_unlock(now),
            };
        }

        if self.hash.verify(pin) {
            self.failed_attempts = 0;
            self.locked_until = None;
            return PinVerdict::Approved;
        }

        self.failed_attempts += 1;
        if self.failed_attempts >= MAX_FAILED_ATTEMPTS {
            self.locked_until = Some(now + Duration::minutes(LOCK_DURATION_MINUTES));
            PinVerdict::LockedNow {
                minutes_remaining: LOCK_DURATION_MINUTES,
            }
        } else {
            PinVerdict::Rejected {
                attempts_remaining: MAX_FAILED_ATTEMPTS - self.failed_attempts,
            }
        }
    }

    /// Replaces the hash and clears all failure state
    pub fn rotate(&mut self, hash: PinHash) {
        self.hash = hash;
        self.failed_attempts = 0;
        self.locked_until = None;
    }
}

/// Summary of a user's PIN state for status endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinStatus {
    pub is_set: bool,
    pub is_locked: bool,
}

/// Set/change/reset operations over the security store
#[derive(Clone)]
pub struct PinManager {
    store: Arc<dyn SecurityStore>,
    cost: u32,
}

impl PinManager {
    /// Creates a manager with the default cost factor
    pub fn new(store: Arc<dyn SecurityStore>) -> Self {
        Self {
            store,
            cost: DEFAULT_PIN_COST,
        }
    }

    /// Overrides the key-stretching cost (lower for test suites)
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Reports whether the user has a PIN and whether it is locked
    pub async fn status(&self, user: UserId) -> Result<PinStatus, SecurityError> {
        let record = self.store.pin_record(user).await?;
        let now = Utc::now();
        Ok(PinStatus {
            is_set: record.is_some(),
            is_locked: record.map(|r| r.is_locked(now)).unwrap_or(false),
        })
    }

    /// Sets the PIN for the first time
    ///
    /// # Errors
    ///
    /// Rejects malformed PINs and users who already have one set.
    pub async fn set(&self, user: UserId, pin: &str) -> Result<(), SecurityError> {
        validate_pin_format(pin)?;
        if self.store.pin_record(user).await?.is_some() {
            return Err(SecurityError::PinAlreadySet);
        }
        let record = PinRecord::new(PinHash::derive(pin, self.cost));
        self.store.save_pin_record(user, &record).await?;
        Ok(())
    }

    /// Changes the PIN after verifying the current one
    pub async fn change(&self, user: UserId, current: &str, new: &str) -> Result<(), SecurityError> {
        validate_pin_format(new)?;
        let mut record = self
            .store
            .pin_record(user)
            .await?
            .ok_or(SecurityError::PinNotSet)?;

        match record.verify(current, Utc::now()) {
            PinVerdict::Approved => {
                record.rotate(PinHash::derive(new, self.cost));
                self.store.save_pin_record(user, &record).await?;
                Ok(())
            }
            verdict => {
                // Misses against the change flow still count toward lockout
                self.store.save_pin_record(user, &record).await?;
                Err(SecurityError::from_verdict(verdict))
            }
        }
    }

    /// Resets the PIN without the current one
    ///
    /// The caller is responsible for having re-authenticated the user
    /// through the identity provider. Clears failures and any lock.
    pub async fn reset(&self, user: UserId, new: &str) -> Result<(), SecurityError> {
        validate_pin_format(new)?;
        let record = PinRecord::new(PinHash::derive(new, self.cost));
        self.store.save_pin_record(user, &record).await?;
        Ok(())
    }
}
