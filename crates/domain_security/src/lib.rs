//! Security Domain - PIN guard, velocity limits, and audit trail
//!
//! Everything that stands between a caller and a balance mutation lives
//! here: the failure-counted transaction PIN gate, the per-transaction and
//! daily transfer caps with their calendar-day reset, and the best-effort
//! audit trail of sensitive operations.
//!
//! The PIN guard is a small state machine per user:
//!
//! ```text
//! NoPin ──set──> PinSet(failures = 0) ──3 misses──> Locked(until)
//!                     ▲                                  │
//!                     └──────── lock expiry (lazy) ──────┘
//! ```

pub mod pin;
pub mod limits;
pub mod audit;
pub mod ports;
pub mod error;

pub use pin::{PinHash, PinManager, PinRecord, PinStatus, PinVerdict, LOCK_DURATION_MINUTES, MAX_FAILED_ATTEMPTS};
pub use limits::{check_limits, DailyTracker, LimitBreach, LimitDecision, TransactionLimits};
pub use audit::{AuditAction, AuditEvent, AuditOutcome};
pub use ports::SecurityStore;
pub use error::SecurityError;
