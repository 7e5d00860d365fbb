//! Security Domain Ports
//!
//! Persistence seam for PIN records, limits, the daily tracker, and audit
//! events. The PIN counter and daily tracker are the only mutations in the
//! system allowed outside a transfer's atomic unit; both are monotonic, so
//! a duplicated write on a retry is a bounded degradation rather than a
//! correctness violation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{DomainPort, Money, PortError, UserId};

use crate::audit::AuditEvent;
use crate::limits::{DailyTracker, TransactionLimits};
use crate::pin::PinRecord;

/// Port over PIN, limit, tracker, and audit persistence
#[async_trait]
pub trait SecurityStore: DomainPort {
    /// Loads the user's PIN record, if one was ever set
    async fn pin_record(&self, user: UserId) -> Result<Option<PinRecord>, PortError>;

    /// Persists the user's PIN record (set, counter update, lock, rotate)
    async fn save_pin_record(&self, user: UserId, record: &PinRecord) -> Result<(), PortError>;

    /// The user's caps; defaults apply when none were customized
    async fn limits(&self, user: UserId) -> Result<TransactionLimits, PortError>;

    /// The user's daily accumulator, if any transfer was recorded before
    async fn daily_tracker(&self, user: UserId) -> Result<Option<DailyTracker>, PortError>;

    /// Records a committed transfer against the daily cap
    ///
    /// Implementations must perform reset-if-new-day-then-increment as a
    /// single atomic step against their backing store, never as a separate
    /// read followed by a write.
    async fn record_daily_transfer(
        &self,
        user: UserId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), PortError>;

    /// Appends an audit event (best-effort at the call site)
    async fn record_audit(&self, event: AuditEvent) -> Result<(), PortError>;
}

/// In-memory mock implementation of SecurityStore for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::BusinessTimezone;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct State {
        pins: HashMap<UserId, PinRecord>,
        limits: HashMap<UserId, TransactionLimits>,
        trackers: HashMap<UserId, DailyTracker>,
        audit: Vec<AuditEvent>,
    }

    /// In-memory security store
    #[derive(Debug, Default, Clone)]
    pub struct MemorySecurityStore {
        state: Arc<Mutex<State>>,
        timezone: BusinessTimezone,
    }

    impl MemorySecurityStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets custom limits for a user
        pub async fn set_limits(&self, user: UserId, limits: TransactionLimits) {
            self.state.lock().await.limits.insert(user, limits);
        }

        /// Backdates the tracker (calendar rollover tests)
        pub async fn set_tracker(&self, user: UserId, tracker: DailyTracker) {
            self.state.lock().await.trackers.insert(user, tracker);
        }

        /// Snapshot of recorded audit events
        pub async fn audit_events(&self) -> Vec<AuditEvent> {
            self.state.lock().await.audit.clone()
        }
    }

    impl DomainPort for MemorySecurityStore {}

    #[async_trait]
    impl SecurityStore for MemorySecurityStore {
        async fn pin_record(&self, user: UserId) -> Result<Option<PinRecord>, PortError> {
            Ok(self.state.lock().await.pins.get(&user).cloned())
        }

        async fn save_pin_record(
            &self,
            user: UserId,
            record: &PinRecord,
        ) -> Result<(), PortError> {
            self.state.lock().await.pins.insert(user, record.clone());
            Ok(())
        }

        async fn limits(&self, user: UserId) -> Result<TransactionLimits, PortError> {
            Ok(self
                .state
                .lock()
                .await
                .limits
                .get(&user)
                .cloned()
                .unwrap_or_default())
        }

        async fn daily_tracker(&self, user: UserId) -> Result<Option<DailyTracker>, PortError> {
            Ok(self.state.lock().await.trackers.get(&user).cloned())
        }

        async fn record_daily_transfer(
            &self,
            user: UserId,
            amount: Money,
            now: DateTime<Utc>,
        ) -> Result<(), PortError> {
            let mut state = self.state.lock().await;
            let next = DailyTracker::apply(state.trackers.remove(&user), amount, now, self.timezone);
            state.trackers.insert(user, next);
            Ok(())
        }

        async fn record_audit(&self, event: AuditEvent) -> Result<(), PortError> {
            self.state.lock().await.audit.push(event);
            Ok(())
        }
    }
}
