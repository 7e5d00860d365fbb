//! Schedule Domain Ports

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{DomainPort, PortError, ScheduleId, UserId};

use crate::schedule::ScheduledPayment;

/// Port over scheduled payment persistence
///
/// The sweep query is the hot path; adapters index by `(status, next_run)`.
#[async_trait]
pub trait ScheduleStore: DomainPort {
    /// Persists a new schedule
    async fn create(&self, payment: &ScheduledPayment) -> Result<(), PortError>;

    /// Loads one schedule
    async fn get(&self, id: ScheduleId) -> Result<ScheduledPayment, PortError>;

    /// All schedules owned by the user, soonest first
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<ScheduledPayment>, PortError>;

    /// Persists lifecycle mutations (advance, fail, toggle)
    async fn update(&self, payment: &ScheduledPayment) -> Result<(), PortError>;

    /// Deletes a schedule owned by the user
    async fn delete(&self, id: ScheduleId, owner: UserId) -> Result<(), PortError>;

    /// Active schedules whose `next_run` is at or before `now`
    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledPayment>, PortError>;
}

/// In-memory mock implementation of ScheduleStore for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// In-memory schedule store
    #[derive(Debug, Default, Clone)]
    pub struct MemoryScheduleStore {
        schedules: Arc<Mutex<HashMap<ScheduleId, ScheduledPayment>>>,
    }

    impl MemoryScheduleStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemoryScheduleStore {}

    #[async_trait]
    impl ScheduleStore for MemoryScheduleStore {
        async fn create(&self, payment: &ScheduledPayment) -> Result<(), PortError> {
            let mut schedules = self.schedules.lock().await;
            if schedules.contains_key(&payment.id) {
                return Err(PortError::conflict(format!("Schedule {} exists", payment.id)));
            }
            schedules.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn get(&self, id: ScheduleId) -> Result<ScheduledPayment, PortError> {
            self.schedules
                .lock()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("ScheduledPayment", id))
        }

        async fn list_for_owner(
            &self,
            owner: UserId,
        ) -> Result<Vec<ScheduledPayment>, PortError> {
            let schedules = self.schedules.lock().await;
            let mut list: Vec<ScheduledPayment> = schedules
                .values()
                .filter(|s| s.owner == owner)
                .cloned()
                .collect();
            list.sort_by_key(|s| s.next_run);
            Ok(list)
        }

        async fn update(&self, payment: &ScheduledPayment) -> Result<(), PortError> {
            let mut schedules = self.schedules.lock().await;
            if !schedules.contains_key(&payment.id) {
                return Err(PortError::not_found("ScheduledPayment", payment.id));
            }
            schedules.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn delete(&self, id: ScheduleId, owner: UserId) -> Result<(), PortError> {
            let mut schedules = self.schedules.lock().await;
            match schedules.get(&id) {
                Some(s) if s.owner == owner => {
                    schedules.remove(&id);
                    Ok(())
                }
                _ => Err(PortError::not_found("ScheduledPayment", id)),
            }
        }

        async fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledPayment>, PortError> {
            let schedules = self.schedules.lock().await;
            let mut list: Vec<ScheduledPayment> = schedules
                .values()
                .filter(|s| s.is_due(now))
                .cloned()
                .collect();
            list.sort_by_key(|s| s.next_run);
            Ok(list)
        }
    }
}
