//! Schedule Domain - Recurring payments
//!
//! Users schedule transfers to a beneficiary at a fixed cadence; a
//! periodic sweep re-invokes the transfer orchestrator for every due
//! schedule and advances or retires each one. Schedules are durable: the
//! sweep is driven entirely by the persisted `next_run`, so a process
//! restart picks up exactly where it left off with a catch-up sweep.

pub mod schedule;
pub mod runner;
pub mod ports;
pub mod error;

pub use schedule::{Frequency, ScheduleStatus, ScheduledPayment};
pub use runner::{ScheduleRunner, SweepSummary};
pub use ports::ScheduleStore;
pub use error::ScheduleError;
