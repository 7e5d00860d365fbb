//! Core Kernel - Foundational types and utilities for the wallet system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Calendar and timezone helpers for day-boundary and schedule math
//! - Common identifiers and value objects
//! - Port infrastructure for the hexagonal architecture

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{BusinessTimezone, add_months_clamped, add_days};
pub use identifiers::{
    UserId, EntryId, ScheduleId, RequestId, BillId, BeneficiaryId, AuditEventId,
};
pub use ports::{PortError, DomainPort};
pub use error::CoreError;
