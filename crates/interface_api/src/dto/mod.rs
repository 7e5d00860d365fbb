//! Request/response data transfer objects

pub mod wallet;
pub mod security;
pub mod schedule;
pub mod workflows;
pub mod gateway;
