//! Repository implementations of the domain ports

pub mod wallet;
pub mod security;
pub mod schedule;
pub mod workflows;
pub mod gateway;
