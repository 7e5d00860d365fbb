//! Request handlers

pub mod health;
pub mod wallet;
pub mod security;
pub mod schedule;
pub mod workflows;
pub mod gateway;
