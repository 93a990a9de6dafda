//! Data models for contract records, payment schedules, and configuration.

pub mod config;
pub mod record;
pub mod schedule;
