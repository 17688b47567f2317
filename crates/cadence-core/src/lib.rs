//! Dependency-light domain layer: recurrence rules, date windows, and
//! overlap classification, plus the shared error and configuration types.

pub mod config;
pub mod error;
pub mod overlap;
pub mod recurrence;
pub mod types;
