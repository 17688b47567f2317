//! Orchestration layer: recurrence expansion, instance materialization,
//! instance queries and mutations, conflict assessment, and the horizon
//! extension sweep.

pub mod error;
pub mod schedule;
