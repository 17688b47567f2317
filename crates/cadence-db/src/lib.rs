//! Persistence layer: diesel schema, row models, and query modules for
//! recurrence rules, calendar instances, and (read-only) bookings.

pub mod db;
pub mod error;
pub mod model;
