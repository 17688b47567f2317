//! Database enum types with Diesel serialization.
//!
//! This module provides type-safe enum wrappers for database CHECK constraints.
//! Each enum implements `ToSql` and `FromSql` for automatic conversion between Rust and `PostgreSQL`.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

/// Recurrence kind of a rule.
///
/// Maps to the `recurrence_rule.kind` CHECK constraint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
pub enum RecurrenceKind {
    Weekly,
    Daily,
}

impl ToSql<Text, Pg> for RecurrenceKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for RecurrenceKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"weekly" => Ok(Self::Weekly),
            b"daily" => Ok(Self::Daily),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl RecurrenceKind {
    /// Returns the database string representation of this recurrence kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<cadence_core::types::RecurrenceKind> for RecurrenceKind {
    fn from(kind: cadence_core::types::RecurrenceKind) -> Self {
        match kind {
            cadence_core::types::RecurrenceKind::Weekly => Self::Weekly,
            cadence_core::types::RecurrenceKind::Daily => Self::Daily,
        }
    }
}

impl From<RecurrenceKind> for cadence_core::types::RecurrenceKind {
    fn from(kind: RecurrenceKind) -> Self {
        match kind {
            RecurrenceKind::Weekly => Self::Weekly,
            RecurrenceKind::Daily => Self::Daily,
        }
    }
}

/// Booking lifecycle state.
///
/// Maps to the `booking.status` CHECK constraint. Bookings are written by
/// the surrounding booking flow; this crate only reads them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ToSql<Text, Pg> for BookingStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for BookingStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"pending" => Ok(Self::Pending),
            b"confirmed" => Ok(Self::Confirmed),
            b"cancelled" => Ok(Self::Cancelled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl BookingStatus {
    /// Returns the database string representation of this booking status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Cancelled bookings never participate in conflict checks.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurrence_kind_round_trips_through_core() {
        for kind in [RecurrenceKind::Weekly, RecurrenceKind::Daily] {
            let core: cadence_core::types::RecurrenceKind = kind.into();
            assert_eq!(RecurrenceKind::from(core), kind);
            assert_eq!(core.as_str(), kind.as_str());
        }
    }

    #[test]
    fn cancelled_bookings_are_inactive() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
    }
}
