use diesel::{pg::Pg, prelude::*};

use crate::db::{enums::BookingStatus, schema};

/// A consumer booking. Written by the surrounding booking flow; the
/// scheduling core only reads bookings as conflict-check input.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::booking)]
pub struct Booking {
    pub id: uuid::Uuid,
    pub specialist_id: uuid::Uuid,
    pub date: chrono::NaiveDate,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub status: BookingStatus,
}
