//! Read-only query composition for `booking`.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::BookingStatus;
use crate::db::schema::booking;
use crate::model::booking::Booking;

/// ## Summary
/// Returns the non-cancelled bookings of a specialist on one date, ordered
/// by start time.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn active_on_date(
    conn: &mut DbConnection<'_>,
    specialist_id: Uuid,
    day: NaiveDate,
) -> QueryResult<Vec<Booking>> {
    booking::table
        .filter(booking::specialist_id.eq(specialist_id))
        .filter(booking::date.eq(day))
        .filter(booking::status.ne(BookingStatus::Cancelled))
        .order(booking::start_time.asc())
        .select(Booking::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns the confirmed bookings of a specialist on one date. Used when
/// checking whether an availability edit uncovers committed bookings.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn confirmed_on_date(
    conn: &mut DbConnection<'_>,
    specialist_id: Uuid,
    day: NaiveDate,
) -> QueryResult<Vec<Booking>> {
    booking::table
        .filter(booking::specialist_id.eq(specialist_id))
        .filter(booking::date.eq(day))
        .filter(booking::status.eq(BookingStatus::Confirmed))
        .order(booking::start_time.asc())
        .select(Booking::as_select())
        .load(conn)
        .await
}
