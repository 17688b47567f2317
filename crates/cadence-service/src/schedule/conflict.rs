//! Conflict assessment of a candidate time range against existing bookings
//! and availability instances.

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use cadence_core::overlap::{OverlapKind, classify, ranges_overlap};
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{booking, instance};
use cadence_db::model::booking::Booking;
use cadence_db::model::instance::CalendarInstance;

/// Classification of a candidate range plus the rows that drove it.
///
/// Overlap with availability is the expected case for booking requests, not
/// a conflict; only `WithBooking` blocks booking creation. Availability
/// creation itself never blocks on bookings.
#[derive(Debug)]
pub struct OverlapAssessment {
    pub kind: OverlapKind,
    pub conflicting_bookings: Vec<Booking>,
    pub overlapping_instances: Vec<CalendarInstance>,
}

/// ## Summary
/// Classifies `[start, end)` on `day` against the specialist's active
/// bookings and materialized instances. `exclude_booking` omits one booking
/// from consideration (re-scheduling an existing booking).
///
/// Bookings are read-only input here; this never mutates them.
///
/// ## Errors
/// Returns `ValidationError` when `end` is not after `start`, or a database
/// error when the lookups fail.
#[tracing::instrument(skip(conn))]
pub async fn assess_time_range(
    conn: &mut DbConnection<'_>,
    specialist_id: Uuid,
    day: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    exclude_booking: Option<Uuid>,
) -> ServiceResult<OverlapAssessment> {
    if end <= start {
        return Err(ServiceError::ValidationError(format!(
            "end time {end} must be after start time {start}"
        )));
    }

    let bookings: Vec<Booking> = booking::active_on_date(conn, specialist_id, day)
        .await?
        .into_iter()
        .filter(|b| exclude_booking != Some(b.id))
        .collect();
    let instances = instance::in_range(conn, specialist_id, day, day).await?;

    let booking_ranges: Vec<(NaiveTime, NaiveTime)> =
        bookings.iter().map(|b| (b.start_time, b.end_time)).collect();
    let instance_ranges: Vec<(NaiveTime, NaiveTime)> = instances
        .iter()
        .map(|i| (i.start_time, i.end_time))
        .collect();

    let kind = classify(start, end, &booking_ranges, &instance_ranges);

    let conflicting_bookings = bookings
        .into_iter()
        .filter(|b| ranges_overlap(start, end, b.start_time, b.end_time))
        .collect();
    let overlapping_instances = instances
        .into_iter()
        .filter(|i| ranges_overlap(start, end, i.start_time, i.end_time))
        .collect();

    tracing::debug!(kind = %kind, "Assessed candidate time range");

    Ok(OverlapAssessment {
        kind,
        conflicting_bookings,
        overlapping_instances,
    })
}
