//! Single-instance mutations and whole-series deletion.

use chrono::NaiveTime;
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use cadence_core::overlap::covers;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{booking, instance, rule};
use cadence_db::model::booking::Booking;
use cadence_db::model::instance::CalendarInstance;

/// Result of an instance time edit. `uncovered_bookings` lists confirmed
/// bookings the old range covered that the new range no longer does; they
/// are a warning for the caller, never auto-modified.
#[derive(Debug)]
pub struct InstanceUpdate {
    pub instance: CalendarInstance,
    pub uncovered_bookings: Vec<Booking>,
}

/// Result of a series deletion.
#[derive(Debug, Clone, Copy)]
pub struct SeriesDeleted {
    pub deleted_count: usize,
}

/// ## Summary
/// Rewrites one instance's time range. The instance is thereby permanently
/// decoupled from future series-template edits: re-materialization never
/// touches an existing `(series, date)` row.
///
/// ## Errors
/// Returns `ValidationError` when `new_end` is not after `new_start`, and
/// `NotFound` when the instance does not exist.
#[tracing::instrument(skip(conn))]
pub async fn update_instance_time(
    conn: &mut DbConnection<'_>,
    instance_id: Uuid,
    new_start: NaiveTime,
    new_end: NaiveTime,
) -> ServiceResult<InstanceUpdate> {
    if new_end <= new_start {
        return Err(ServiceError::ValidationError(format!(
            "end time {new_end} must be after start time {new_start}"
        )));
    }

    let Some(existing) = instance::by_id(conn, instance_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "instance {instance_id} not found"
        )));
    };

    let updated = instance::update_time(conn, instance_id, new_start, new_end)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("instance {instance_id} not found")))?;

    let confirmed =
        booking::confirmed_on_date(conn, updated.specialist_id, updated.date).await?;
    let uncovered = uncovered_bookings(
        (existing.start_time, existing.end_time),
        (new_start, new_end),
        confirmed,
    );

    if !uncovered.is_empty() {
        tracing::warn!(
            instance_id = %instance_id,
            uncovered = uncovered.len(),
            "Availability edit no longer covers confirmed bookings"
        );
    }

    Ok(InstanceUpdate {
        instance: updated,
        uncovered_bookings: uncovered,
    })
}

/// Confirmed bookings the old range covered that the new range does not.
fn uncovered_bookings(
    old: (NaiveTime, NaiveTime),
    new: (NaiveTime, NaiveTime),
    confirmed: Vec<Booking>,
) -> Vec<Booking> {
    confirmed
        .into_iter()
        .filter(|b| {
            covers(old.0, old.1, b.start_time, b.end_time)
                && !covers(new.0, new.1, b.start_time, b.end_time)
        })
        .collect()
}

/// ## Summary
/// Deletes exactly one instance; siblings in the series are unaffected.
///
/// ## Errors
/// Returns `NotFound` when the instance does not exist.
#[tracing::instrument(skip(conn))]
pub async fn delete_instance(conn: &mut DbConnection<'_>, instance_id: Uuid) -> ServiceResult<()> {
    let deleted = instance::delete(conn, instance_id).await?;
    if deleted == 0 {
        return Err(ServiceError::NotFound(format!(
            "instance {instance_id} not found"
        )));
    }
    tracing::info!(instance_id = %instance_id, "Instance deleted");
    Ok(())
}

/// ## Summary
/// Deletes every instance of a series, past and future, and the owning
/// rule, in one transaction.
///
/// This is destructive and irreversible; callers must obtain explicit
/// confirmation before invoking it.
///
/// ## Errors
/// Returns `NotFound` when the series does not exist.
#[tracing::instrument(skip(conn))]
pub async fn delete_series(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
) -> ServiceResult<SeriesDeleted> {
    let result = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                if rule::by_id(tx, series_id).await?.is_none() {
                    return Err(ServiceError::NotFound(format!(
                        "series {series_id} not found"
                    )));
                }
                let deleted_count = instance::delete_for_series(tx, series_id).await?;
                rule::delete(tx, series_id).await?;
                Ok(SeriesDeleted { deleted_count })
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(
        series_id = %series_id,
        deleted_count = result.deleted_count,
        "Series deleted"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_db::db::enums::BookingStatus;
    use chrono::NaiveDate;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn booking_at(start: NaiveTime, end: NaiveTime) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            specialist_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 1, 3).expect("valid date"),
            start_time: start,
            end_time: end,
            status: BookingStatus::Confirmed,
        }
    }

    #[test]
    fn shrinking_range_uncovers_contained_booking() {
        let uncovered = uncovered_bookings(
            (time(9, 0), time(17, 0)),
            (time(12, 0), time(17, 0)),
            vec![booking_at(time(10, 0), time(11, 0))],
        );
        assert_eq!(uncovered.len(), 1);
    }

    #[test]
    fn booking_still_covered_is_not_reported() {
        let uncovered = uncovered_bookings(
            (time(9, 0), time(17, 0)),
            (time(10, 0), time(18, 0)),
            vec![booking_at(time(14, 0), time(15, 0))],
        );
        assert!(uncovered.is_empty());
    }

    #[test]
    fn booking_never_covered_is_not_reported() {
        // A booking outside the old range was never this instance's concern.
        let uncovered = uncovered_bookings(
            (time(9, 0), time(12, 0)),
            (time(9, 0), time(11, 0)),
            vec![booking_at(time(13, 0), time(14, 0))],
        );
        assert!(uncovered.is_empty());
    }
}
