//! Query composition for `calendar_instance`.

use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::calendar_instance;
use crate::model::instance::{CalendarInstance, NewCalendarInstance};

/// ## Summary
/// Returns all instances for a specialist within `[start, end]`, ordered by
/// date then start time. Both bounds are inclusive.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn in_range(
    conn: &mut DbConnection<'_>,
    specialist_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> QueryResult<Vec<CalendarInstance>> {
    calendar_instance::table
        .filter(calendar_instance::specialist_id.eq(specialist_id))
        .filter(calendar_instance::date.ge(start))
        .filter(calendar_instance::date.le(end))
        .order((
            calendar_instance::date.asc(),
            calendar_instance::start_time.asc(),
        ))
        .select(CalendarInstance::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns every instance of a series, any date, ordered by date.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn for_series(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
) -> QueryResult<Vec<CalendarInstance>> {
    calendar_instance::table
        .filter(calendar_instance::series_id.eq(series_id))
        .order(calendar_instance::date.asc())
        .select(CalendarInstance::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns the dates within `[start, end]` that already hold an instance of
/// the series; the materializer skips these.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn existing_dates(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> QueryResult<Vec<NaiveDate>> {
    calendar_instance::table
        .filter(calendar_instance::series_id.eq(series_id))
        .filter(calendar_instance::date.ge(start))
        .filter(calendar_instance::date.le(end))
        .order(calendar_instance::date.asc())
        .select(calendar_instance::date)
        .load(conn)
        .await
}

/// ## Summary
/// Inserts one materialized instance. A concurrent materialization racing on
/// the same `(series_id, date)` resolves through the unique constraint:
/// the insert becomes a no-op and `false` is returned.
///
/// ## Errors
/// Returns an error if the database operation fails for any other reason.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    instance: &NewCalendarInstance,
) -> QueryResult<bool> {
    let rows = diesel::insert_into(calendar_instance::table)
        .values(instance)
        .on_conflict((calendar_instance::series_id, calendar_instance::date))
        .do_nothing()
        .execute(conn)
        .await?;
    Ok(rows > 0)
}

/// ## Summary
/// Looks up a single instance by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_id(
    conn: &mut DbConnection<'_>,
    instance_id: Uuid,
) -> QueryResult<Option<CalendarInstance>> {
    calendar_instance::table
        .find(instance_id)
        .select(CalendarInstance::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Rewrites one instance's time range. Re-materialization never touches the
/// row again, so the edit is permanent for this date.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update_time(
    conn: &mut DbConnection<'_>,
    instance_id: Uuid,
    new_start: NaiveTime,
    new_end: NaiveTime,
) -> QueryResult<Option<CalendarInstance>> {
    diesel::update(calendar_instance::table.find(instance_id))
        .set((
            calendar_instance::start_time.eq(new_start),
            calendar_instance::end_time.eq(new_end),
        ))
        .returning(CalendarInstance::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Deletes exactly one instance; siblings in the series are unaffected.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, instance_id: Uuid) -> QueryResult<usize> {
    diesel::delete(calendar_instance::table.find(instance_id))
        .execute(conn)
        .await
}

/// ## Summary
/// Deletes every instance of a series, past and future, returning the count.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_for_series(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
) -> QueryResult<usize> {
    diesel::delete(
        calendar_instance::table.filter(calendar_instance::series_id.eq(series_id)),
    )
    .execute(conn)
    .await
}
