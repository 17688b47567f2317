//! Query composition for `recurrence_rule`.

use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::recurrence_rule;
use crate::model::rule::{NewRecurrenceRule, RecurrenceRuleRow};

/// ## Summary
/// Inserts a recurrence rule and returns the stored row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    rule: &NewRecurrenceRule,
) -> QueryResult<RecurrenceRuleRow> {
    diesel::insert_into(recurrence_rule::table)
        .values(rule)
        .returning(RecurrenceRuleRow::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Looks up a rule by series id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_id(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
) -> QueryResult<Option<RecurrenceRuleRow>> {
    recurrence_rule::table
        .find(series_id)
        .select(RecurrenceRuleRow::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns every open-ended rule (no explicit end date), the population the
/// horizon sweep operates on.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn open_ended(conn: &mut DbConnection<'_>) -> QueryResult<Vec<RecurrenceRuleRow>> {
    recurrence_rule::table
        .filter(recurrence_rule::end_date.is_null())
        .order(recurrence_rule::created_at.asc())
        .select(RecurrenceRuleRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns the open-ended rules owned by one specialist.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn open_ended_for_specialist(
    conn: &mut DbConnection<'_>,
    specialist_id: Uuid,
) -> QueryResult<Vec<RecurrenceRuleRow>> {
    recurrence_rule::table
        .filter(recurrence_rule::end_date.is_null())
        .filter(recurrence_rule::specialist_id.eq(specialist_id))
        .order(recurrence_rule::created_at.asc())
        .select(RecurrenceRuleRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Replaces the rule's template times. Already-materialized instances are
/// not touched; only future materialization picks up the new times.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update_times(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    new_start: NaiveTime,
    new_end: NaiveTime,
) -> QueryResult<Option<RecurrenceRuleRow>> {
    diesel::update(recurrence_rule::table.find(series_id))
        .set((
            recurrence_rule::start_time.eq(new_start),
            recurrence_rule::end_time.eq(new_end),
            recurrence_rule::updated_at.eq(diesel::dsl::now),
        ))
        .returning(RecurrenceRuleRow::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Advances the materialization watermark for a series.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn set_materialized_through(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    through: NaiveDate,
) -> QueryResult<usize> {
    diesel::update(recurrence_rule::table.find(series_id))
        .set((
            recurrence_rule::materialized_through.eq(through),
            recurrence_rule::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await
}

/// ## Summary
/// Deletes a rule row. Instance cleanup is the caller's responsibility
/// (series deletion wraps both in one transaction).
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, series_id: Uuid) -> QueryResult<usize> {
    diesel::delete(recurrence_rule::table.find(series_id))
        .execute(conn)
        .await
}
