use diesel::{pg::Pg, prelude::*};

use crate::db::schema;
use crate::model::rule::RecurrenceRuleRow;

/// One concrete, individually addressable availability occurrence generated
/// from a series. The `(series_id, date)` pair is unique.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::calendar_instance)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(RecurrenceRuleRow, foreign_key = series_id))]
pub struct CalendarInstance {
    pub id: uuid::Uuid,
    pub series_id: uuid::Uuid,
    pub specialist_id: uuid::Uuid,
    pub workplace_id: uuid::Uuid,
    pub date: chrono::NaiveDate,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert struct for materialized instances
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::calendar_instance)]
pub struct NewCalendarInstance {
    pub id: uuid::Uuid,
    pub series_id: uuid::Uuid,
    pub specialist_id: uuid::Uuid,
    pub workplace_id: uuid::Uuid,
    pub date: chrono::NaiveDate,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
}
