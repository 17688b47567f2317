use diesel::{pg::Pg, prelude::*};

use crate::db::{enums::RecurrenceKind, schema};
use cadence_core::error::{CoreError, CoreResult};
use cadence_core::recurrence::{RecurrenceSpec, weekday_from_iso};

/// A persisted recurrence rule; its `id` is the series id shared by every
/// instance it generates.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::recurrence_rule)]
#[diesel(check_for_backend(Pg))]
pub struct RecurrenceRuleRow {
    pub id: uuid::Uuid,
    pub specialist_id: uuid::Uuid,
    pub workplace_id: uuid::Uuid,
    pub kind: RecurrenceKind,
    pub weekdays: Vec<i16>,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub start_date: chrono::NaiveDate,
    pub end_date: Option<chrono::NaiveDate>,
    pub lookahead_weeks: Option<i32>,
    pub materialized_through: Option<chrono::NaiveDate>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl RecurrenceRuleRow {
    /// ## Summary
    /// Rebuilds the validated domain spec from the stored row.
    ///
    /// ## Errors
    /// Returns an error if the stored row violates the rule invariants,
    /// which would indicate corruption rather than caller error.
    pub fn to_spec(&self) -> CoreResult<RecurrenceSpec> {
        let weekdays = self
            .weekdays
            .iter()
            .map(|&n| {
                weekday_from_iso(n).ok_or(CoreError::InvariantViolation(
                    "stored weekday outside 1..=7",
                ))
            })
            .collect::<CoreResult<Vec<_>>>()?;
        let lookahead = self.lookahead_weeks.and_then(|w| u32::try_from(w).ok());
        RecurrenceSpec::new(
            self.kind.into(),
            weekdays,
            self.start_time,
            self.end_time,
            self.start_date,
            self.end_date,
            lookahead,
        )
    }
}

/// Insert struct for creating new recurrence rules
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::recurrence_rule)]
pub struct NewRecurrenceRule {
    pub id: uuid::Uuid,
    pub specialist_id: uuid::Uuid,
    pub workplace_id: uuid::Uuid,
    pub kind: RecurrenceKind,
    pub weekdays: Vec<i16>,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub start_date: chrono::NaiveDate,
    pub end_date: Option<chrono::NaiveDate>,
    pub lookahead_weeks: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types;
    use chrono::{NaiveDate, NaiveTime, Weekday};

    fn sample_row() -> RecurrenceRuleRow {
        RecurrenceRuleRow {
            id: uuid::Uuid::nil(),
            specialist_id: uuid::Uuid::nil(),
            workplace_id: uuid::Uuid::nil(),
            kind: RecurrenceKind::Weekly,
            weekdays: vec![1, 3],
            start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            end_date: None,
            lookahead_weeks: Some(2),
            materialized_through: None,
            created_at: chrono::DateTime::UNIX_EPOCH,
            updated_at: chrono::DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn row_rebuilds_spec() {
        let spec = sample_row().to_spec().expect("valid spec");
        assert_eq!(spec.kind(), types::RecurrenceKind::Weekly);
        assert_eq!(spec.weekdays(), &[Weekday::Mon, Weekday::Wed]);
        assert_eq!(spec.lookahead_weeks(), Some(2));
    }

    #[test]
    fn row_with_bad_weekday_is_rejected() {
        let mut row = sample_row();
        row.weekdays = vec![1, 9];
        assert!(row.to_spec().is_err());
    }
}
