//! Instance materialization: expanding a rule over a window and persisting
//! exactly one instance per `(series, date)` pair.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use diesel::QueryResult;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::schedule::recurrence::expand;
use cadence_core::recurrence::DateWindow;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::instance;
use cadence_db::model::instance::NewCalendarInstance;
use cadence_db::model::rule::RecurrenceRuleRow;

/// A date whose instance could not be persisted after the retry.
#[derive(Debug, Clone)]
pub struct FailedDate {
    pub date: NaiveDate,
    pub reason: String,
}

/// Outcome of one materialization pass.
///
/// Each date persists independently; the pass never rolls back completed
/// dates, so a partially failed pass is a partial result the caller can
/// safely repeat.
#[derive(Debug, Clone, Default)]
pub struct MaterializationReport {
    /// Dates for which a new instance was created, ascending.
    pub created: Vec<NaiveDate>,
    /// Dates that already held an instance (prior passes or a benign
    /// concurrent-materialization race).
    pub already_present: usize,
    /// Dates that failed to persist after one retry.
    pub failed: Vec<FailedDate>,
    /// True when the per-call cap cut expansion short.
    pub truncated: bool,
}

impl MaterializationReport {
    /// Whether the pass covered its whole window without residual failures.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.truncated
    }

    /// ## Summary
    /// The date the series watermark may advance to after this pass:
    /// the window end for a complete pass, the last created date for a
    /// truncated one, and nothing while failures remain.
    #[must_use]
    pub fn watermark_candidate(&self, window: DateWindow) -> Option<NaiveDate> {
        if !self.failed.is_empty() {
            return None;
        }
        if self.truncated {
            return self.created.last().copied();
        }
        Some(window.end())
    }
}

/// Candidate dates that still need an instance, preserving order.
#[must_use]
pub fn plan_dates(candidates: &[NaiveDate], existing: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    candidates
        .iter()
        .copied()
        .filter(|d| !existing.contains(d))
        .collect()
}

/// ## Summary
/// Materializes a rule over `window`: expands occurrence dates, skips dates
/// that already hold an instance (their times may have been edited and must
/// not be overwritten), and inserts the rest with the rule's current
/// template times.
///
/// The rule row is the snapshot for the whole pass; a rule edited while a
/// pass runs does not affect instances already decided in that pass.
///
/// ## Errors
/// Returns an error when the expansion itself fails or the existing-date
/// lookup fails; individual insert failures are retried once and then
/// collected into the report instead of failing the pass.
#[tracing::instrument(skip(conn, rule), fields(series_id = %rule.id, window_start = %window.start(), window_end = %window.end()))]
pub async fn materialize_window(
    conn: &mut DbConnection<'_>,
    rule: &RecurrenceRuleRow,
    window: DateWindow,
    cap: u16,
) -> ServiceResult<MaterializationReport> {
    let spec = rule.to_spec()?;
    let expansion = expand(&spec, window, cap)?;

    let Some((&first, &last)) = expansion.dates.first().zip(expansion.dates.last()) else {
        tracing::debug!("No occurrence dates in window");
        return Ok(MaterializationReport {
            truncated: expansion.truncated,
            ..MaterializationReport::default()
        });
    };

    let existing: BTreeSet<NaiveDate> = instance::existing_dates(conn, rule.id, first, last)
        .await?
        .into_iter()
        .collect();

    let to_create = plan_dates(&expansion.dates, &existing);
    let mut report = MaterializationReport {
        already_present: existing.len(),
        truncated: expansion.truncated,
        ..MaterializationReport::default()
    };

    for date in to_create {
        let new_instance = NewCalendarInstance {
            id: Uuid::now_v7(),
            series_id: rule.id,
            specialist_id: rule.specialist_id,
            workplace_id: rule.workplace_id,
            date,
            start_time: rule.start_time,
            end_time: rule.end_time,
        };
        match insert_with_retry(conn, &new_instance).await {
            Ok(true) => report.created.push(date),
            // Lost a concurrent-materialization race; the other pass won.
            Ok(false) => report.already_present += 1,
            Err(err) => {
                tracing::warn!(date = %date, error = %err, "Instance insert failed after retry");
                report.failed.push(FailedDate {
                    date,
                    reason: err.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        created = report.created.len(),
        already_present = report.already_present,
        failed = report.failed.len(),
        truncated = report.truncated,
        "Materialization pass finished"
    );

    Ok(report)
}

async fn insert_with_retry(
    conn: &mut DbConnection<'_>,
    new_instance: &NewCalendarInstance,
) -> QueryResult<bool> {
    match instance::insert(conn, new_instance).await {
        Ok(inserted) => Ok(inserted),
        Err(err) => {
            tracing::warn!(date = %new_instance.date, error = %err, "Instance insert failed, retrying once");
            instance::insert(conn, new_instance).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn plan_skips_existing_dates() {
        let candidates = [
            date(2024, 1, 1),
            date(2024, 1, 3),
            date(2024, 1, 8),
            date(2024, 1, 10),
        ];
        let existing: BTreeSet<NaiveDate> = [date(2024, 1, 3)].into_iter().collect();
        assert_eq!(
            plan_dates(&candidates, &existing),
            vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 10)]
        );
    }

    #[test]
    fn plan_against_fully_materialized_window_is_empty() {
        let candidates = [date(2024, 1, 1), date(2024, 1, 3)];
        let existing: BTreeSet<NaiveDate> = candidates.iter().copied().collect();
        assert!(plan_dates(&candidates, &existing).is_empty());
    }

    #[test]
    fn plan_preserves_edited_instances() {
        // An instance whose time was edited still occupies its date, so a
        // re-materialization plan over the same window must not include it.
        let candidates = [date(2024, 1, 1), date(2024, 1, 3)];
        let edited: BTreeSet<NaiveDate> = [date(2024, 1, 3)].into_iter().collect();
        assert_eq!(plan_dates(&candidates, &edited), vec![date(2024, 1, 1)]);
    }

    #[test]
    fn complete_pass_advances_watermark_to_window_end() {
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 14)).expect("valid window");
        let report = MaterializationReport {
            created: vec![date(2024, 1, 1), date(2024, 1, 3)],
            already_present: 2,
            failed: vec![],
            truncated: false,
        };
        assert!(report.is_complete());
        assert_eq!(report.watermark_candidate(window), Some(date(2024, 1, 14)));
    }

    #[test]
    fn truncated_pass_advances_watermark_to_last_created() {
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 31)).expect("valid window");
        let report = MaterializationReport {
            created: vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)],
            already_present: 0,
            failed: vec![],
            truncated: true,
        };
        assert!(!report.is_complete());
        assert_eq!(report.watermark_candidate(window), Some(date(2024, 1, 3)));
    }

    #[test]
    fn failed_pass_does_not_advance_watermark() {
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 14)).expect("valid window");
        let report = MaterializationReport {
            created: vec![date(2024, 1, 1)],
            already_present: 0,
            failed: vec![FailedDate {
                date: date(2024, 1, 3),
                reason: "connection reset".to_string(),
            }],
            truncated: false,
        };
        assert_eq!(report.watermark_candidate(window), None);
    }
}
