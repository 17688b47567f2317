//! Horizon extension: keeping open-ended series materialized through
//! `today + lookahead`, driven by the per-series watermark.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::schedule::materialize::{MaterializationReport, materialize_window};
use cadence_core::recurrence::DateWindow;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::rule;
use cadence_db::model::rule::RecurrenceRuleRow;

/// Outcome of extending one series.
#[derive(Debug)]
pub struct SeriesExtension {
    pub series_id: Uuid,
    pub report: MaterializationReport,
}

/// ## Summary
/// The gap window an open-ended series still needs materialized as of
/// `today`, or `None` when the watermark already reaches the target.
///
/// A series with no watermark starts from its start date. The target end is
/// `today + lookahead_weeks * 7 - 1 day`, with `default_lookahead_weeks`
/// standing in for rules that carry no horizon of their own.
#[must_use]
pub fn extension_window(
    start_date: NaiveDate,
    materialized_through: Option<NaiveDate>,
    lookahead_weeks: Option<u32>,
    today: NaiveDate,
    default_lookahead_weeks: u32,
) -> Option<DateWindow> {
    let weeks = lookahead_weeks.unwrap_or(default_lookahead_weeks).max(1);
    let target_end = today.checked_add_days(Days::new(u64::from(weeks) * 7 - 1))?;

    let from = match materialized_through {
        Some(through) => through.succ_opt()?.max(start_date),
        None => start_date,
    };

    if from > target_end {
        return None;
    }
    DateWindow::new(from, target_end).ok()
}

/// ## Summary
/// Extends every open-ended series. Per-series failures are logged and left
/// for the next sweep; they never propagate, so reads stay unaffected.
///
/// ## Errors
/// Returns an error only if listing the open-ended rules fails.
#[tracing::instrument(skip(conn))]
pub async fn extend_horizons(
    conn: &mut DbConnection<'_>,
    today: NaiveDate,
    cap: u16,
    default_lookahead_weeks: u32,
) -> ServiceResult<Vec<SeriesExtension>> {
    let rules = rule::open_ended(conn).await?;
    extend_rules(conn, rules, today, cap, default_lookahead_weeks).await
}

/// ## Summary
/// Extends the open-ended series of one specialist; used for the lazy
/// extension triggered after a read past the materialized horizon.
///
/// ## Errors
/// Returns an error only if listing the specialist's rules fails.
#[tracing::instrument(skip(conn))]
pub async fn extend_horizons_for_specialist(
    conn: &mut DbConnection<'_>,
    specialist_id: Uuid,
    today: NaiveDate,
    cap: u16,
    default_lookahead_weeks: u32,
) -> ServiceResult<Vec<SeriesExtension>> {
    let rules = rule::open_ended_for_specialist(conn, specialist_id).await?;
    extend_rules(conn, rules, today, cap, default_lookahead_weeks).await
}

async fn extend_rules(
    conn: &mut DbConnection<'_>,
    rules: Vec<RecurrenceRuleRow>,
    today: NaiveDate,
    cap: u16,
    default_lookahead_weeks: u32,
) -> ServiceResult<Vec<SeriesExtension>> {
    let mut extensions = Vec::new();

    for stored in rules {
        let lookahead = stored.lookahead_weeks.and_then(|w| u32::try_from(w).ok());
        let Some(window) = extension_window(
            stored.start_date,
            stored.materialized_through,
            lookahead,
            today,
            default_lookahead_weeks,
        ) else {
            continue;
        };

        match materialize_window(conn, &stored, window, cap).await {
            Ok(report) => {
                if let Some(through) = report.watermark_candidate(window)
                    && let Err(err) =
                        rule::set_materialized_through(conn, stored.id, through).await
                {
                    // The instances exist; a stale watermark only means the
                    // next sweep re-plans an already-covered gap.
                    tracing::warn!(series_id = %stored.id, error = %err, "Failed to advance watermark");
                }
                extensions.push(SeriesExtension {
                    series_id: stored.id,
                    report,
                });
            }
            Err(err) => {
                tracing::error!(
                    series_id = %stored.id,
                    error = %err,
                    "Horizon extension failed; will retry on the next sweep"
                );
            }
        }
    }

    if !extensions.is_empty() {
        tracing::info!(series = extensions.len(), "Extended materialization horizon");
    }

    Ok(extensions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn unmaterialized_series_starts_at_start_date() {
        let window = extension_window(date(2024, 1, 1), None, Some(2), date(2024, 1, 10), 4)
            .expect("gap exists");
        assert_eq!(window.start(), date(2024, 1, 1));
        // Two weeks from 2024-01-10 run through 2024-01-23.
        assert_eq!(window.end(), date(2024, 1, 23));
    }

    #[test]
    fn gap_starts_after_watermark() {
        let window = extension_window(
            date(2024, 1, 1),
            Some(date(2024, 1, 14)),
            Some(2),
            date(2024, 1, 10),
            4,
        )
        .expect("gap exists");
        assert_eq!(window.start(), date(2024, 1, 15));
        assert_eq!(window.end(), date(2024, 1, 23));
    }

    #[test]
    fn current_watermark_needs_no_extension() {
        let window = extension_window(
            date(2024, 1, 1),
            Some(date(2024, 2, 1)),
            Some(2),
            date(2024, 1, 10),
            4,
        );
        assert!(window.is_none());
    }

    #[test]
    fn default_lookahead_applies_when_rule_has_none() {
        let window = extension_window(date(2024, 1, 1), None, None, date(2024, 1, 1), 4)
            .expect("gap exists");
        // Four weeks from 2024-01-01 run through 2024-01-28.
        assert_eq!(window.end(), date(2024, 1, 28));
    }

    #[test]
    fn future_start_date_bounds_gap_start() {
        // A series starting beyond the watermark extends from its start.
        let window = extension_window(
            date(2024, 3, 1),
            Some(date(2024, 1, 14)),
            Some(8),
            date(2024, 2, 1),
            4,
        )
        .expect("gap exists");
        assert_eq!(window.start(), date(2024, 3, 1));
        assert_eq!(window.end(), date(2024, 3, 27));
    }
}
