//! Expansion of recurrence specs into concrete occurrence dates.

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use rrule::{RRule, Tz, Unvalidated};

use crate::error::{ServiceError, ServiceResult};
use cadence_core::recurrence::{DateWindow, RecurrenceSpec};

/// Occurrence dates produced for one expansion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Matching dates in ascending order.
    pub dates: Vec<NaiveDate>,
    /// True when the per-call cap cut the expansion short; the caller should
    /// re-invoke for the remainder.
    pub truncated: bool,
}

impl Expansion {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            dates: Vec::new(),
            truncated: false,
        }
    }
}

/// ## Summary
/// Expands a spec over a requested window, clipped to the rule's own date
/// range, yielding at most `cap` dates.
///
/// A window disjoint from the rule's range is a no-op, not an error. Both
/// window boundaries are inclusive.
///
/// ## Errors
/// Returns `ValidationError` if the compiled RRULE text is rejected by the
/// expansion engine, which indicates an invariant breach in the spec type.
pub fn expand(spec: &RecurrenceSpec, window: DateWindow, cap: u16) -> ServiceResult<Expansion> {
    let Some(effective) = spec.effective_window(window) else {
        tracing::trace!("Requested window is disjoint from the rule's range");
        return Ok(Expansion::empty());
    };

    let rrule = spec
        .rrule_text()
        .parse::<RRule<Unvalidated>>()
        .map_err(|err| ServiceError::ValidationError(err.to_string()))?;
    let dt_start = Utc
        .from_utc_datetime(&spec.start_date().and_time(spec.start_time()))
        .with_timezone(&Tz::UTC);
    let mut rrule_set = rrule
        .build(dt_start)
        .map_err(|err| ServiceError::ValidationError(err.to_string()))?;

    // `after` and `before` are both exclusive; pad one second each way so
    // occurrences on the window boundaries are kept.
    let window_start = Utc.from_utc_datetime(&effective.start().and_time(spec.start_time()))
        - TimeDelta::seconds(1);
    let window_end = Utc.from_utc_datetime(&effective.end().and_time(spec.start_time()))
        + TimeDelta::seconds(1);
    rrule_set = rrule_set.after(window_start.with_timezone(&Tz::UTC));
    rrule_set = rrule_set.before(window_end.with_timezone(&Tz::UTC));

    let result = rrule_set.all(cap);
    let dates: Vec<NaiveDate> = result.dates.iter().map(|dt| dt.date_naive()).collect();

    tracing::trace!(
        count = dates.len(),
        truncated = result.limited,
        "Expanded recurrence window"
    );

    Ok(Expansion {
        dates,
        truncated: result.limited,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types::RecurrenceKind;
    use chrono::{NaiveTime, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
        DateWindow::new(start, end).expect("valid window")
    }

    fn weekly_mon_wed() -> RecurrenceSpec {
        RecurrenceSpec::new(
            RecurrenceKind::Weekly,
            vec![Weekday::Mon, Weekday::Wed],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 1),
            None,
            Some(2),
        )
        .expect("valid spec")
    }

    #[test]
    fn mon_wed_two_weeks_scenario() {
        // 2024-01-01 is a Monday.
        let expansion =
            expand(&weekly_mon_wed(), window(date(2024, 1, 1), date(2024, 1, 14)), 500)
                .expect("expansion succeeds");
        assert_eq!(
            expansion.dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 3),
                date(2024, 1, 8),
                date(2024, 1, 10),
            ]
        );
        assert!(!expansion.truncated);
    }

    #[test]
    fn expansion_is_deterministic() {
        let spec = weekly_mon_wed();
        let w = window(date(2024, 1, 1), date(2024, 1, 14));
        let first = expand(&spec, w, 500).expect("expansion succeeds");
        let second = expand(&spec, w, 500).expect("expansion succeeds");
        assert_eq!(first, second);
    }

    #[test]
    fn respects_rule_end_date_inside_wider_window() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Weekly,
            vec![Weekday::Mon, Weekday::Wed],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 1),
            Some(date(2024, 1, 7)),
            None,
        )
        .expect("valid spec");
        let expansion = expand(&spec, window(date(2023, 12, 1), date(2024, 2, 29)), 500)
            .expect("expansion succeeds");
        assert_eq!(expansion.dates, vec![date(2024, 1, 1), date(2024, 1, 3)]);
    }

    #[test]
    fn daily_rule_includes_leap_day() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(9, 0),
            time(17, 0),
            date(2024, 2, 1),
            None,
            Some(8),
        )
        .expect("valid spec");
        let expansion = expand(&spec, window(date(2024, 2, 27), date(2024, 3, 2)), 500)
            .expect("expansion succeeds");
        assert_eq!(
            expansion.dates,
            vec![
                date(2024, 2, 27),
                date(2024, 2, 28),
                date(2024, 2, 29),
                date(2024, 3, 1),
                date(2024, 3, 2),
            ]
        );
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let spec = weekly_mon_wed();
        // Window exactly covering a single Monday.
        let expansion = expand(&spec, window(date(2024, 1, 8), date(2024, 1, 8)), 500)
            .expect("expansion succeeds");
        assert_eq!(expansion.dates, vec![date(2024, 1, 8)]);
    }

    #[test]
    fn disjoint_window_is_a_noop() {
        let expansion =
            expand(&weekly_mon_wed(), window(date(2023, 1, 1), date(2023, 1, 31)), 500)
                .expect("expansion succeeds");
        assert!(expansion.dates.is_empty());
        assert!(!expansion.truncated);
    }

    #[test]
    fn cap_truncates_and_flags() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 1),
            None,
            Some(52),
        )
        .expect("valid spec");
        let expansion = expand(&spec, window(date(2024, 1, 1), date(2024, 1, 31)), 3)
            .expect("expansion succeeds");
        assert_eq!(
            expansion.dates,
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
        assert!(expansion.truncated);
    }
}
