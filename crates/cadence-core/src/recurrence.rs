//! Recurring-availability rule values: validation, date-window arithmetic,
//! and compilation of a rule into RRULE text for expansion.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};

use crate::error::{CoreError, CoreResult};
use crate::types::RecurrenceKind;

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// ## Summary
    /// Creates a window spanning `start` through `end`, both inclusive.
    ///
    /// ## Errors
    /// Returns `ValidationError` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::ValidationError(format!(
                "window start {start} is after window end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> NaiveDate {
        self.end
    }

    /// Returns the overlap of two windows, or `None` when they are disjoint.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }

    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Converts a weekday to its ISO number (Mon=1 .. Sun=7), the form stored
/// in the database.
#[must_use]
pub fn weekday_to_iso(day: Weekday) -> i16 {
    // number_from_monday is always 1..=7
    i16::try_from(day.number_from_monday()).unwrap_or(1)
}

/// Converts an ISO weekday number (Mon=1 .. Sun=7) back to a weekday.
#[must_use]
pub const fn weekday_from_iso(n: i16) -> Option<Weekday> {
    match n {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// RFC 5545 BYDAY code for a weekday.
#[must_use]
pub const fn byday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// A validated recurring-availability pattern.
///
/// The weekday set is deduplicated and sorted at construction; `daily` rules
/// carry an empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSpec {
    kind: RecurrenceKind,
    weekdays: Vec<Weekday>,
    start_time: NaiveTime,
    end_time: NaiveTime,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    lookahead_weeks: Option<u32>,
}

impl RecurrenceSpec {
    /// ## Summary
    /// Validates rule parameters and builds a spec.
    ///
    /// ## Errors
    /// Returns `ValidationError` when:
    /// - `end_time` is not after `start_time`
    /// - the kind is weekly and the weekday set is empty
    /// - `end_date` is given and precedes `start_date`
    /// - neither an end date nor a positive lookahead horizon is given
    pub fn new(
        kind: RecurrenceKind,
        weekdays: Vec<Weekday>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        lookahead_weeks: Option<u32>,
    ) -> CoreResult<Self> {
        if end_time <= start_time {
            return Err(CoreError::ValidationError(format!(
                "end time {end_time} must be after start time {start_time}"
            )));
        }
        if kind == RecurrenceKind::Weekly && weekdays.is_empty() {
            return Err(CoreError::ValidationError(
                "weekly rule requires at least one weekday".to_string(),
            ));
        }
        if let Some(end) = end_date
            && start_date > end
        {
            return Err(CoreError::ValidationError(format!(
                "start date {start_date} is after end date {end}"
            )));
        }
        if end_date.is_none() && lookahead_weeks.unwrap_or(0) == 0 {
            return Err(CoreError::ValidationError(
                "open-ended rule requires a lookahead horizon of at least one week".to_string(),
            ));
        }

        let mut weekdays = match kind {
            RecurrenceKind::Weekly => weekdays,
            RecurrenceKind::Daily => Vec::new(),
        };
        weekdays.sort_by_key(|d| d.number_from_monday());
        weekdays.dedup();

        Ok(Self {
            kind,
            weekdays,
            start_time,
            end_time,
            start_date,
            end_date,
            lookahead_weeks,
        })
    }

    #[must_use]
    pub const fn kind(&self) -> RecurrenceKind {
        self.kind
    }

    #[must_use]
    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    #[must_use]
    pub const fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    #[must_use]
    pub const fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    #[must_use]
    pub const fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    #[must_use]
    pub const fn lookahead_weeks(&self) -> Option<u32> {
        self.lookahead_weeks
    }

    /// ## Summary
    /// The window the rule is materialized over at creation time:
    /// `[start_date, end_date]` for bounded rules, otherwise
    /// `[start_date, start_date + lookahead_weeks * 7 - 1 day]`.
    #[must_use]
    pub fn initial_window(&self) -> DateWindow {
        let end = self.end_date.unwrap_or_else(|| {
            let weeks = u64::from(self.lookahead_weeks.unwrap_or(1));
            self.start_date
                .checked_add_days(Days::new(weeks * 7 - 1))
                .unwrap_or(NaiveDate::MAX)
        });
        DateWindow {
            start: self.start_date,
            end,
        }
    }

    /// ## Summary
    /// Clips a requested window to the rule's own validity range.
    ///
    /// Open-ended rules clip only on the left; `None` means the requested
    /// window and the rule's range are disjoint (a no-op, not an error).
    #[must_use]
    pub fn effective_window(&self, requested: DateWindow) -> Option<DateWindow> {
        let own_end = self.end_date.unwrap_or(requested.end);
        let own = DateWindow {
            start: self.start_date,
            end: own_end.max(self.start_date),
        };
        requested.intersect(own)
    }

    /// Whether a date satisfies the rule's bounds and weekday constraint.
    #[must_use]
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        if let Some(end) = self.end_date
            && date > end
        {
            return false;
        }
        match self.kind {
            RecurrenceKind::Daily => true,
            RecurrenceKind::Weekly => self.weekdays.contains(&date.weekday()),
        }
    }

    /// ## Summary
    /// Compiles the spec into RRULE text (`FREQ=...` plus `BYDAY`/`UNTIL`
    /// as applicable) for the expansion engine.
    #[must_use]
    pub fn rrule_text(&self) -> String {
        let mut parts = vec![match self.kind {
            RecurrenceKind::Weekly => "FREQ=WEEKLY".to_string(),
            RecurrenceKind::Daily => "FREQ=DAILY".to_string(),
        }];
        if self.kind == RecurrenceKind::Weekly {
            let days: Vec<&str> = self.weekdays.iter().copied().map(byday_code).collect();
            parts.push(format!("BYDAY={}", days.join(",")));
        }
        if let Some(end) = self.end_date {
            parts.push(format!(
                "UNTIL={}",
                end.and_time(self.start_time).format("%Y%m%dT%H%M%SZ")
            ));
        }
        parts.join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
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
    fn rejects_inverted_times() {
        let err = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(17, 0),
            time(9, 0),
            date(2024, 1, 1),
            None,
            Some(2),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn rejects_equal_times() {
        let err = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(9, 0),
            time(9, 0),
            date(2024, 1, 1),
            None,
            Some(2),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn rejects_weekly_without_weekdays() {
        let err = RecurrenceSpec::new(
            RecurrenceKind::Weekly,
            vec![],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 1),
            None,
            Some(2),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn rejects_inverted_date_range() {
        let err = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(9, 0),
            time(17, 0),
            date(2024, 2, 1),
            Some(date(2024, 1, 1)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn rejects_open_ended_without_horizon() {
        for lookahead in [None, Some(0)] {
            let err = RecurrenceSpec::new(
                RecurrenceKind::Daily,
                vec![],
                time(9, 0),
                time(17, 0),
                date(2024, 1, 1),
                None,
                lookahead,
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::ValidationError(_)));
        }
    }

    #[test]
    fn weekday_set_is_deduplicated_and_sorted() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Weekly,
            vec![Weekday::Wed, Weekday::Mon, Weekday::Wed],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 1),
            None,
            Some(2),
        )
        .expect("valid spec");
        assert_eq!(spec.weekdays(), &[Weekday::Mon, Weekday::Wed]);
    }

    #[test]
    fn initial_window_uses_end_date_when_bounded() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 1),
            Some(date(2024, 3, 1)),
            None,
        )
        .expect("valid spec");
        let window = spec.initial_window();
        assert_eq!(window.start(), date(2024, 1, 1));
        assert_eq!(window.end(), date(2024, 3, 1));
    }

    #[test]
    fn initial_window_uses_lookahead_when_open_ended() {
        let window = weekly_mon_wed().initial_window();
        assert_eq!(window.start(), date(2024, 1, 1));
        // Two weeks starting 2024-01-01 run through 2024-01-14.
        assert_eq!(window.end(), date(2024, 1, 14));
    }

    #[test]
    fn effective_window_clips_to_rule_bounds() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 10),
            Some(date(2024, 1, 20)),
            None,
        )
        .expect("valid spec");
        let requested =
            DateWindow::new(date(2024, 1, 1), date(2024, 1, 31)).expect("valid window");
        let effective = spec.effective_window(requested).expect("overlapping");
        assert_eq!(effective.start(), date(2024, 1, 10));
        assert_eq!(effective.end(), date(2024, 1, 20));
    }

    #[test]
    fn effective_window_disjoint_is_none() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 10),
            Some(date(2024, 1, 20)),
            None,
        )
        .expect("valid spec");
        let before = DateWindow::new(date(2024, 1, 1), date(2024, 1, 9)).expect("valid window");
        let after = DateWindow::new(date(2024, 1, 21), date(2024, 1, 31)).expect("valid window");
        assert!(spec.effective_window(before).is_none());
        assert!(spec.effective_window(after).is_none());
    }

    #[test]
    fn effective_window_open_ended_clips_left_only() {
        let spec = weekly_mon_wed();
        let requested =
            DateWindow::new(date(2023, 12, 1), date(2024, 6, 30)).expect("valid window");
        let effective = spec.effective_window(requested).expect("overlapping");
        assert_eq!(effective.start(), date(2024, 1, 1));
        assert_eq!(effective.end(), date(2024, 6, 30));
    }

    #[test]
    fn matches_date_honors_weekdays_and_bounds() {
        let spec = weekly_mon_wed();
        assert!(spec.matches_date(date(2024, 1, 1))); // Monday
        assert!(spec.matches_date(date(2024, 1, 3))); // Wednesday
        assert!(!spec.matches_date(date(2024, 1, 2))); // Tuesday
        assert!(!spec.matches_date(date(2023, 12, 25))); // before start
    }

    #[test]
    fn rrule_text_weekly_with_until() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Weekly,
            vec![Weekday::Mon, Weekday::Wed],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 1),
            Some(date(2024, 1, 14)),
            None,
        )
        .expect("valid spec");
        assert_eq!(
            spec.rrule_text(),
            "FREQ=WEEKLY;BYDAY=MO,WE;UNTIL=20240114T090000Z"
        );
    }

    #[test]
    fn rrule_text_daily_open_ended() {
        let spec = RecurrenceSpec::new(
            RecurrenceKind::Daily,
            vec![],
            time(9, 0),
            time(17, 0),
            date(2024, 1, 1),
            None,
            Some(4),
        )
        .expect("valid spec");
        assert_eq!(spec.rrule_text(), "FREQ=DAILY");
    }

    #[test]
    fn window_intersection() {
        let a = DateWindow::new(date(2024, 1, 1), date(2024, 1, 10)).expect("valid window");
        let b = DateWindow::new(date(2024, 1, 5), date(2024, 1, 20)).expect("valid window");
        let c = DateWindow::new(date(2024, 2, 1), date(2024, 2, 5)).expect("valid window");
        let ab = a.intersect(b).expect("overlapping");
        assert_eq!(ab.start(), date(2024, 1, 5));
        assert_eq!(ab.end(), date(2024, 1, 10));
        assert!(a.intersect(c).is_none());
    }

    #[test]
    fn weekday_iso_round_trip() {
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(weekday_from_iso(weekday_to_iso(day)), Some(day));
        }
        assert_eq!(weekday_from_iso(0), None);
        assert_eq!(weekday_from_iso(8), None);
    }
}
