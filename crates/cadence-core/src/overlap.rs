//! Pure overlap classification for same-day time ranges.
//!
//! Availability instances are expected to contain bookings, so overlap with
//! availability is not a conflict; only booking-booking overlap blocks.

use chrono::NaiveTime;

/// Relationship between a candidate time range and existing rows on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapKind {
    NoOverlap,
    WithAvailability,
    WithBooking,
}

impl OverlapKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoOverlap => "no_overlap",
            Self::WithAvailability => "overlap_with_availability",
            Self::WithBooking => "overlap_with_booking",
        }
    }
}

impl std::fmt::Display for OverlapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether two half-open ranges `[a_start, a_end)` and `[b_start, b_end)`
/// share any time. Ranges that merely touch do not overlap.
#[must_use]
pub fn ranges_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Whether `[outer_start, outer_end)` fully contains `[inner_start, inner_end)`.
#[must_use]
pub fn covers(
    outer_start: NaiveTime,
    outer_end: NaiveTime,
    inner_start: NaiveTime,
    inner_end: NaiveTime,
) -> bool {
    outer_start <= inner_start && inner_end <= outer_end
}

/// ## Summary
/// Classifies a candidate range against bookings and availability ranges on
/// the same date. Booking overlap dominates availability overlap.
#[must_use]
pub fn classify(
    start: NaiveTime,
    end: NaiveTime,
    bookings: &[(NaiveTime, NaiveTime)],
    availability: &[(NaiveTime, NaiveTime)],
) -> OverlapKind {
    if bookings
        .iter()
        .any(|&(s, e)| ranges_overlap(start, end, s, e))
    {
        return OverlapKind::WithBooking;
    }
    if availability
        .iter()
        .any(|&(s, e)| ranges_overlap(start, end, s, e))
    {
        return OverlapKind::WithAvailability;
    }
    OverlapKind::NoOverlap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    #[test]
    fn overlapping_ranges() {
        assert!(ranges_overlap(time(9, 0), time(11, 0), time(10, 0), time(12, 0)));
        assert!(ranges_overlap(time(10, 0), time(12, 0), time(9, 0), time(11, 0)));
        // Containment counts as overlap.
        assert!(ranges_overlap(time(9, 0), time(17, 0), time(10, 0), time(11, 0)));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        assert!(!ranges_overlap(time(9, 0), time(10, 0), time(10, 0), time(11, 0)));
        assert!(!ranges_overlap(time(10, 0), time(11, 0), time(9, 0), time(10, 0)));
    }

    #[test]
    fn covers_is_inclusive_of_boundaries() {
        assert!(covers(time(9, 0), time(17, 0), time(9, 0), time(17, 0)));
        assert!(covers(time(9, 0), time(17, 0), time(10, 0), time(11, 0)));
        assert!(!covers(time(9, 0), time(17, 0), time(8, 0), time(10, 0)));
        assert!(!covers(time(9, 0), time(17, 0), time(16, 0), time(18, 0)));
    }

    #[test]
    fn booking_overlap_dominates() {
        let bookings = [(time(10, 0), time(11, 0))];
        let availability = [(time(9, 0), time(17, 0))];
        assert_eq!(
            classify(time(10, 30), time(11, 30), &bookings, &availability),
            OverlapKind::WithBooking
        );
    }

    #[test]
    fn availability_overlap_without_booking() {
        let availability = [(time(9, 0), time(17, 0))];
        assert_eq!(
            classify(time(10, 0), time(11, 0), &[], &availability),
            OverlapKind::WithAvailability
        );
    }

    #[test]
    fn disjoint_is_no_overlap() {
        let bookings = [(time(8, 0), time(9, 0))];
        let availability = [(time(9, 0), time(12, 0))];
        assert_eq!(
            classify(time(13, 0), time(14, 0), &bookings, &availability),
            OverlapKind::NoOverlap
        );
    }
}
