//! Observation gap classifier.
//!
//! A check attests to a monitor's state for `[checked_at, checked_at +
//! interval_sec)`. Seconds of a query range not covered by a live verdict
//! are classified unknown, including spans covered by a check whose own
//! status is `unknown`.

use super::interval::{push_merged, Interval};
use crate::db::CheckStatus;

/// A `(checked_at, status)` observation, chronologically sorted by caller.
pub type CheckPoint = (i64, CheckStatus);

/// Sub-intervals of `[range_start, range_end)` with no valid `up`/`down`/
/// `maintenance` verdict covering them. The result is a merged set.
///
/// Checks before `range_start` are consulted so a verdict straddling the
/// range boundary is honored; checks at or past `range_end` are ignored.
/// A non-positive `interval_sec` means no verdict can be trusted and the
/// whole range is unknown.
pub fn unknown_intervals(
    range_start: i64,
    range_end: i64,
    interval_sec: i64,
    checks: &[CheckPoint],
) -> Vec<Interval> {
    if range_end <= range_start {
        return Vec::new();
    }
    if interval_sec <= 0 {
        return vec![Interval::new(range_start, range_end)];
    }

    let mut unknown = Vec::new();
    let mut cursor = range_start;
    let mut last: Option<CheckPoint> = None;

    for &(checked_at, status) in checks {
        if checked_at < range_start {
            // Carry-over: the latest pre-range check may still be valid
            // at range_start.
            last = Some((checked_at, status));
            continue;
        }
        if checked_at >= range_end {
            break;
        }
        classify_segment(cursor, checked_at, last, interval_sec, &mut unknown);
        last = Some((checked_at, status));
        cursor = checked_at;
    }

    classify_segment(cursor, range_end, last, interval_sec, &mut unknown);
    unknown
}

/// Classify `[seg_start, seg_end)` against the verdict in force at its
/// start, splitting at the verdict's expiry when it falls inside.
fn classify_segment(
    seg_start: i64,
    seg_end: i64,
    last: Option<CheckPoint>,
    interval_sec: i64,
    unknown: &mut Vec<Interval>,
) {
    if seg_end <= seg_start {
        return;
    }

    let Some((checked_at, status)) = last else {
        push_merged(unknown, Interval::new(seg_start, seg_end));
        return;
    };

    let valid_until = checked_at + interval_sec;
    if seg_start >= valid_until {
        push_merged(unknown, Interval::new(seg_start, seg_end));
        return;
    }

    let covered_end = seg_end.min(valid_until);
    if status == CheckStatus::Unknown {
        push_merged(unknown, Interval::new(seg_start, covered_end));
    }
    if covered_end < seg_end {
        push_merged(unknown, Interval::new(covered_end, seg_end));
    }
}
