//! Availability breakdown over a query range.
//!
//! Downtime comes from explicit outage records; unknown time comes from
//! the observation gap classifier. When both classify the same seconds,
//! downtime wins and the overlap is subtracted from unknown.

use super::gaps::{unknown_intervals, CheckPoint};
use super::interval::{merge, overlap, sum, Interval};

/// An outage record as `(started_at, ended_at)`; `None` means ongoing.
pub type OutageSpan = (i64, Option<i64>);

/// Second-level accounting for a range: the three classes partition
/// `total_sec`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UptimeBreakdown {
    pub total_sec: i64,
    pub downtime_sec: i64,
    pub unknown_sec: i64,
    pub uptime_sec: i64,
    pub uptime_pct: f64,
}

/// Classify every second of `[range_start, range_end)` as down, unknown,
/// or up. Ongoing outages are clamped to the range end; outage spans
/// reaching outside the range are clamped to it.
pub fn breakdown(
    range_start: i64,
    range_end: i64,
    interval_sec: i64,
    outages: &[OutageSpan],
    checks: &[CheckPoint],
) -> UptimeBreakdown {
    let total_sec = (range_end - range_start).max(0);

    let clamped: Vec<Interval> = outages
        .iter()
        .filter_map(|&(started_at, ended_at)| {
            let start = started_at.max(range_start);
            let end = ended_at.unwrap_or(range_end).min(range_end);
            (end > start).then_some(Interval::new(start, end))
        })
        .collect();
    let downtime = merge(clamped);
    let downtime_sec = sum(&downtime);

    let unknown = unknown_intervals(range_start, range_end, interval_sec, checks);
    let unknown_sec = (sum(&unknown) - overlap(&unknown, &downtime)).max(0);

    let unavailable_sec = (downtime_sec + unknown_sec).min(total_sec);
    let uptime_sec = (total_sec - unavailable_sec).max(0);
    let uptime_pct = if total_sec == 0 {
        0.0
    } else {
        uptime_sec as f64 / total_sec as f64 * 100.0
    };

    UptimeBreakdown {
        total_sec,
        downtime_sec,
        unknown_sec,
        uptime_sec,
        uptime_pct,
    }
}
