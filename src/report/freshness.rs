//! Staleness classification for fleet status rows.

use crate::db::MonitorStatus;

/// Whether a monitor's recorded state is too old to expose.
///
/// Operator-declared states (`paused`, `maintenance`) are never stale; the
/// scheduler being idle must not degrade them. Otherwise a monitor with no
/// recorded check is stale, as is one whose last check is older than twice
/// its sampling interval.
pub fn is_stale(
    now: i64,
    status: MonitorStatus,
    last_checked_at: Option<i64>,
    interval_sec: i64,
) -> bool {
    match status {
        MonitorStatus::Paused | MonitorStatus::Maintenance => false,
        _ => match last_checked_at {
            None => true,
            Some(at) => now - at > 2 * interval_sec,
        },
    }
}
