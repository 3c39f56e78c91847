//! Latency statistics over check observations.

use crate::db::{CheckRow, CheckStatus};

/// Aggregate latency figures for a time range. Both fields are `None`
/// when no successful observation carries a latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub avg_ms: Option<i64>,
    pub p95_ms: Option<i64>,
}

/// Mean and 95th-percentile latency over `up` checks with a recorded
/// latency. Failed, maintenance, and unknown observations are excluded;
/// they carry no meaningful latency.
pub fn latency_stats(points: &[CheckRow]) -> LatencyStats {
    let mut samples: Vec<i64> = points
        .iter()
        .filter(|p| p.status == CheckStatus::Up)
        .filter_map(|p| p.latency_ms)
        .collect();

    if samples.is_empty() {
        return LatencyStats {
            avg_ms: None,
            p95_ms: None,
        };
    }

    let sum: i64 = samples.iter().sum();
    let avg = (sum as f64 / samples.len() as f64).round() as i64;

    samples.sort_unstable();
    let n = samples.len();
    // Index ceil(0.95 * n) - 1, clamped into the sample; a single sample
    // is its own p95.
    let idx = (n * 19).div_ceil(20).saturating_sub(1).min(n - 1);

    LatencyStats {
        avg_ms: Some(avg),
        p95_ms: Some(samples[idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(status: CheckStatus, latency_ms: Option<i64>) -> CheckRow {
        CheckRow {
            monitor_id: 1,
            checked_at: 0,
            status,
            latency_ms,
        }
    }

    #[test]
    fn empty_input_yields_nulls() {
        let stats = latency_stats(&[]);
        assert_eq!(stats.avg_ms, None);
        assert_eq!(stats.p95_ms, None);
    }

    #[test]
    fn only_successful_checks_count() {
        let stats = latency_stats(&[
            point(CheckStatus::Up, Some(100)),
            point(CheckStatus::Down, Some(9_000)),
            point(CheckStatus::Maintenance, Some(5)),
            point(CheckStatus::Up, None),
            point(CheckStatus::Up, Some(200)),
        ]);
        assert_eq!(stats.avg_ms, Some(150));
        assert_eq!(stats.p95_ms, Some(200));
    }

    #[test]
    fn average_rounds_to_nearest() {
        let stats = latency_stats(&[
            point(CheckStatus::Up, Some(100)),
            point(CheckStatus::Up, Some(101)),
        ]);
        assert_eq!(stats.avg_ms, Some(101));
    }

    #[test]
    fn p95_of_single_sample_is_that_sample() {
        let stats = latency_stats(&[point(CheckStatus::Up, Some(42))]);
        assert_eq!(stats.p95_ms, Some(42));
    }

    #[test]
    fn p95_picks_the_order_statistic() {
        // 20 samples: ceil(0.95 * 20) - 1 = 18, the 19th smallest.
        let points: Vec<CheckRow> = (1..=20)
            .map(|i| point(CheckStatus::Up, Some(i * 10)))
            .collect();
        let stats = latency_stats(&points);
        assert_eq!(stats.p95_ms, Some(190));

        // 10 samples: ceil(9.5) - 1 = 9, the maximum.
        let stats = latency_stats(&points[..10]);
        assert_eq!(stats.p95_ms, Some(100));
    }
}
