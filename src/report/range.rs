//! Query range keywords and time normalization.

/// A named lookback window accepted by the public endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKey {
    H24,
    D7,
    D30,
}

impl RangeKey {
    /// Parse a `range` query value. Unrecognized keywords are a caller
    /// validation error, not a default.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "24h" => Some(Self::H24),
            "7d" => Some(Self::D7),
            "30d" => Some(Self::D30),
            _ => None,
        }
    }

    pub fn seconds(self) -> i64 {
        match self {
            Self::H24 => 86_400,
            Self::D7 => 7 * 86_400,
            Self::D30 => 30 * 86_400,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::H24 => "24h",
            Self::D7 => "7d",
            Self::D30 => "30d",
        }
    }
}

/// Truncate a timestamp down to its minute boundary. Query ranges end on
/// whole minutes so responses are stable within a minute.
pub fn floor_to_minute(ts: i64) -> i64 {
    ts - ts.rem_euclid(60)
}
