//! Database model types.

use serde::Serialize;

/// A monitored endpoint's identity and schedule. Immutable from the
/// engine's point of view; the authoring surface lives elsewhere.
#[derive(Debug, Clone)]
pub struct Monitor {
    pub id: i64,
    pub name: String,
    pub monitor_type: String,
    pub interval_sec: i64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Current state of a monitor, maintained by the external scheduler.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub status: MonitorStatus,
    pub last_checked_at: Option<i64>,
    pub last_latency_ms: Option<i64>,
}

impl Default for MonitorState {
    /// State for a monitor the scheduler has never touched.
    fn default() -> Self {
        Self {
            status: MonitorStatus::Unknown,
            last_checked_at: None,
            last_latency_ms: None,
        }
    }
}

/// An active monitor joined with its state for the fleet view.
#[derive(Debug, Clone)]
pub struct FleetRow {
    pub monitor: Monitor,
    pub state: MonitorState,
}

/// One observation by the external scheduler.
#[derive(Debug, Clone)]
pub struct CheckRow {
    pub monitor_id: i64,
    pub checked_at: i64,
    pub status: CheckStatus,
    pub latency_ms: Option<i64>,
}

/// A downtime assertion from the outage-detection pipeline.
/// `ended_at == None` means the outage is still open.
#[derive(Debug, Clone)]
pub struct OutageRow {
    pub monitor_id: i64,
    pub started_at: i64,
    pub ended_at: Option<i64>,
}

/// Status of a monitor as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Up,
    Down,
    Maintenance,
    Paused,
    Unknown,
}

impl MonitorStatus {
    /// Parse stored text; anything unrecognized degrades to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "up" => Self::Up,
            "down" => Self::Down,
            "maintenance" => Self::Maintenance,
            "paused" => Self::Paused,
            _ => Self::Unknown,
        }
    }
}

/// Status of a single check. Paused monitors produce no checks, so there
/// is no `paused` variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Up,
    Down,
    Maintenance,
    Unknown,
}

impl CheckStatus {
    /// Parse stored text; anything unrecognized degrades to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "up" => Self::Up,
            "down" => Self::Down,
            "maintenance" => Self::Maintenance,
            _ => Self::Unknown,
        }
    }
}
