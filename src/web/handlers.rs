//! HTTP request handlers.
//!
//! Each handler validates its parameters, reads the datastore snapshot,
//! and delegates to a pure document builder so the response shapes are
//! testable without HTTP plumbing.

use super::error::ApiError;
use super::AppState;
use crate::db::{CheckRow, FleetRow, MonitorStatus, Store};
use crate::report::{
    breakdown, floor_to_minute, is_stale, latency_stats, CheckPoint, OutageSpan, RangeKey,
};

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Heartbeat history shown per monitor on the fleet view.
const HEARTBEAT_LIMIT: u32 = 60;

// ============================================================================
// Response schemas
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub generated_at: i64,
    pub overall_status: MonitorStatus,
    pub summary: StatusSummary,
    pub monitors: Vec<MonitorEntry>,
}

/// Per-status monitor counts across the active fleet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub up: u32,
    pub down: u32,
    pub maintenance: u32,
    pub paused: u32,
    pub unknown: u32,
}

impl StatusSummary {
    fn tally(&mut self, status: MonitorStatus) {
        match status {
            MonitorStatus::Up => self.up += 1,
            MonitorStatus::Down => self.down += 1,
            MonitorStatus::Maintenance => self.maintenance += 1,
            MonitorStatus::Paused => self.paused += 1,
            MonitorStatus::Unknown => self.unknown += 1,
        }
    }

    /// Roll the counts up into one fleet-wide status. Any down monitor
    /// makes the fleet down; the remaining states rank unknown >
    /// maintenance > up > paused. An empty fleet is unknown.
    fn overall(&self) -> MonitorStatus {
        if self.down > 0 {
            MonitorStatus::Down
        } else if self.unknown > 0 {
            MonitorStatus::Unknown
        } else if self.maintenance > 0 {
            MonitorStatus::Maintenance
        } else if self.up > 0 {
            MonitorStatus::Up
        } else if self.paused > 0 {
            MonitorStatus::Paused
        } else {
            MonitorStatus::Unknown
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonitorEntry {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub status: MonitorStatus,
    pub is_stale: bool,
    pub last_checked_at: Option<i64>,
    pub last_latency_ms: Option<i64>,
    pub heartbeats: Vec<CheckEntry>,
}

/// A single check as exposed to clients (heartbeats and latency points).
#[derive(Debug, Serialize)]
pub struct CheckEntry {
    pub checked_at: i64,
    pub status: crate::db::CheckStatus,
    pub latency_ms: Option<i64>,
}

impl From<CheckRow> for CheckEntry {
    fn from(row: CheckRow) -> Self {
        Self {
            checked_at: row.checked_at,
            status: row.status,
            latency_ms: row.latency_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonitorRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LatencyResponse {
    pub monitor: MonitorRef,
    pub range: &'static str,
    pub range_start_at: i64,
    pub range_end_at: i64,
    pub avg_latency_ms: Option<i64>,
    pub p95_latency_ms: Option<i64>,
    pub points: Vec<CheckEntry>,
}

#[derive(Debug, Serialize)]
pub struct UptimeResponse {
    pub monitor: MonitorRef,
    pub range: &'static str,
    pub range_start_at: i64,
    pub range_end_at: i64,
    pub total_sec: i64,
    pub downtime_sec: i64,
    pub unknown_sec: i64,
    pub uptime_sec: i64,
    pub uptime_pct: f64,
}

// ============================================================================
// Parameter validation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub range: Option<String>,
}

/// Path ids must be positive integers; anything else is a 400, not a
/// framework rejection.
fn parse_monitor_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::Validation(
            "id must be a positive integer".to_string(),
        )),
    }
}

/// Resolve the `range` parameter against the endpoint's accepted
/// keywords. Absent defaults to 24h.
fn parse_range(query: &RangeQuery, allowed: &[RangeKey]) -> Result<RangeKey, ApiError> {
    let Some(raw) = query.range.as_deref() else {
        return Ok(RangeKey::H24);
    };
    match RangeKey::parse(raw) {
        Some(key) if allowed.contains(&key) => Ok(key),
        _ => Err(ApiError::Validation(format!("invalid range: {}", raw))),
    }
}

// ============================================================================
// Fleet status
// ============================================================================

pub async fn handle_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let now = Utc::now().timestamp();
    let lookback_sec = state.config.status_lookback_sec();
    Ok(Json(status_document(&state.store, now, lookback_sec)?))
}

fn status_document(store: &Store, now: i64, lookback_sec: i64) -> Result<StatusResponse, ApiError> {
    let range_end = floor_to_minute(now);
    let lookback_start = range_end - lookback_sec;

    let rows = store.active_monitors_with_state()?;
    let ids: Vec<i64> = rows.iter().map(|r| r.monitor.id).collect();
    let mut heartbeats = store.recent_checks(&ids, lookback_start, HEARTBEAT_LIMIT)?;

    let mut summary = StatusSummary::default();
    let mut monitors = Vec::with_capacity(rows.len());

    for FleetRow { monitor, state } in rows {
        let stale = is_stale(now, state.status, state.last_checked_at, monitor.interval_sec);
        // Stale observations are not trusted: the exposed status
        // degrades to unknown and the last latency is withheld.
        let status = if stale { MonitorStatus::Unknown } else { state.status };
        let last_latency_ms = if stale { None } else { state.last_latency_ms };
        summary.tally(status);

        monitors.push(MonitorEntry {
            id: monitor.id,
            name: monitor.name,
            monitor_type: monitor.monitor_type,
            status,
            is_stale: stale,
            last_checked_at: state.last_checked_at,
            last_latency_ms,
            heartbeats: heartbeats
                .remove(&monitor.id)
                .unwrap_or_default()
                .into_iter()
                .map(CheckEntry::from)
                .collect(),
        });
    }

    Ok(StatusResponse {
        generated_at: now,
        overall_status: summary.overall(),
        summary,
        monitors,
    })
}

// ============================================================================
// Latency profile
// ============================================================================

pub async fn handle_latency(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<LatencyResponse>, ApiError> {
    let id = parse_monitor_id(&id)?;
    let range = parse_range(&query, &[RangeKey::H24])?;
    let now = Utc::now().timestamp();
    Ok(Json(latency_document(&state.store, id, range, now)?))
}

fn latency_document(
    store: &Store,
    id: i64,
    range: RangeKey,
    now: i64,
) -> Result<LatencyResponse, ApiError> {
    let monitor = store.active_monitor(id)?.ok_or(ApiError::NotFound)?;

    let range_end = floor_to_minute(now);
    let range_start = range_end - range.seconds();
    let points = store.latency_points(monitor.id, range_start, range_end)?;
    let stats = latency_stats(&points);

    Ok(LatencyResponse {
        monitor: MonitorRef {
            id: monitor.id,
            name: monitor.name,
        },
        range: range.as_str(),
        range_start_at: range_start,
        range_end_at: range_end,
        avg_latency_ms: stats.avg_ms,
        p95_latency_ms: stats.p95_ms,
        points: points.into_iter().map(CheckEntry::from).collect(),
    })
}

// ============================================================================
// Uptime
// ============================================================================

pub async fn handle_uptime(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<UptimeResponse>, ApiError> {
    let id = parse_monitor_id(&id)?;
    let range = parse_range(&query, &[RangeKey::H24, RangeKey::D7, RangeKey::D30])?;
    let now = Utc::now().timestamp();
    Ok(Json(uptime_document(&state.store, id, range, now)?))
}

fn uptime_document(
    store: &Store,
    id: i64,
    range: RangeKey,
    now: i64,
) -> Result<UptimeResponse, ApiError> {
    let monitor = store.active_monitor(id)?.ok_or(ApiError::NotFound)?;

    let range_end = floor_to_minute(now);
    // The range never extends before the monitor existed.
    let range_start = (range_end - range.seconds()).max(monitor.created_at);

    let outages = store.outages_overlapping(monitor.id, range_start, range_end)?;
    // One extra interval of lookback supplies the verdict straddling the
    // range start.
    let checks = store.checks_in_window(
        monitor.id,
        range_start - monitor.interval_sec,
        range_end,
    )?;

    let spans: Vec<OutageSpan> = outages.iter().map(|o| (o.started_at, o.ended_at)).collect();
    let points: Vec<CheckPoint> = checks.iter().map(|c| (c.checked_at, c.status)).collect();
    let b = breakdown(range_start, range_end, monitor.interval_sec, &spans, &points);

    Ok(UptimeResponse {
        monitor: MonitorRef {
            id: monitor.id,
            name: monitor.name,
        },
        range: range.as_str(),
        range_start_at: range_start,
        range_end_at: range_end,
        total_sec: b.total_sec,
        downtime_sec: b.downtime_sec,
        unknown_sec: b.unknown_sec,
        uptime_sec: b.uptime_sec,
        uptime_pct: b.uptime_pct,
    })
}

// ============================================================================
// Health
// ============================================================================

pub async fn handle_health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.ping()?;
    Ok(Json(json!({ "ok": true })))
}
