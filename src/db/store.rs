//! SQLite database store implementation.
//!
//! The engine only reads; the scheduler and outage pipeline own the
//! writing side of this schema.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqlResult, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::models::*;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open a store at the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }

    /// Trivial read used by the health probe.
    pub fn ping(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    // --- Monitors ---

    /// All active monitors joined with their state, ascending by id.
    /// Monitors the scheduler has never touched get a default state.
    pub fn active_monitors_with_state(&self) -> Result<Vec<FleetRow>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT m.id, m.name, m.type, m.interval_sec, m.is_active, m.created_at,
                    s.status, s.last_checked_at, s.last_latency_ms
             FROM monitors m
             LEFT JOIN monitor_state s ON s.monitor_id = m.id
             WHERE m.is_active = 1
             ORDER BY m.id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let monitor = monitor_from_row(row)?;
                let status: Option<String> = row.get(6)?;
                let state = match status {
                    Some(s) => MonitorState {
                        status: MonitorStatus::parse(&s),
                        last_checked_at: row.get(7)?,
                        last_latency_ms: row.get(8)?,
                    },
                    None => MonitorState::default(),
                };
                Ok(FleetRow { monitor, state })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// Look up an active monitor by id.
    pub fn active_monitor(&self, id: i64) -> Result<Option<Monitor>, DbError> {
        let conn = self.conn.lock().unwrap();
        let monitor = conn
            .query_row(
                "SELECT id, name, type, interval_sec, is_active, created_at
                 FROM monitors WHERE id = ?1 AND is_active = 1",
                params![id],
                |row| monitor_from_row(row),
            )
            .optional()?;
        Ok(monitor)
    }

    // --- Check results ---

    /// Most recent checks per monitor since `since`, capped at
    /// `per_monitor` rows each, fetched in one windowed query. Each
    /// monitor's checks come back in chronological order.
    pub fn recent_checks(
        &self,
        monitor_ids: &[i64],
        since: i64,
        per_monitor: u32,
    ) -> Result<HashMap<i64, Vec<CheckRow>>, DbError> {
        if monitor_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; monitor_ids.len()].join(", ");
        let sql = format!(
            "SELECT monitor_id, checked_at, status, latency_ms FROM (
                 SELECT monitor_id, checked_at, status, latency_ms,
                        ROW_NUMBER() OVER (
                            PARTITION BY monitor_id ORDER BY checked_at DESC
                        ) AS rn
                 FROM check_results
                 WHERE checked_at >= ? AND monitor_id IN ({placeholders})
             )
             WHERE rn <= ?
             ORDER BY monitor_id ASC, checked_at DESC",
        );

        let mut values: Vec<i64> = Vec::with_capacity(monitor_ids.len() + 2);
        values.push(since);
        values.extend_from_slice(monitor_ids);
        values.push(per_monitor as i64);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| check_from_row(row))?
            .collect::<SqlResult<Vec<_>>>()?;

        let mut by_monitor: HashMap<i64, Vec<CheckRow>> = HashMap::new();
        for check in rows {
            by_monitor.entry(check.monitor_id).or_default().push(check);
        }
        // The window ordered newest-first; clients get oldest-first.
        for checks in by_monitor.values_mut() {
            checks.reverse();
        }

        Ok(by_monitor)
    }

    /// Checks in the inclusive range `[start, end]`, ascending. Feeds the
    /// latency profile.
    pub fn latency_points(&self, monitor_id: i64, start: i64, end: i64) -> Result<Vec<CheckRow>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT monitor_id, checked_at, status, latency_ms
             FROM check_results
             WHERE monitor_id = ?1 AND checked_at >= ?2 AND checked_at <= ?3
             ORDER BY checked_at ASC",
        )?;

        let rows = stmt
            .query_map(params![monitor_id, start, end], |row| check_from_row(row))?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// Checks in the half-open window `[start, end)`, ascending. The
    /// uptime computation passes a window widened by one sampling
    /// interval so the verdict straddling the range start is included.
    pub fn checks_in_window(&self, monitor_id: i64, start: i64, end: i64) -> Result<Vec<CheckRow>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT monitor_id, checked_at, status, latency_ms
             FROM check_results
             WHERE monitor_id = ?1 AND checked_at >= ?2 AND checked_at < ?3
             ORDER BY checked_at ASC",
        )?;

        let rows = stmt
            .query_map(params![monitor_id, start, end], |row| check_from_row(row))?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(rows)
    }

    // --- Outages ---

    /// Outages overlapping the half-open range `[start, end)`, ascending
    /// by start. Open outages always overlap once started.
    pub fn outages_overlapping(&self, monitor_id: i64, start: i64, end: i64) -> Result<Vec<OutageRow>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT monitor_id, started_at, ended_at
             FROM outages
             WHERE monitor_id = ?1
               AND started_at < ?3
               AND (ended_at IS NULL OR ended_at > ?2)
             ORDER BY started_at ASC",
        )?;

        let rows = stmt
            .query_map(params![monitor_id, start, end], |row| {
                Ok(OutageRow {
                    monitor_id: row.get(0)?,
                    started_at: row.get(1)?,
                    ended_at: row.get(2)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// Direct connection access for seeding test fixtures.
    #[cfg(test)]
    pub(crate) fn raw(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

fn monitor_from_row(row: &Row<'_>) -> SqlResult<Monitor> {
    Ok(Monitor {
        id: row.get(0)?,
        name: row.get(1)?,
        monitor_type: row.get(2)?,
        interval_sec: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn check_from_row(row: &Row<'_>) -> SqlResult<CheckRow> {
    let status: String = row.get(2)?;
    Ok(CheckRow {
        monitor_id: row.get(0)?,
        checked_at: row.get(1)?,
        status: CheckStatus::parse(&status),
        latency_ms: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_store() -> (NamedTempFile, Store) {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        (tmp, store)
    }

    fn insert_monitor(store: &Store, id: i64, name: &str, active: bool, created_at: i64) {
        store
            .raw()
            .execute(
                "INSERT INTO monitors (id, name, type, interval_sec, is_active, created_at)
                 VALUES (?1, ?2, 'http', 60, ?3, ?4)",
                params![id, name, active, created_at],
            )
            .unwrap();
    }

    fn insert_state(store: &Store, id: i64, status: &str, last_checked_at: Option<i64>, last_latency_ms: Option<i64>) {
        store
            .raw()
            .execute(
                "INSERT INTO monitor_state (monitor_id, status, last_checked_at, last_latency_ms)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, status, last_checked_at, last_latency_ms],
            )
            .unwrap();
    }

    fn insert_check(store: &Store, id: i64, checked_at: i64, status: &str, latency_ms: Option<i64>) {
        store
            .raw()
            .execute(
                "INSERT INTO check_results (monitor_id, checked_at, status, latency_ms)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, checked_at, status, latency_ms],
            )
            .unwrap();
    }

    #[test]
    fn ping_succeeds_on_fresh_database() {
        let (_tmp, store) = test_store();
        store.ping().unwrap();
    }

    #[test]
    fn fleet_query_filters_inactive_and_orders_by_id() {
        let (_tmp, store) = test_store();
        insert_monitor(&store, 3, "c", true, 0);
        insert_monitor(&store, 1, "a", true, 0);
        insert_monitor(&store, 2, "b", false, 0);
        insert_state(&store, 1, "up", Some(100), Some(12));

        let rows = store.active_monitors_with_state().unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.monitor.id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert_eq!(rows[0].state.status, MonitorStatus::Up);
        assert_eq!(rows[0].state.last_latency_ms, Some(12));
        // No state row yet: defaults, not an error.
        assert_eq!(rows[1].state.status, MonitorStatus::Unknown);
        assert_eq!(rows[1].state.last_checked_at, None);
    }

    #[test]
    fn active_monitor_hides_inactive() {
        let (_tmp, store) = test_store();
        insert_monitor(&store, 1, "a", true, 50);
        insert_monitor(&store, 2, "b", false, 50);

        let fetched = store.active_monitor(1).unwrap().unwrap();
        assert_eq!(fetched.created_at, 50);
        assert!(fetched.is_active);
        assert!(store.active_monitor(2).unwrap().is_none());
        assert!(store.active_monitor(99).unwrap().is_none());
    }

    #[test]
    fn recent_checks_caps_per_monitor_and_is_chronological() {
        let (_tmp, store) = test_store();
        insert_monitor(&store, 1, "a", true, 0);
        insert_monitor(&store, 2, "b", true, 0);
        for i in 0..70 {
            insert_check(&store, 1, 1_000 + i * 60, "up", Some(10));
        }
        insert_check(&store, 2, 2_000, "down", None);

        let map = store.recent_checks(&[1, 2], 0, 60).unwrap();
        let ones = &map[&1];
        assert_eq!(ones.len(), 60);
        // Oldest first, and the newest 60 of the 70 inserted.
        assert_eq!(ones.first().unwrap().checked_at, 1_000 + 10 * 60);
        assert_eq!(ones.last().unwrap().checked_at, 1_000 + 69 * 60);
        assert!(ones.windows(2).all(|w| w[0].checked_at < w[1].checked_at));

        assert_eq!(map[&2].len(), 1);
        assert_eq!(map[&2][0].status, CheckStatus::Down);
    }

    #[test]
    fn recent_checks_respects_since_and_empty_ids() {
        let (_tmp, store) = test_store();
        insert_monitor(&store, 1, "a", true, 0);
        insert_check(&store, 1, 100, "up", None);
        insert_check(&store, 1, 200, "up", None);

        let map = store.recent_checks(&[1], 150, 60).unwrap();
        assert_eq!(map[&1].len(), 1);
        assert_eq!(map[&1][0].checked_at, 200);

        assert!(store.recent_checks(&[], 0, 60).unwrap().is_empty());
    }

    #[test]
    fn latency_points_are_inclusive_of_range_end() {
        let (_tmp, store) = test_store();
        insert_monitor(&store, 1, "a", true, 0);
        insert_check(&store, 1, 100, "up", Some(5));
        insert_check(&store, 1, 200, "up", Some(6));
        insert_check(&store, 1, 201, "up", Some(7));

        let points = store.latency_points(1, 100, 200).unwrap();
        let times: Vec<i64> = points.iter().map(|p| p.checked_at).collect();
        assert_eq!(times, vec![100, 200]);
    }

    #[test]
    fn checks_in_window_excludes_the_end() {
        let (_tmp, store) = test_store();
        insert_monitor(&store, 1, "a", true, 0);
        insert_check(&store, 1, 100, "up", None);
        insert_check(&store, 1, 200, "up", None);

        let checks = store.checks_in_window(1, 100, 200).unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].checked_at, 100);
    }

    #[test]
    fn outage_overlap_predicate() {
        let (_tmp, store) = test_store();
        insert_monitor(&store, 1, "a", true, 0);
        let raw = store.raw();
        raw.execute("INSERT INTO outages (monitor_id, started_at, ended_at) VALUES (1, 0, 100)", [])
            .unwrap();
        raw.execute("INSERT INTO outages (monitor_id, started_at, ended_at) VALUES (1, 150, 250)", [])
            .unwrap();
        raw.execute("INSERT INTO outages (monitor_id, started_at, ended_at) VALUES (1, 300, NULL)", [])
            .unwrap();
        raw.execute("INSERT INTO outages (monitor_id, started_at, ended_at) VALUES (1, 500, NULL)", [])
            .unwrap();
        drop(raw);

        // Range [100, 400): the closed outage ending exactly at range
        // start does not overlap; the open outages started before the
        // end do, the one starting at 500 does not.
        let rows = store.outages_overlapping(1, 100, 400).unwrap();
        let starts: Vec<i64> = rows.iter().map(|o| o.started_at).collect();
        assert_eq!(starts, vec![150, 300]);
        assert_eq!(rows[1].ended_at, None);
        assert!(rows.iter().all(|o| o.monitor_id == 1));
    }

    #[test]
    fn unrecognized_check_status_degrades_to_unknown() {
        let (_tmp, store) = test_store();
        insert_monitor(&store, 1, "a", true, 0);
        insert_check(&store, 1, 100, "flapping", Some(1));

        let checks = store.checks_in_window(1, 0, 1_000).unwrap();
        assert_eq!(checks[0].status, CheckStatus::Unknown);
    }
}
