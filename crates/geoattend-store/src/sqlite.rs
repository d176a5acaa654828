//! SQLite-based store implementation

use chrono::{DateTime, Local, NaiveDate};
use geoattend_api::{AttendanceRecord, Team, Zone};
use geoattend_util::{EmployeeId, TeamId, ZoneId};
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, Store, StoreError, StoreResult};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            -- Zones; seq preserves creation order across updates
            CREATE TABLE IF NOT EXISTS zones (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL UNIQUE,
                active INTEGER NOT NULL,
                zone_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS teams (
                id TEXT PRIMARY KEY,
                team_json TEXT NOT NULL
            );

            -- An employee belongs to at most one team
            CREATE TABLE IF NOT EXISTS team_members (
                employee_id TEXT PRIMARY KEY,
                team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE
            );

            -- At most one record per employee per day
            CREATE TABLE IF NOT EXISTS attendance (
                employee_id TEXT NOT NULL,
                day TEXT NOT NULL,
                status TEXT NOT NULL,
                record_json TEXT NOT NULL,
                PRIMARY KEY (employee_id, day)
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_attendance_day ON attendance(day);
            CREATE INDEX IF NOT EXISTS idx_team_members_team ON team_members(team_id);
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

fn decode_all<T: DeserializeOwned>(rows: Vec<String>) -> StoreResult<Vec<T>> {
    rows.iter()
        .map(|json| serde_json::from_str(json).map_err(StoreError::from))
        .collect()
}

fn query_json(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

impl Store for SqliteStore {
    fn get_zone(&self, id: &ZoneId) -> StoreResult<Option<Zone>> {
        let conn = self.lock()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT zone_json FROM zones WHERE id = ?",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        let conn = self.lock()?;
        let rows = query_json(&conn, "SELECT zone_json FROM zones ORDER BY seq", [])?;
        decode_all(rows)
    }

    fn list_active_zones(&self) -> StoreResult<Vec<Zone>> {
        let conn = self.lock()?;
        let rows = query_json(
            &conn,
            "SELECT zone_json FROM zones WHERE active = 1 ORDER BY seq",
            [],
        )?;
        decode_all(rows)
    }

    fn upsert_zone(&self, zone: &Zone) -> StoreResult<()> {
        let conn = self.lock()?;
        let json = serde_json::to_string(zone)?;

        conn.execute(
            r#"
            INSERT INTO zones (id, seq, active, zone_json)
            VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM zones), ?2, ?3)
            ON CONFLICT(id)
            DO UPDATE SET active = excluded.active, zone_json = excluded.zone_json
            "#,
            params![zone.id.as_str(), zone.active, json],
        )?;

        debug!(zone_id = %zone.id, active = zone.active, "Zone saved");
        Ok(())
    }

    fn delete_zone(&self, id: &ZoneId) -> StoreResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM zones WHERE id = ?", [id.as_str()])?;
        Ok(deleted > 0)
    }

    fn get_team(&self, id: &TeamId) -> StoreResult<Option<Team>> {
        let conn = self.lock()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT team_json FROM teams WHERE id = ?",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    fn team_for_employee(&self, employee_id: &EmployeeId) -> StoreResult<Option<Team>> {
        let conn = self.lock()?;

        let json: Option<String> = conn
            .query_row(
                r#"
                SELECT t.team_json FROM team_members m
                JOIN teams t ON t.id = m.team_id
                WHERE m.employee_id = ?
                "#,
                [employee_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let conn = self.lock()?;
        let rows = query_json(&conn, "SELECT team_json FROM teams ORDER BY id", [])?;
        decode_all(rows)
    }

    fn upsert_team(&self, team: &Team) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let json = serde_json::to_string(team)?;

        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO teams (id, team_json)
            VALUES (?, ?)
            ON CONFLICT(id)
            DO UPDATE SET team_json = excluded.team_json
            "#,
            params![team.id.as_str(), json],
        )?;
        tx.execute("DELETE FROM team_members WHERE team_id = ?", [team.id.as_str()])?;
        for employee_id in &team.employee_ids {
            tx.execute(
                "INSERT INTO team_members (employee_id, team_id) VALUES (?, ?)",
                params![employee_id.as_str(), team.id.as_str()],
            )?;
        }
        tx.commit()?;

        debug!(team_id = %team.id, members = team.employee_ids.len(), "Team saved");
        Ok(())
    }

    fn replace_teams(&self, teams: &[Team]) -> StoreResult<()> {
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM team_members", [])?;
        tx.execute("DELETE FROM teams", [])?;
        for team in teams {
            tx.execute(
                "INSERT INTO teams (id, team_json) VALUES (?, ?)",
                params![team.id.as_str(), serde_json::to_string(team)?],
            )?;
            for employee_id in &team.employee_ids {
                tx.execute(
                    "INSERT INTO team_members (employee_id, team_id) VALUES (?, ?)",
                    params![employee_id.as_str(), team.id.as_str()],
                )?;
            }
        }
        tx.commit()?;

        debug!(teams = teams.len(), "Teams replaced");
        Ok(())
    }

    fn get_record(&self, employee_id: &EmployeeId, day: NaiveDate) -> StoreResult<Option<AttendanceRecord>> {
        let conn = self.lock()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM attendance WHERE employee_id = ? AND day = ?",
                params![employee_id.as_str(), day_key(day)],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    fn save_record(&self, record: &AttendanceRecord) -> StoreResult<()> {
        let conn = self.lock()?;
        let json = serde_json::to_string(record)?;

        conn.execute(
            r#"
            INSERT INTO attendance (employee_id, day, status, record_json)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(employee_id, day)
            DO UPDATE SET status = excluded.status, record_json = excluded.record_json
            "#,
            params![
                record.employee_id.as_str(),
                day_key(record.day),
                record.status.as_str(),
                json
            ],
        )?;

        debug!(
            employee_id = %record.employee_id,
            day = %record.day,
            status = %record.status,
            "Attendance record saved"
        );
        Ok(())
    }

    fn insert_record_if_missing(&self, record: &AttendanceRecord) -> StoreResult<bool> {
        let conn = self.lock()?;
        let json = serde_json::to_string(record)?;

        let inserted = conn.execute(
            r#"
            INSERT INTO attendance (employee_id, day, status, record_json)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(employee_id, day) DO NOTHING
            "#,
            params![
                record.employee_id.as_str(),
                day_key(record.day),
                record.status.as_str(),
                json
            ],
        )?;

        Ok(inserted > 0)
    }

    fn list_records_for_day(&self, day: NaiveDate) -> StoreResult<Vec<AttendanceRecord>> {
        let conn = self.lock()?;
        let rows = query_json(
            &conn,
            "SELECT record_json FROM attendance WHERE day = ? ORDER BY employee_id",
            [day_key(day)],
        )?;
        decode_all(rows)
    }

    fn list_records_in_range(
        &self,
        employee_id: &EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let conn = self.lock()?;
        let rows = query_json(
            &conn,
            r#"
            SELECT record_json FROM attendance
            WHERE employee_id = ? AND day >= ? AND day <= ?
            ORDER BY day
            "#,
            params![employee_id.as_str(), day_key(start), day_key(end)],
        )?;
        decode_all(rows)
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.lock()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| geoattend_util::now());
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
