//! Zone and team administration, plus read-only queries

use chrono::{DateTime, Local, NaiveDate};
use geoattend_api::{AttendanceRecord, Team, WorkHours, Zone, ZoneShape};
use geoattend_store::{AuditEvent, AuditEventType};
use geoattend_util::{EmployeeId, TeamId, ZoneId};
use tracing::info;

use crate::policy::WorkPolicy;
use crate::{
    AttendanceEngine, AttendanceError, AttendanceReport, AttendanceResult, AttendanceStatistics,
    TeamMemberStatus, WorkHoursView,
};

fn validate_zone(zone: &Zone) -> AttendanceResult<()> {
    if zone.name.trim().is_empty() {
        return Err(AttendanceError::InvalidZone("name cannot be empty".into()));
    }

    match &zone.shape {
        ZoneShape::Circle { center, radius_meters } => {
            if !center.is_valid() {
                return Err(AttendanceError::InvalidZone("center is out of range".into()));
            }
            if *radius_meters == 0 {
                return Err(AttendanceError::InvalidZone("radius must be positive".into()));
            }
        }
        ZoneShape::Polygon { vertices } => {
            if vertices.len() < 3 {
                return Err(AttendanceError::InvalidZone(format!(
                    "polygon needs at least 3 vertices, got {}",
                    vertices.len()
                )));
            }
            if let Some(i) = vertices.iter().position(|v| !v.is_valid()) {
                return Err(AttendanceError::InvalidZone(format!("vertex {} is out of range", i)));
            }
        }
    }

    Ok(())
}

impl AttendanceEngine {
    /// Load zones and teams from configuration.
    ///
    /// Zones are upserted, keeping the creation time and order of zones
    /// already known. Teams replace whatever the store held.
    pub fn seed(&self, zones: &[Zone], teams: &[Team], now: DateTime<Local>) -> AttendanceResult<()> {
        for zone in zones {
            validate_zone(zone)?;

            let mut zone = zone.clone();
            if let Some(existing) = self.store.get_zone(&zone.id)? {
                zone.created_at = existing.created_at;
            }
            self.store.upsert_zone(&zone)?;
        }
        self.store.replace_teams(teams)?;
        let active = self.reload_zones()?;

        info!(zones = zones.len(), active_zones = active, teams = teams.len(), "Seeded from configuration");
        self.audit(
            AuditEventType::ConfigSeeded {
                zone_count: zones.len(),
                team_count: teams.len(),
            },
            now,
        );
        Ok(())
    }

    /// Zone by id, active or not
    pub fn get_zone(&self, id: &ZoneId) -> AttendanceResult<Zone> {
        self.store
            .get_zone(id)?
            .ok_or_else(|| AttendanceError::ZoneNotFound(id.clone()))
    }

    /// Every zone in creation order, active or not
    pub fn list_zones(&self) -> AttendanceResult<Vec<Zone>> {
        Ok(self.store.list_zones()?)
    }

    pub fn create_zone(&self, mut zone: Zone, now: DateTime<Local>) -> AttendanceResult<Zone> {
        validate_zone(&zone)?;
        if self.store.get_zone(&zone.id)?.is_some() {
            return Err(AttendanceError::ZoneExists(zone.id));
        }

        zone.created_at = now;
        self.save_zone(&zone, now)?;
        Ok(zone)
    }

    /// Replace a zone's definition. Its creation time and position in the
    /// matching order are kept.
    pub fn update_zone(&self, mut zone: Zone, now: DateTime<Local>) -> AttendanceResult<Zone> {
        validate_zone(&zone)?;
        let existing = self.get_zone(&zone.id)?;

        zone.created_at = existing.created_at;
        self.save_zone(&zone, now)?;
        Ok(zone)
    }

    pub fn set_zone_active(&self, id: &ZoneId, active: bool, now: DateTime<Local>) -> AttendanceResult<Zone> {
        let mut zone = self.get_zone(id)?;
        zone.active = active;
        self.save_zone(&zone, now)?;
        Ok(zone)
    }

    pub fn delete_zone(&self, id: &ZoneId, now: DateTime<Local>) -> AttendanceResult<()> {
        if !self.store.delete_zone(id)? {
            return Err(AttendanceError::ZoneNotFound(id.clone()));
        }
        self.reload_zones()?;

        info!(zone_id = %id, "Zone deleted");
        self.audit(AuditEventType::ZoneDeleted { zone_id: id.clone() }, now);
        Ok(())
    }

    fn save_zone(&self, zone: &Zone, now: DateTime<Local>) -> AttendanceResult<()> {
        self.store.upsert_zone(zone)?;
        self.reload_zones()?;

        info!(zone_id = %zone.id, name = %zone.name, active = zone.active, "Zone saved");
        self.audit(
            AuditEventType::ZoneSaved {
                zone_id: zone.id.clone(),
                active: zone.active,
            },
            now,
        );
        Ok(())
    }

    pub fn get_team(&self, id: &TeamId) -> AttendanceResult<Team> {
        self.store
            .get_team(id)?
            .ok_or_else(|| AttendanceError::TeamNotFound(id.clone()))
    }

    /// Replace a team's work hours. Takes effect on the next operation.
    pub fn set_work_hours(&self, team_id: &TeamId, hours: WorkHours, now: DateTime<Local>) -> AttendanceResult<Team> {
        hours.check_consistency().map_err(AttendanceError::InvalidWorkHours)?;

        let mut team = self.get_team(team_id)?;
        team.work_hours = hours;
        self.store.upsert_team(&team)?;

        info!(team_id = %team_id, "Work hours updated");
        self.audit(AuditEventType::WorkHoursUpdated { team_id: team_id.clone() }, now);
        Ok(team)
    }

    /// The employee's work hours and the boundaries derived from them
    pub fn work_hours_view(&self, employee_id: &EmployeeId) -> AttendanceResult<WorkHoursView> {
        let Some(team) = self.store.team_for_employee(employee_id)? else {
            return Ok(WorkHoursView::unconfigured("You are not assigned to any team"));
        };

        let Some(policy) = WorkPolicy::from_hours(&team.work_hours) else {
            return Ok(WorkHoursView {
                team_id: Some(team.id),
                team_name: Some(team.name),
                ..WorkHoursView::unconfigured("Work hours are not configured for your team")
            });
        };

        Ok(WorkHoursView {
            configured: true,
            message: None,
            team_id: Some(team.id),
            team_name: Some(team.name),
            hours: Some(team.work_hours),
            earliest_check_in: Some(policy.earliest_check_in()),
            latest_check_in: Some(policy.latest_check_in()),
            earliest_check_out: policy.earliest_check_out(),
        })
    }

    pub fn today_record(&self, employee_id: &EmployeeId, now: DateTime<Local>) -> AttendanceResult<Option<AttendanceRecord>> {
        Ok(self.store.get_record(employee_id, now.date_naive())?)
    }

    /// Records in the inclusive range, oldest first
    pub fn history(
        &self,
        employee_id: &EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        if start > end {
            return Err(AttendanceError::InvalidRange { start, end });
        }
        Ok(self.store.list_records_in_range(employee_id, start, end)?)
    }

    pub fn statistics(
        &self,
        employee_id: &EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AttendanceResult<AttendanceStatistics> {
        let records = self.history(employee_id, start, end)?;
        Ok(AttendanceStatistics::compute(&records, start, end))
    }

    pub fn report(
        &self,
        employee_id: &EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Local>,
    ) -> AttendanceResult<AttendanceReport> {
        let records = self.history(employee_id, start, end)?;
        let statistics = AttendanceStatistics::compute(&records, start, end);

        Ok(AttendanceReport {
            employee_id: employee_id.clone(),
            start,
            end,
            records,
            statistics,
            generated_at: now,
        })
    }

    /// Today's status of every member of the teams a manager leads
    pub fn team_status(&self, manager_id: &EmployeeId, now: DateTime<Local>) -> AttendanceResult<Vec<TeamMemberStatus>> {
        let day = now.date_naive();
        let mut statuses = Vec::new();

        for team in self.store.list_teams()? {
            if team.manager_id.as_ref() != Some(manager_id) {
                continue;
            }
            for employee_id in &team.employee_ids {
                let record = self.store.get_record(employee_id, day)?;
                statuses.push(TeamMemberStatus::from_record(
                    employee_id.clone(),
                    team.id.clone(),
                    record.as_ref(),
                ));
            }
        }

        Ok(statuses)
    }

    /// Most recent audit events, newest first
    pub fn recent_audits(&self, limit: usize) -> AttendanceResult<Vec<AuditEvent>> {
        Ok(self.store.get_recent_audits(limit)?)
    }
}
