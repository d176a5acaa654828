//! Periodic sweeps over all employees
//!
//! A sweep takes each (employee, day) lock in turn and re-reads the record
//! under it. A failure for one employee is logged and counted, and the sweep
//! moves on to the next one.

use chrono::{DateTime, Local, NaiveTime};
use geoattend_api::{AttendanceRecord, Notification};
use geoattend_store::AuditEventType;
use geoattend_util::{EmployeeId, format_time_of_day, local_datetime};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{AttendanceEngine, AttendanceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    Absence,
    LateArrivals,
    AutoCheckOut,
}

impl SweepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepKind::Absence => "absence",
            SweepKind::LateArrivals => "late_arrivals",
            SweepKind::AutoCheckOut => "auto_check_out",
        }
    }
}

/// What a sweep did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub sweep: SweepKind,
    /// Employees or records looked at
    pub examined: usize,
    /// Records written
    pub changed: usize,
    /// Employees skipped because of an error
    pub failed: usize,
}

impl SweepReport {
    fn new(sweep: SweepKind) -> Self {
        Self {
            sweep,
            examined: 0,
            changed: 0,
            failed: 0,
        }
    }

    fn record_failure(&mut self, employee_id: &EmployeeId, e: &dyn std::error::Error) {
        self.failed += 1;
        error!(
            sweep = self.sweep.as_str(),
            employee_id = %employee_id,
            error = %e,
            "Sweep failed for employee"
        );
    }
}

impl AttendanceEngine {
    fn finish_sweep(&self, report: SweepReport, now: DateTime<Local>) -> SweepReport {
        if report.changed == 0 && report.failed == 0 {
            debug!(sweep = report.sweep.as_str(), examined = report.examined, "Sweep found nothing to do");
            return report;
        }

        info!(
            sweep = report.sweep.as_str(),
            examined = report.examined,
            changed = report.changed,
            failed = report.failed,
            "Sweep completed"
        );
        self.audit(
            AuditEventType::SweepCompleted {
                sweep: report.sweep.as_str().to_string(),
                examined: report.examined,
                changed: report.changed,
                failed: report.failed,
            },
            now,
        );
        report
    }

    /// Record an absence for every member of a team whose check-in deadline
    /// has passed and who has no record today. Existing records are never
    /// touched, so repeating the sweep changes nothing.
    pub fn mark_absent_sweep(&self, now: DateTime<Local>) -> AttendanceResult<SweepReport> {
        let day = now.date_naive();
        let time = now.time();
        let mut report = SweepReport::new(SweepKind::Absence);

        for team in self.store.list_teams()? {
            let Some(deadline) = team.work_hours.check_in_deadline else {
                continue;
            };
            if time <= deadline {
                continue;
            }

            for employee_id in &team.employee_ids {
                report.examined += 1;

                let inserted = self.locks.with_lock(employee_id, day, || {
                    let absent = AttendanceRecord::absent(employee_id.clone(), day);
                    Ok(self.store.insert_record_if_missing(&absent)?)
                });

                match inserted {
                    Ok(true) => {
                        report.changed += 1;
                        info!(
                            employee_id = %employee_id,
                            team_id = %team.id,
                            deadline = %format_time_of_day(deadline),
                            "Marked absent"
                        );
                        self.audit(
                            AuditEventType::MarkedAbsent {
                                employee_id: employee_id.clone(),
                                day,
                            },
                            now,
                        );
                    }
                    Ok(false) => {}
                    Err(e) => report.record_failure(employee_id, &e),
                }
            }
        }

        Ok(self.finish_sweep(report, now))
    }

    /// Flag today's records whose check-in came after the threshold.
    ///
    /// Records already flagged, or ABSENT, are left alone. The flag outlives
    /// check-out and re-entry, so each arrival is notified at most once.
    pub fn detect_late_arrivals(
        &self,
        threshold: NaiveTime,
        now: DateTime<Local>,
    ) -> AttendanceResult<SweepReport> {
        let day = now.date_naive();
        let mut report = SweepReport::new(SweepKind::LateArrivals);

        let is_late = |record: &AttendanceRecord| {
            !record.late
                && !record.is_absent()
                && record.check_in_time.is_some_and(|t| t.time() > threshold)
        };

        for candidate in self.store.list_records_for_day(day)? {
            if !is_late(&candidate) {
                continue;
            }
            report.examined += 1;
            let employee_id = &candidate.employee_id;

            // The record may have changed since it was listed
            let flagged = self.locks.with_lock(employee_id, day, || {
                let Some(mut record) = self.store.get_record(employee_id, day)? else {
                    return Ok(None);
                };
                if !is_late(&record) {
                    return Ok(None);
                }
                record.mark_late();
                self.store.save_record(&record)?;
                Ok(Some(record))
            });

            match flagged {
                Ok(Some(record)) => {
                    report.changed += 1;
                    info!(employee_id = %employee_id, "Late arrival");
                    self.audit(
                        AuditEventType::MarkedLate {
                            employee_id: employee_id.clone(),
                            record_id: record.id.clone(),
                        },
                        now,
                    );
                    let arrived = record.check_in_time.unwrap_or(now);
                    self.notify(Notification::late(employee_id.clone(), arrived));
                }
                Ok(None) => {}
                Err(e) => report.record_failure(employee_id, &e),
            }
        }

        Ok(self.finish_sweep(report, now))
    }

    /// Close every open record of teams whose end time has passed.
    ///
    /// The check-out time recorded is the configured end of the day, not the
    /// moment the sweep ran.
    pub fn auto_check_out_past_work_hours(&self, now: DateTime<Local>) -> AttendanceResult<SweepReport> {
        let day = now.date_naive();
        let mut report = SweepReport::new(SweepKind::AutoCheckOut);

        for team in self.store.list_teams()? {
            let Some(end) = team.work_hours.end else {
                continue;
            };
            if now.time() <= end {
                continue;
            }

            let end_of_day = local_datetime(day, end).unwrap_or_else(|| {
                warn!(team_id = %team.id, end = %format_time_of_day(end), "End time does not exist today, using now");
                now
            });

            for employee_id in &team.employee_ids {
                report.examined += 1;

                let closed = self.locks.with_lock(employee_id, day, || {
                    let Some(mut record) = self
                        .store
                        .get_record(employee_id, day)?
                        .filter(AttendanceRecord::is_open)
                    else {
                        return Ok(None);
                    };

                    let at = match record.check_in_time {
                        Some(check_in) if check_in > end_of_day => check_in,
                        _ => end_of_day,
                    };
                    record.close(at, None, None);
                    self.store.save_record(&record)?;
                    Ok(Some(record))
                });

                match closed {
                    Ok(Some(record)) => {
                        report.changed += 1;
                        info!(employee_id = %employee_id, team_id = %team.id, "Forced check-out at end of work hours");
                        if let Some(at) = record.check_out_time {
                            self.audit(
                                AuditEventType::ForcedCheckOut {
                                    employee_id: employee_id.clone(),
                                    record_id: record.id.clone(),
                                    at,
                                },
                                now,
                            );
                        }
                    }
                    Ok(None) => {}
                    Err(e) => report.record_failure(employee_id, &e),
                }
            }
        }

        Ok(self.finish_sweep(report, now))
    }
}
