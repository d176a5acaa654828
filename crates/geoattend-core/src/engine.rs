//! Attendance state machine
//!
//! Every operation works on one (employee, day) record and runs its
//! read-modify-write cycle under that key's lock, so a manual action racing
//! a location ping, or a sweep racing either, always sees and leaves a
//! consistent record. Notifications and audit entries are best effort and
//! never undo or fail a transition.

use chrono::{DateTime, Local};
use geoattend_api::{AttendanceOutcome, AttendanceRecord, Notification, Point, StatusTag, Zone};
use geoattend_notify::NotificationSink;
use geoattend_store::{AuditEvent, AuditEventType, Store};
use geoattend_util::{EmployeeId, format_time_of_day};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::policy::{WorkPolicy, resolve_for};
use crate::{AttendanceError, AttendanceResult, KeyLocks, ZoneDirectory};

/// The attendance engine
pub struct AttendanceEngine {
    pub(crate) store: Arc<dyn Store>,
    sink: Arc<dyn NotificationSink>,
    zones: RwLock<ZoneDirectory>,
    pub(crate) locks: KeyLocks,
}

impl AttendanceEngine {
    /// Create a new engine, loading the active zones from the store
    pub fn new(store: Arc<dyn Store>, sink: Arc<dyn NotificationSink>) -> AttendanceResult<Self> {
        let zones = ZoneDirectory::new(store.list_active_zones()?);
        info!(active_zones = zones.len(), "Attendance engine initialized");

        Ok(Self {
            store,
            sink,
            zones: RwLock::new(zones),
            locks: KeyLocks::new(),
        })
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Re-read the active zones from the store. Returns how many are active.
    pub fn reload_zones(&self) -> AttendanceResult<usize> {
        let directory = ZoneDirectory::new(self.store.list_active_zones()?);
        let count = directory.len();

        *self.zones.write().map_err(|_| AttendanceError::LockPoisoned)? = directory;

        debug!(active_zones = count, "Zone directory reloaded");
        Ok(count)
    }

    /// The first active zone containing the point
    pub fn find_zone(&self, point: Point) -> AttendanceResult<Option<Zone>> {
        let zones = self.zones.read().map_err(|_| AttendanceError::LockPoisoned)?;
        Ok(zones.find_containing(point).cloned())
    }

    /// The policy that applies to an employee, if any
    pub fn resolve_policy(&self, employee_id: &EmployeeId) -> AttendanceResult<Option<WorkPolicy>> {
        Ok(resolve_for(self.store.as_ref(), employee_id)?)
    }

    pub(crate) fn notify(&self, notification: Notification) {
        let employee_id = notification.employee_id.clone();
        if let Err(e) = self.sink.notify(notification) {
            warn!(employee_id = %employee_id, error = %e, "Notification delivery failed");
        }
    }

    pub(crate) fn audit(&self, event: AuditEventType, now: DateTime<Local>) {
        if let Err(e) = self.store.append_audit(AuditEvent::at(event, now)) {
            warn!(error = %e, "Failed to append audit event");
        }
    }

    /// Explicit check-in at the caller's position.
    ///
    /// The first check-in of the day is gated by the employee's policy. A
    /// check-in after the latest allowed time is refused and the day is
    /// recorded as absent. A later check-in on the same day reopens the
    /// existing record.
    pub fn manual_check_in(
        &self,
        employee_id: &EmployeeId,
        point: Point,
        accuracy_meters: Option<f32>,
        now: DateTime<Local>,
    ) -> AttendanceResult<AttendanceOutcome> {
        let day = now.date_naive();

        self.locks.with_lock(employee_id, day, || {
            let existing = self.store.get_record(employee_id, day)?;

            if let Some(record) = &existing {
                if record.is_absent() {
                    warn!(employee_id = %employee_id, "Check-in refused: marked absent");
                    return Err(AttendanceError::MarkedAbsent);
                }
                if record.is_open() {
                    warn!(employee_id = %employee_id, "Check-in refused: already checked in");
                    return Err(AttendanceError::AlreadyCheckedIn);
                }
            }

            // Inactive zones are not in the directory
            let Some(zone) = self.find_zone(point)? else {
                warn!(
                    employee_id = %employee_id,
                    lat = point.lat,
                    lng = point.lng,
                    "Check-in refused: outside designated area"
                );
                return Err(AttendanceError::OutsideZone);
            };

            let first_of_day = existing.as_ref().is_none_or(|r| !r.has_checked_in());
            if first_of_day && let Some(policy) = self.resolve_policy(employee_id)? {
                let time = now.time();

                let earliest = policy.earliest_check_in();
                if time < earliest {
                    debug!(
                        employee_id = %employee_id,
                        earliest = %format_time_of_day(earliest),
                        "Check-in refused: too early"
                    );
                    return Err(AttendanceError::TooEarly { earliest });
                }

                let latest = policy.latest_check_in();
                if time > latest {
                    let absent = AttendanceRecord::absent(employee_id.clone(), day);
                    self.store.save_record(&absent)?;
                    self.audit(
                        AuditEventType::MarkedAbsent {
                            employee_id: employee_id.clone(),
                            day,
                        },
                        now,
                    );
                    info!(
                        employee_id = %employee_id,
                        deadline = %format_time_of_day(latest),
                        "Check-in after deadline, marked absent"
                    );
                    return Err(AttendanceError::DeadlinePassed { deadline: latest });
                }
            }

            let record = match existing {
                Some(mut record) if record.has_checked_in() => {
                    record.reopen(point, accuracy_meters);
                    record
                }
                _ => AttendanceRecord::checked_in(
                    employee_id.clone(),
                    zone.id.clone(),
                    now,
                    point,
                    accuracy_meters,
                ),
            };
            self.store.save_record(&record)?;

            self.audit(
                AuditEventType::CheckedIn {
                    employee_id: employee_id.clone(),
                    record_id: record.id.clone(),
                    zone_id: zone.id.clone(),
                },
                now,
            );
            info!(employee_id = %employee_id, zone = %zone.name, "Manual check-in");
            self.notify(Notification::check_in(employee_id.clone(), now, &zone.name));

            Ok(AttendanceOutcome::new(StatusTag::CheckedIn, format!("Checked in at {}", zone.name))
                .with_zone(zone.name)
                .with_record(record))
        })
    }

    /// Explicit check-out of the day's open record
    pub fn manual_check_out(
        &self,
        employee_id: &EmployeeId,
        point: Point,
        accuracy_meters: Option<f32>,
        now: DateTime<Local>,
    ) -> AttendanceResult<AttendanceOutcome> {
        let day = now.date_naive();

        self.locks.with_lock(employee_id, day, || {
            let Some(mut record) = self
                .store
                .get_record(employee_id, day)?
                .filter(AttendanceRecord::is_open)
            else {
                warn!(employee_id = %employee_id, "No active check-in found");
                return Err(AttendanceError::NoActiveCheckIn);
            };

            if let Some(policy) = self.resolve_policy(employee_id)?
                && let Some(earliest) = policy.earliest_check_out()
                && now.time() < earliest
            {
                debug!(
                    employee_id = %employee_id,
                    earliest = %format_time_of_day(earliest),
                    "Check-out refused: too early"
                );
                return Err(AttendanceError::CheckOutTooEarly { earliest });
            }

            record.close(now, Some(point), accuracy_meters);
            self.store.save_record(&record)?;

            self.audit(
                AuditEventType::CheckedOut {
                    employee_id: employee_id.clone(),
                    record_id: record.id.clone(),
                },
                now,
            );
            info!(employee_id = %employee_id, "Manual check-out");
            self.notify(Notification::check_out(employee_id.clone(), now));

            Ok(AttendanceOutcome::new(StatusTag::CheckedOut, "Checked out").with_record(record))
        })
    }

    /// Passive position report.
    ///
    /// Never performs the first check-in of the day. After that, entering a
    /// zone reopens a closed record and leaving all zones closes an open
    /// one. Repeating a ping in the same state changes nothing.
    pub fn process_location_update(
        &self,
        employee_id: &EmployeeId,
        point: Point,
        accuracy_meters: Option<f32>,
        now: DateTime<Local>,
    ) -> AttendanceResult<AttendanceOutcome> {
        let day = now.date_naive();

        self.locks.with_lock(employee_id, day, || {
            let existing = self.store.get_record(employee_id, day)?;

            if let Some(record) = existing.as_ref().filter(|r| r.is_absent()) {
                return Ok(AttendanceOutcome::new(
                    StatusTag::Absent,
                    "You have been marked absent for today",
                )
                .with_record(record.clone()));
            }

            let zone = self.find_zone(point)?;

            let Some(mut record) = existing.filter(AttendanceRecord::has_checked_in) else {
                return Ok(match zone {
                    Some(zone) => AttendanceOutcome::new(
                        StatusTag::AwaitingFirstCheckin,
                        format!("You are at {}. Check in to start your day.", zone.name),
                    )
                    .with_zone(zone.name),
                    None => AttendanceOutcome::new(
                        StatusTag::Outside,
                        "You are outside all designated areas",
                    ),
                });
            };

            match zone {
                Some(zone) if record.is_open() => {
                    Ok(AttendanceOutcome::new(StatusTag::CheckedIn, format!("Inside {}", zone.name))
                        .with_zone(zone.name)
                        .with_record(record))
                }
                Some(zone) => {
                    record.reopen(point, accuracy_meters);
                    self.store.save_record(&record)?;

                    self.audit(
                        AuditEventType::AutoCheckedIn {
                            employee_id: employee_id.clone(),
                            record_id: record.id.clone(),
                            zone_id: zone.id.clone(),
                        },
                        now,
                    );
                    info!(employee_id = %employee_id, zone = %zone.name, "Auto check-in on re-entry");
                    self.notify(Notification::check_in(employee_id.clone(), now, &zone.name));

                    Ok(AttendanceOutcome::new(
                        StatusTag::AutoCheckedIn,
                        format!("Welcome back to {}", zone.name),
                    )
                    .with_zone(zone.name)
                    .with_record(record))
                }
                None if record.is_open() => {
                    record.close(now, Some(point), accuracy_meters);
                    self.store.save_record(&record)?;

                    self.audit(
                        AuditEventType::AutoCheckedOut {
                            employee_id: employee_id.clone(),
                            record_id: record.id.clone(),
                        },
                        now,
                    );
                    info!(employee_id = %employee_id, "Auto check-out on exit");
                    self.notify(Notification::check_out(employee_id.clone(), now));

                    Ok(AttendanceOutcome::new(
                        StatusTag::AutoCheckedOut,
                        "You left the designated area and were checked out",
                    )
                    .with_record(record))
                }
                None => Ok(AttendanceOutcome::new(StatusTag::CheckedOut, "Checked out").with_record(record)),
            }
        })
    }
}
