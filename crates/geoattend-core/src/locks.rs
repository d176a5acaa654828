//! Per-(employee, day) mutual exclusion

use chrono::NaiveDate;
use geoattend_util::EmployeeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{AttendanceError, AttendanceResult};

type Key = (EmployeeId, NaiveDate);

/// Serializes read-modify-write cycles on one attendance record.
///
/// Different keys never contend. Idle locks for days before the newest day
/// seen are dropped when a new key is created, so nothing is held across days.
#[derive(Default)]
pub struct KeyLocks {
    slots: Mutex<HashMap<Key, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, employee_id: &EmployeeId, day: NaiveDate) -> AttendanceResult<Arc<Mutex<()>>> {
        let mut slots = self.slots.lock().map_err(|_| AttendanceError::LockPoisoned)?;

        let key = (employee_id.clone(), day);
        if let Some(slot) = slots.get(&key) {
            return Ok(Arc::clone(slot));
        }

        // A slot still referenced elsewhere is in use and must survive
        slots.retain(|(_, d), slot| *d >= day || Arc::strong_count(slot) > 1);
        let slot = Arc::new(Mutex::new(()));
        slots.insert(key, Arc::clone(&slot));
        Ok(slot)
    }

    /// Run `f` while holding the lock for (employee, day)
    pub fn with_lock<T>(
        &self,
        employee_id: &EmployeeId,
        day: NaiveDate,
        f: impl FnOnce() -> AttendanceResult<T>,
    ) -> AttendanceResult<T> {
        let slot = self.slot(employee_id, day)?;
        let _guard = slot.lock().map_err(|_| AttendanceError::LockPoisoned)?;
        f()
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn same_key_is_serialized() {
        let locks = Arc::new(KeyLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    locks
                        .with_lock(&EmployeeId::new("e1"), day(2), || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(5));
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn old_days_are_pruned() {
        let locks = KeyLocks::new();
        locks.with_lock(&EmployeeId::new("e1"), day(1), || Ok(())).unwrap();
        locks.with_lock(&EmployeeId::new("e2"), day(1), || Ok(())).unwrap();
        assert_eq!(locks.len(), 2);

        locks.with_lock(&EmployeeId::new("e1"), day(2), || Ok(())).unwrap();
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn errors_pass_through() {
        let locks = KeyLocks::new();
        let result: AttendanceResult<()> =
            locks.with_lock(&EmployeeId::new("e1"), day(1), || Err(AttendanceError::NoActiveCheckIn));
        assert!(matches!(result, Err(AttendanceError::NoActiveCheckIn)));
    }
}
