//! Per-employee subscriber registry

use geoattend_api::Notification;
use geoattend_util::EmployeeId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

use crate::{NotificationSink, NotifyResult};

#[derive(Default)]
struct Subscribers {
    by_employee: HashMap<EmployeeId, Vec<mpsc::UnboundedSender<Notification>>>,
    /// Receives every notification (manager dashboards)
    broadcast: Vec<mpsc::UnboundedSender<Notification>>,
}

/// Fans notifications out to live subscribers.
///
/// Subscribers whose receiver was dropped are pruned on the next delivery.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<Subscribers>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        // Subscriber lists stay consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive notifications addressed to one employee
    pub fn subscribe(&self, employee_id: EmployeeId) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().by_employee.entry(employee_id).or_default().push(tx);
        rx
    }

    /// Receive every notification
    pub fn subscribe_all(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().broadcast.push(tx);
        rx
    }

    /// Deliver a notification, returning how many subscribers received it
    pub fn deliver(&self, notification: &Notification) -> usize {
        let mut subs = self.lock();
        let mut delivered = 0;

        if let Some(senders) = subs.by_employee.get_mut(&notification.employee_id) {
            senders.retain(|tx| tx.send(notification.clone()).is_ok());
            delivered += senders.len();
            if senders.is_empty() {
                subs.by_employee.remove(&notification.employee_id);
            }
        }

        subs.broadcast
            .retain(|tx| tx.send(notification.clone()).is_ok());
        delivered += subs.broadcast.len();

        debug!(
            employee_id = %notification.employee_id,
            delivered,
            "Notification delivered"
        );
        delivered
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        let subs = self.lock();
        subs.by_employee.values().map(Vec::len).sum::<usize>() + subs.broadcast.len()
    }
}

impl NotificationSink for SessionRegistry {
    fn notify(&self, notification: Notification) -> NotifyResult<()> {
        self.deliver(&notification);
        Ok(())
    }
}
