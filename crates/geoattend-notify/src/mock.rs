//! Recording sink for testing

use geoattend_api::{Notification, NotificationPayload};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{NotificationSink, NotifyError, NotifyResult};

/// Sink that keeps every notification it accepts
#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<Notification>>>,

    /// Configure delivery to fail
    pub fail: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delivery fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap_or_else(PoisonError::into_inner) = failing;
    }

    /// Notifications accepted so far
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Payloads accepted so far, in order
    pub fn payloads(&self) -> Vec<NotificationPayload> {
        self.sent().into_iter().map(|n| n.payload).collect()
    }

    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) -> NotifyResult<()> {
        if *self.fail.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(NotifyError::Rejected("Mock delivery failure".into()));
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
        Ok(())
    }
}
