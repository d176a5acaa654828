//! Notification sink trait

use geoattend_api::Notification;
use thiserror::Error;

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Destination for engine notifications.
///
/// Callers treat delivery as best effort: an `Err` is logged and dropped,
/// never propagated into the attendance operation that produced it.
pub trait NotificationSink: Send + Sync {
    /// Hand off a notification for delivery
    fn notify(&self, notification: Notification) -> NotifyResult<()>;

    /// Optional: check if the sink can still deliver
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Sink that only logs, for running without any subscribers
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) -> NotifyResult<()> {
        tracing::info!(
            employee_id = %notification.employee_id,
            title = notification.title(),
            message = %notification.message(),
            "Notification"
        );
        Ok(())
    }
}
