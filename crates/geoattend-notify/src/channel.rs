//! Channel-backed sink

use geoattend_api::Notification;
use tokio::sync::mpsc;

use crate::{NotificationSink, NotifyError, NotifyResult};

/// Sink that forwards notifications into an unbounded tokio channel.
///
/// The engine runs synchronously; the receiving half is drained by an async
/// task in the service.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) -> NotifyResult<()> {
        self.tx
            .send(notification)
            .map_err(|_| NotifyError::ChannelClosed)
    }

    fn is_healthy(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoattend_util::EmployeeId;

    #[tokio::test]
    async fn forwards_to_receiver() {
        let (sink, mut rx) = ChannelSink::new();
        let n = Notification::check_in(EmployeeId::new("e1"), geoattend_util::now(), "HQ");

        sink.notify(n.clone()).unwrap();
        assert_eq!(rx.recv().await, Some(n));
    }

    #[tokio::test]
    async fn closed_channel_is_an_error() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        assert!(!sink.is_healthy());
        let n = Notification::late(EmployeeId::new("e1"), geoattend_util::now());
        assert!(matches!(sink.notify(n), Err(NotifyError::ChannelClosed)));
    }
}
