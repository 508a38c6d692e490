//! In-process notification bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use servicedb_domain::error::ServiceDbError;
use servicedb_domain::notification::NotificationEvent;

use crate::ports::NotificationPublisher;

/// Notification channel using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Slow subscribers lag instead of
/// blocking the publisher.
#[derive(Clone)]
pub struct InProcessNotificationBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl InProcessNotificationBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to notifications on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl NotificationPublisher for InProcessNotificationBus {
    fn publish(
        &self,
        event: NotificationEvent,
    ) -> impl Future<Output = Result<(), ServiceDbError>> + Send {
        // broadcast::send fails only when there are zero receivers,
        // which is fine, so we simply ignore the error.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}
