//! Notification port: publish change events to unrelated subscribers.

use std::future::Future;

use servicedb_domain::error::ServiceDbError;
use servicedb_domain::notification::NotificationEvent;

/// Publishes [`NotificationEvent`]s on the notification channel.
///
/// Implementations must not wait for subscribers.
pub trait NotificationPublisher {
    /// Publish an event to all current subscribers.
    fn publish(
        &self,
        event: NotificationEvent,
    ) -> impl Future<Output = Result<(), ServiceDbError>> + Send;
}

impl<T: NotificationPublisher + Send + Sync> NotificationPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: NotificationEvent,
    ) -> impl Future<Output = Result<(), ServiceDbError>> + Send {
        (**self).publish(event)
    }
}
