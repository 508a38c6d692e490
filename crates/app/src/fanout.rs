//! Notification fan-out: turns dispatched operations into broadcast events.

use servicedb_domain::domain_id::DomainId;
use servicedb_domain::notification::{NotificationEvent, OperationKind};

use crate::ports::NotificationPublisher;

/// When an operation produces a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationPolicy {
    /// Notify after every dispatched operation, whatever its outcome.
    #[default]
    Always,
    /// Notify only after operations that succeeded.
    OnSuccess,
}

/// Emits one [`NotificationEvent`] per dispatched operation, fire-and-forget.
pub struct NotificationFanout<P> {
    publisher: P,
    policy: NotificationPolicy,
}

impl<P: NotificationPublisher> NotificationFanout<P> {
    pub fn new(publisher: P, policy: NotificationPolicy) -> Self {
        Self { publisher, policy }
    }

    #[must_use]
    pub fn policy(&self) -> NotificationPolicy {
        self.policy
    }

    /// Publish `{domain, kind}` unless the policy suppresses it. Delivery
    /// failures are logged and swallowed.
    pub async fn notify(&self, domain: DomainId, kind: OperationKind, succeeded: bool) {
        if !succeeded && self.policy == NotificationPolicy::OnSuccess {
            tracing::debug!(%domain, %kind, "notification suppressed for failed operation");
            return;
        }
        let event = NotificationEvent::new(domain, kind);
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%err, %event, "failed to publish notification");
        }
    }
}
