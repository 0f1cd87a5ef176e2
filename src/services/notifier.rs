use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    db::notification_store::NotificationStore,
    models::notification::{NewNotification, Notification},
};

/// Receives notifications once they are durably recorded
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, notification: &Notification);
}

/// Sink that drops everything, for setups without live dashboards
pub struct NoopSink;

#[async_trait]
impl NotificationSink for NoopSink {
    async fn publish(&self, _notification: &Notification) {}
}

/// Records notifications and forwards them to the live sink
#[derive(Clone)]
pub struct Notifier {
    store: NotificationStore,
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(store: NotificationStore, sink: Arc<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    /// Best-effort append. Failures are logged and never reach the caller.
    pub async fn record(&self, notification: NewNotification) -> Option<Notification> {
        match self.store.append(&notification).await {
            Ok(saved) => {
                self.sink.publish(&saved).await;
                Some(saved)
            }
            Err(e) => {
                tracing::warn!(
                    kind = notification.kind.as_str(),
                    error = %e,
                    "Failed to record notification"
                );
                None
            }
        }
    }

    /// Forward notifications that were written as part of another transaction
    pub async fn publish(&self, notifications: &[Notification]) {
        for notification in notifications {
            self.sink.publish(notification).await;
        }
    }
}
