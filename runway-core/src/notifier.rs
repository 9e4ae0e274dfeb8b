use async_trait::async_trait;
use crate::models::NotificationRecord;

/// Receives (user, ticket) pairs after a ticket has been committed.
/// Delivery and storage beyond the notification row are up to the implementor.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &NotificationRecord) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),
}
