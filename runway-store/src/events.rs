use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use runway_core::{Notifier, NotificationRecord, NotifyError};

/// In-process fan-out of ticket notifications.
///
/// Subscribers that fall behind lose the oldest entries. A send with no live
/// subscribers is not a failure: the notification row is already durable.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<NotificationRecord>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationRecord> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, notification: &NotificationRecord) -> Result<(), NotifyError> {
        match self.sender.send(notification.clone()) {
            Ok(receivers) => {
                info!(
                    "Published notification {} for user {} to {} subscriber(s)",
                    notification.id, notification.user_id, receivers
                );
            }
            Err(_) => {
                debug!("No subscribers for notification {}", notification.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample() -> NotificationRecord {
        NotificationRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            ticket_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_notify_reaches_subscriber() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();
        let record = sample();

        notifier.notify(&record).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, record.id);
        assert_eq!(received.ticket_id, record.ticket_id);
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_is_ok() {
        let notifier = BroadcastNotifier::new(8);
        assert!(notifier.notify(&sample()).await.is_ok());
    }
}
