use async_trait::async_trait;

use crate::scheduling::{HostError, RequestId};

use super::{Alert, NotificationChannel, NotificationHost};

/// Writes alerts to the log instead of a notification tray.
pub struct LogNotificationHost;

#[async_trait]
impl NotificationHost for LogNotificationHost {
    async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), HostError> {
        log::info!("Notification channel ready. [id = {}, name = {}]", channel.id, channel.name);
        Ok(())
    }

    async fn show(&self, alert: Alert) -> Result<(), HostError> {
        let actions: Vec<&str> = alert.actions.iter().map(|action| action.label).collect();
        log::info!(
            "🔔 {}: {} [notification_id = {}, actions = {:?}]",
            alert.title,
            alert.body,
            alert.notification_id,
            actions
        );
        Ok(())
    }

    async fn dismiss(&self, notification_id: RequestId) -> Result<(), HostError> {
        log::info!("Notification dismissed. [notification_id = {notification_id}]");
        Ok(())
    }
}
