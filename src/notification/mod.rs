mod log_host;
mod presenter;

use async_trait::async_trait;

use crate::scheduling::{HostError, RequestId};

pub use log_host::LogNotificationHost;
pub use presenter::{ActionOutcome, FireHandling, NotificationPresenter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Acknowledge,
    Postpone,
}

impl NotificationAction {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationAction::Postpone => "Postpone 5 min",
            NotificationAction::Acknowledge => "Accept",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertAction {
    pub action: NotificationAction,
    pub label: &'static str,
    pub request_id: RequestId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub notification_id: RequestId,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub actions: Vec<AlertAction>,
}

/// User-facing alerts. The host reports button presses back through
/// [`NotificationPresenter::handle_action`].
#[async_trait]
pub trait NotificationHost: Send + Sync + 'static {
    async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), HostError>;
    async fn show(&self, alert: Alert) -> Result<(), HostError>;
    async fn dismiss(&self, notification_id: RequestId) -> Result<(), HostError>;
}
