use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::{
    datetime::DateTimeCodec,
    reminder::{AlarmPayload, ReminderId},
    scheduling::{
        AlarmAction, AlarmStore, HostError, HostFire, RequestId, ScheduleOutcome, SchedulingError,
    },
    storage::ReminderRepository,
};

use super::{Alert, AlertAction, NotificationAction, NotificationChannel, NotificationHost};

const FALLBACK_TITLE: &str = "Reminder";
/// Alerts left unanswered this long are forgotten; a late postpone then
/// starts from now.
const PRESENTED_RETENTION: TimeDelta = TimeDelta::hours(24);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireHandling {
    Presented,
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Acknowledged,
    Postponed {
        instant: DateTime<Utc>,
        date: String,
        time: String,
        persisted: bool,
    },
    /// The postponed instant was already in the past.
    PostponeSkipped { instant: DateTime<Utc> },
}

struct PresentedAlert {
    fired_at: DateTime<Utc>,
    payload: AlarmPayload,
}

pub struct NotificationPresenter {
    store: Arc<AlarmStore>,
    notifications: Arc<dyn NotificationHost>,
    repository: Arc<dyn ReminderRepository>,
    codec: DateTimeCodec,
    channel: NotificationChannel,
    presented: Mutex<HashMap<ReminderId, PresentedAlert>>,
}

impl NotificationPresenter {
    pub async fn new(
        store: Arc<AlarmStore>,
        notifications: Arc<dyn NotificationHost>,
        repository: Arc<dyn ReminderRepository>,
        codec: DateTimeCodec,
        channel: NotificationChannel,
    ) -> Self {
        if let Err(error) = notifications.ensure_channel(&channel).await {
            log::warn!("Could not create notification channel. [channel = {}, error = {error}]", channel.id);
        }

        Self {
            store,
            notifications,
            repository,
            codec,
            channel,
            presented: Mutex::new(HashMap::new()),
        }
    }

    /// Fires superseded by a later reschedule or cancel are dropped here.
    pub async fn handle_fire(&self, fire: HostFire) -> Result<FireHandling, HostError> {
        let id = fire.payload.reminder_id.clone();
        let payload = match self.store.on_fired(&id, fire.instant).await {
            Ok(payload) => payload,
            Err(stale) => {
                log::debug!("[PRESENT] {stale}");
                return Ok(FireHandling::Discarded);
            }
        };

        let alert = self.build_alert(&payload).await;
        if let Err(error) = self.notifications.show(alert).await {
            log::error!("[PRESENT] Could not show alert. [reminder_id = {id}, error = {error}]");
            return Err(error);
        }

        let now = self.store.policy().now();
        let mut presented = self.presented.lock().await;
        presented.retain(|_, alert| now - alert.fired_at < PRESENTED_RETENTION);
        presented.insert(
            id,
            PresentedAlert {
                fired_at: fire.instant,
                payload,
            },
        );

        Ok(FireHandling::Presented)
    }

    /// Entry point for whatever the host reports back. Button presses arrive
    /// as the button's request id; a swiped-away alert arrives as its
    /// notification id and is only forgotten.
    pub async fn handle_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<ActionOutcome>, SchedulingError> {
        let Some((id, action)) = self.store.resolve_request_id(request_id).await else {
            log::warn!("[ACTION] Unknown request id. [request_id = {request_id}]");
            return Ok(None);
        };

        match action {
            AlarmAction::Postpone => self
                .handle_action(&id, NotificationAction::Postpone)
                .await
                .map(Some),
            AlarmAction::Accept => self
                .handle_action(&id, NotificationAction::Acknowledge)
                .await
                .map(Some),
            AlarmAction::Notification | AlarmAction::Fire => {
                if self.presented.lock().await.remove(&id).is_some() {
                    log::debug!("[ACTION] Alert dismissed without an answer. [reminder_id = {id}]");
                }
                Ok(None)
            }
        }
    }

    /// The alert is dismissed whatever the outcome.
    pub async fn handle_action(
        &self,
        id: &ReminderId,
        action: NotificationAction,
    ) -> Result<ActionOutcome, SchedulingError> {
        let presented = self.presented.lock().await.remove(id);

        let outcome = match action {
            NotificationAction::Acknowledge => {
                log::info!("[ACKNOWLEDGE] Reminder accepted. [reminder_id = {id}]");
                Ok(ActionOutcome::Acknowledged)
            }
            NotificationAction::Postpone => self.postpone(id, presented).await,
        };

        let notification_id = self
            .store
            .action_request_id(id, AlarmAction::Notification)
            .await;
        if let Err(error) = self.notifications.dismiss(notification_id).await {
            log::warn!("Could not dismiss alert. [reminder_id = {id}, error = {error}]");
        }

        outcome
    }

    async fn postpone(
        &self,
        id: &ReminderId,
        presented: Option<PresentedAlert>,
    ) -> Result<ActionOutcome, SchedulingError> {
        let policy = self.store.policy();
        let (base, payload) = match presented {
            Some(alert) => (alert.fired_at, alert.payload),
            None => {
                log::warn!("[POSTPONE] No alert on record, postponing from now. [reminder_id = {id}]");
                (policy.now(), self.stored_payload(id).await)
            }
        };

        let instant = policy.postpone(base);
        if !policy.is_future(instant) {
            log::warn!("[POSTPONE] Postponed time already passed, not scheduling. [reminder_id = {id}, instant = {instant}]");
            return Ok(ActionOutcome::PostponeSkipped { instant });
        }

        let (date, time) = self.codec.format(instant);
        let persisted = match self.repository.postpone(id, &date, &time).await {
            Ok(()) => true,
            Err(error) => {
                log::warn!("[POSTPONE] Could not persist new time. [reminder_id = {id}, error = {error:#}]");
                false
            }
        };

        match self.store.schedule(id, instant, payload).await? {
            ScheduleOutcome::Scheduled(instant) => {
                log::info!("[POSTPONE] Reminder postponed. [reminder_id = {id}, date = {date}, time = {time}]");
                Ok(ActionOutcome::Postponed {
                    instant,
                    date,
                    time,
                    persisted,
                })
            }
            ScheduleOutcome::Rejected(_) => Ok(ActionOutcome::PostponeSkipped { instant }),
        }
    }

    async fn stored_payload(&self, id: &ReminderId) -> AlarmPayload {
        match self.repository.get(id).await {
            Ok(Some(reminder)) => reminder.payload(),
            Ok(None) | Err(_) => AlarmPayload {
                reminder_id: id.clone(),
                title: FALLBACK_TITLE.to_owned(),
                description: String::new(),
            },
        }
    }

    async fn build_alert(&self, payload: &AlarmPayload) -> Alert {
        let id = &payload.reminder_id;
        let postpone = self.store.action_request_id(id, AlarmAction::Postpone).await;
        let accept = self.store.action_request_id(id, AlarmAction::Accept).await;

        Alert {
            notification_id: self
                .store
                .action_request_id(id, AlarmAction::Notification)
                .await,
            channel_id: self.channel.id.clone(),
            title: payload.title.clone(),
            body: payload.description.clone(),
            actions: vec![
                AlertAction {
                    action: NotificationAction::Postpone,
                    label: NotificationAction::Postpone.label(),
                    request_id: postpone,
                },
                AlertAction {
                    action: NotificationAction::Acknowledge,
                    label: NotificationAction::Acknowledge.label(),
                    request_id: accept,
                },
            ],
        }
    }
}
