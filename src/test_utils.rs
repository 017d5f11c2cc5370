use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{
    clock::ManualClock,
    datetime::DateTimeCodec,
    notification::{Alert, NotificationChannel, NotificationHost},
    reminder::{AlarmPayload, Reminder, ReminderCategory, ReminderId, UserId},
    scheduling::{AlarmHost, AlarmStore, HostError, RequestId, TriggerPolicy},
    settings::SchedulerSettings,
    storage::ReminderRepository,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Register(RequestId, DateTime<Utc>),
    Cancel(RequestId),
}

/// Alarm host that remembers what is live instead of waking anything up.
#[derive(Default)]
pub struct FakeAlarmHost {
    live: Mutex<HashMap<RequestId, (DateTime<Utc>, AlarmPayload)>>,
    calls: Mutex<Vec<HostCall>>,
    scripted_failures: Mutex<VecDeque<HostError>>,
    exact_denied: AtomicBool,
}

impl FakeAlarmHost {
    pub fn live(&self) -> Vec<(DateTime<Utc>, AlarmPayload)> {
        self.live.lock().unwrap().values().cloned().collect()
    }

    pub fn live_instants(&self) -> Vec<DateTime<Utc>> {
        let mut instants: Vec<DateTime<Utc>> = self.live().into_iter().map(|(i, _)| i).collect();
        instants.sort();
        instants
    }

    pub fn live_request(&self, request_id: RequestId) -> Option<DateTime<Utc>> {
        self.live.lock().unwrap().get(&request_id).map(|(i, _)| *i)
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn register_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, HostCall::Register(..)))
            .count()
    }

    pub fn fail_next_register(&self, error: HostError) {
        self.scripted_failures.lock().unwrap().push_back(error);
    }

    pub fn deny_exact_alarms(&self, denied: bool) {
        self.exact_denied.store(denied, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlarmHost for FakeAlarmHost {
    async fn register_at(
        &self,
        request_id: RequestId,
        instant: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> Result<(), HostError> {
        self.calls
            .lock()
            .unwrap()
            .push(HostCall::Register(request_id, instant));

        if self.exact_denied.load(Ordering::SeqCst) {
            return Err(HostError::PermissionDenied);
        }
        if let Some(error) = self.scripted_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        self.live
            .lock()
            .unwrap()
            .insert(request_id, (instant, payload.clone()));
        Ok(())
    }

    async fn cancel(&self, request_id: RequestId) -> Result<(), HostError> {
        self.calls.lock().unwrap().push(HostCall::Cancel(request_id));
        self.live.lock().unwrap().remove(&request_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotificationHost {
    pub channels: Mutex<Vec<NotificationChannel>>,
    pub shown: Mutex<Vec<Alert>>,
    pub dismissed: Mutex<Vec<RequestId>>,
}

#[async_trait]
impl NotificationHost for FakeNotificationHost {
    async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), HostError> {
        self.channels.lock().unwrap().push(channel.clone());
        Ok(())
    }

    async fn show(&self, alert: Alert) -> Result<(), HostError> {
        self.shown.lock().unwrap().push(alert);
        Ok(())
    }

    async fn dismiss(&self, notification_id: RequestId) -> Result<(), HostError> {
        self.dismissed.lock().unwrap().push(notification_id);
        Ok(())
    }
}

/// Repository whose backend is always down.
pub struct UnavailableRepository;

#[async_trait]
impl ReminderRepository for UnavailableRepository {
    async fn list(&self, _user_id: &UserId) -> anyhow::Result<Vec<Reminder>> {
        anyhow::bail!("backend unavailable")
    }
    async fn get(&self, _id: &ReminderId) -> anyhow::Result<Option<Reminder>> {
        anyhow::bail!("backend unavailable")
    }
    async fn save(&self, _reminder: Reminder) -> anyhow::Result<()> {
        anyhow::bail!("backend unavailable")
    }
    async fn update(&self, _reminder: Reminder) -> anyhow::Result<()> {
        anyhow::bail!("backend unavailable")
    }
    async fn delete(&self, _id: &ReminderId) -> anyhow::Result<()> {
        anyhow::bail!("backend unavailable")
    }
    async fn set_completed(&self, _id: &ReminderId) -> anyhow::Result<()> {
        anyhow::bail!("backend unavailable")
    }
    async fn postpone(&self, _id: &ReminderId, _date: &str, _time: &str) -> anyhow::Result<()> {
        anyhow::bail!("backend unavailable")
    }
}

pub struct TestContext {
    pub clock: Arc<ManualClock>,
    pub host: Arc<FakeAlarmHost>,
    pub store: Arc<AlarmStore>,
    pub codec: DateTimeCodec,
}

impl TestContext {
    /// Clock starts at 24 Dec 2025 08:00 UTC.
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(utc(2025, 12, 24, 8, 0)));
        let host = Arc::new(FakeAlarmHost::default());
        let store = Arc::new(AlarmStore::new(
            host.clone(),
            TriggerPolicy::new(clock.clone()),
        ));

        Self {
            clock,
            host,
            store,
            codec: DateTimeCodec::new(Tz::UTC),
        }
    }
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

pub fn scheduler_settings(cancel_completed: bool) -> SchedulerSettings {
    SchedulerSettings {
        timezone: Tz::UTC,
        cancel_completed,
    }
}

pub fn reminder(id: &str, date: &str, time: &str) -> Reminder {
    Reminder {
        id: ReminderId::new(id),
        user_id: "u1".to_owned(),
        title: format!("Title {id}"),
        description: format!("Description {id}"),
        category: ReminderCategory::Personal,
        date: date.to_owned(),
        time: time.to_owned(),
        notification_active: true,
        is_completed: false,
        timestamp: 0,
    }
}

pub fn payload(id: &str) -> AlarmPayload {
    AlarmPayload {
        reminder_id: ReminderId::new(id),
        title: format!("Title {id}"),
        description: format!("Description {id}"),
    }
}
