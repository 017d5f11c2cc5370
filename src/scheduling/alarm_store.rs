use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::reminder::{AlarmPayload, ReminderId};

use super::{
    host::{AlarmHost, HostError},
    request_id::{AlarmAction, RequestId, RequestIdRegistry},
    trigger_policy::TriggerPolicy,
};

const REGISTER_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    PastInstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled(DateTime<Utc>),
    Rejected(Rejection),
}

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Exact alarms are not permitted, reminder {id} is waiting to fire at {instant}")]
    PermissionDenied {
        id: ReminderId,
        instant: DateTime<Utc>,
    },

    #[error("Could not register alarm for reminder {id}")]
    Failed {
        id: ReminderId,
        #[source]
        source: HostError,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Stale fire for reminder {id} at {fired_at}")]
pub struct StaleFire {
    pub id: ReminderId,
    pub fired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmState {
    Unscheduled,
    Scheduled(DateTime<Utc>),
    AwaitingPermission(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerState {
    Armed,
    AwaitingPermission,
}

#[derive(Debug, Clone)]
struct ScheduledTrigger {
    instant: DateTime<Utc>,
    payload: AlarmPayload,
    request_id: RequestId,
    state: TriggerState,
}

impl ScheduledTrigger {
    fn is_armed_at(&self, instant: DateTime<Utc>) -> bool {
        self.state == TriggerState::Armed && self.instant == instant
    }
}

#[derive(Default)]
struct AlarmIndex {
    triggers: HashMap<ReminderId, ScheduledTrigger>,
    request_ids: RequestIdRegistry,
}

/// Authoritative reminder id to trigger index.
///
/// Holds at most one trigger per reminder. Every mutation runs under one
/// lock, and host calls are made while holding it, so an old host alarm is
/// always cancelled before its replacement is registered.
pub struct AlarmStore {
    host: Arc<dyn AlarmHost>,
    policy: TriggerPolicy,
    index: Mutex<AlarmIndex>,
}

impl AlarmStore {
    pub fn new(host: Arc<dyn AlarmHost>, policy: TriggerPolicy) -> Self {
        Self {
            host,
            policy,
            index: Mutex::new(AlarmIndex::default()),
        }
    }

    pub fn policy(&self) -> &TriggerPolicy {
        &self.policy
    }

    /// A past `instant` is rejected without touching an existing trigger.
    pub async fn schedule(
        &self,
        id: &ReminderId,
        instant: DateTime<Utc>,
        payload: AlarmPayload,
    ) -> Result<ScheduleOutcome, SchedulingError> {
        if !self.policy.is_future(instant) {
            log::warn!("[SCHEDULE] Rejected instant in the past. [reminder_id = {id}, instant = {instant}]");
            return Ok(ScheduleOutcome::Rejected(Rejection::PastInstant));
        }

        let mut index = self.index.lock().await;

        let unchanged = index
            .triggers
            .get(id)
            .is_some_and(|trigger| trigger.is_armed_at(instant) && trigger.payload == payload);
        if unchanged {
            log::debug!("[SCHEDULE] Already armed. [reminder_id = {id}, instant = {instant}]");
            return Ok(ScheduleOutcome::Scheduled(instant));
        }

        self.disarm(&mut index, id).await;
        self.register(&mut index, id, instant, payload).await
    }

    /// Unlike `schedule`, the old trigger is gone even when `instant` is
    /// rejected.
    pub async fn reschedule(
        &self,
        id: &ReminderId,
        instant: DateTime<Utc>,
        payload: AlarmPayload,
    ) -> Result<ScheduleOutcome, SchedulingError> {
        let mut index = self.index.lock().await;
        self.disarm(&mut index, id).await;

        if !self.policy.is_future(instant) {
            log::warn!("[RESCHEDULE] Rejected instant in the past. [reminder_id = {id}, instant = {instant}]");
            return Ok(ScheduleOutcome::Rejected(Rejection::PastInstant));
        }

        self.register(&mut index, id, instant, payload).await
    }

    pub async fn cancel(&self, id: &ReminderId) {
        let mut index = self.index.lock().await;
        if self.disarm(&mut index, id).await {
            log::info!("[CANCEL] Trigger removed. [reminder_id = {id}]");
        }
    }

    /// Consumes the trigger only if it is still armed for `fired_at`.
    pub async fn on_fired(
        &self,
        id: &ReminderId,
        fired_at: DateTime<Utc>,
    ) -> Result<AlarmPayload, StaleFire> {
        let mut index = self.index.lock().await;

        match index.triggers.remove(id) {
            Some(trigger) if trigger.is_armed_at(fired_at) => {
                log::info!("[FIRED] Reminder fired. [reminder_id = {id}, instant = {fired_at}]");
                Ok(trigger.payload)
            }
            other => {
                if let Some(trigger) = other {
                    index.triggers.insert(id.clone(), trigger);
                }
                log::debug!("[FIRED] Discarding stale fire. [reminder_id = {id}, instant = {fired_at}]");
                Err(StaleFire {
                    id: id.clone(),
                    fired_at,
                })
            }
        }
    }

    /// Re-registers triggers the host refused earlier. Ones that slipped
    /// into the past meanwhile are dropped.
    pub async fn retry_awaiting_permission(
        &self,
    ) -> Vec<(ReminderId, Result<ScheduleOutcome, SchedulingError>)> {
        let mut index = self.index.lock().await;
        let waiting: Vec<(ReminderId, ScheduledTrigger)> = index
            .triggers
            .iter()
            .filter(|(_, trigger)| trigger.state == TriggerState::AwaitingPermission)
            .map(|(id, trigger)| (id.clone(), trigger.clone()))
            .collect();

        let mut results = Vec::with_capacity(waiting.len());
        for (id, trigger) in waiting {
            index.triggers.remove(&id);

            if !self.policy.is_future(trigger.instant) {
                log::warn!(
                    "[PERMISSION] Dropping trigger that passed while waiting. [reminder_id = {id}, instant = {}]",
                    trigger.instant
                );
                results.push((id, Ok(ScheduleOutcome::Rejected(Rejection::PastInstant))));
                continue;
            }

            let result = self
                .register(&mut index, &id, trigger.instant, trigger.payload)
                .await;
            results.push((id, result));
        }

        results
    }

    pub async fn state(&self, id: &ReminderId) -> AlarmState {
        let index = self.index.lock().await;
        match index.triggers.get(id) {
            None => AlarmState::Unscheduled,
            Some(trigger) => match trigger.state {
                TriggerState::Armed => AlarmState::Scheduled(trigger.instant),
                TriggerState::AwaitingPermission => AlarmState::AwaitingPermission(trigger.instant),
            },
        }
    }

    pub async fn tracked_ids(&self) -> Vec<ReminderId> {
        let index = self.index.lock().await;
        let mut ids: Vec<ReminderId> = index.triggers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn armed_count(&self) -> usize {
        let index = self.index.lock().await;
        index
            .triggers
            .values()
            .filter(|trigger| trigger.state == TriggerState::Armed)
            .count()
    }

    pub async fn action_request_id(&self, id: &ReminderId, action: AlarmAction) -> RequestId {
        self.index.lock().await.request_ids.request_id(id, action)
    }

    /// Maps a request id reported back by a host to its reminder and action.
    pub async fn resolve_request_id(&self, request_id: RequestId) -> Option<(ReminderId, AlarmAction)> {
        let index = self.index.lock().await;
        index
            .request_ids
            .resolve(request_id)
            .map(|(id, action)| (id.clone(), action))
    }

    async fn disarm(&self, index: &mut AlarmIndex, id: &ReminderId) -> bool {
        let Some(trigger) = index.triggers.remove(id) else {
            return false;
        };

        if trigger.state == TriggerState::Armed {
            if let Err(error) = self.host.cancel(trigger.request_id).await {
                log::warn!(
                    "[CANCEL] Host refused to cancel alarm. [reminder_id = {id}, request_id = {}, error = {error}]",
                    trigger.request_id
                );
            }
        }

        true
    }

    async fn register(
        &self,
        index: &mut AlarmIndex,
        id: &ReminderId,
        instant: DateTime<Utc>,
        payload: AlarmPayload,
    ) -> Result<ScheduleOutcome, SchedulingError> {
        let request_id = index.request_ids.request_id(id, AlarmAction::Fire);

        match self.register_with_retry(request_id, instant, &payload).await {
            Ok(()) => {
                log::info!("[SCHEDULE] Armed. [reminder_id = {id}, request_id = {request_id}, instant = {instant}]");
                index.triggers.insert(
                    id.clone(),
                    ScheduledTrigger {
                        instant,
                        payload,
                        request_id,
                        state: TriggerState::Armed,
                    },
                );
                Ok(ScheduleOutcome::Scheduled(instant))
            }
            Err(HostError::PermissionDenied) => {
                log::warn!("[SCHEDULE] Exact alarms not permitted, keeping intent. [reminder_id = {id}, instant = {instant}]");
                index.triggers.insert(
                    id.clone(),
                    ScheduledTrigger {
                        instant,
                        payload,
                        request_id,
                        state: TriggerState::AwaitingPermission,
                    },
                );
                Err(SchedulingError::PermissionDenied {
                    id: id.clone(),
                    instant,
                })
            }
            Err(source) => {
                log::error!("[SCHEDULE] Host failed to register alarm. [reminder_id = {id}, error = {source}]");
                Err(SchedulingError::Failed {
                    id: id.clone(),
                    source,
                })
            }
        }
    }

    async fn register_with_retry(
        &self,
        request_id: RequestId,
        instant: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> Result<(), HostError> {
        let mut attempt = 1;
        loop {
            match self.host.register_at(request_id, instant, payload).await {
                Err(HostError::Unavailable(reason)) if attempt < REGISTER_ATTEMPTS => {
                    log::warn!("[SCHEDULE] Retrying host registration. [request_id = {request_id}, reason = {reason}]");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
