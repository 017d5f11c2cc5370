use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{clock::Clock, reminder::AlarmPayload};

use super::{
    host::{AlarmHost, HostError, HostFire},
    request_id::RequestId,
};

struct ScheduledTask {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTask {
    fn cancel(self) {
        self.cancellation_token.cancel();
    }
}

/// In-process alarm host: one sleeping task per request id, fires delivered
/// through the channel returned by [`TokioAlarmHost::new`].
pub struct TokioAlarmHost {
    clock: Arc<dyn Clock>,
    fires: mpsc::UnboundedSender<HostFire>,
    exact_alarms_allowed: AtomicBool,
    tasks: Mutex<HashMap<RequestId, ScheduledTask>>,
}

impl TokioAlarmHost {
    pub fn new(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<HostFire>) {
        let (fires, receiver) = mpsc::unbounded_channel();
        let host = Self {
            clock,
            fires,
            exact_alarms_allowed: AtomicBool::new(true),
            tasks: Mutex::new(HashMap::new()),
        };

        (host, receiver)
    }

    pub fn set_exact_alarms_allowed(&self, allowed: bool) {
        self.exact_alarms_allowed.store(allowed, Ordering::SeqCst);
    }

    pub fn pending_count(&self) -> usize {
        self.lock_tasks()
            .values()
            .filter(|task| !task.task_handle.is_finished())
            .count()
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, ScheduledTask>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn wait_and_fire(
        cancellation_token: CancellationToken,
        delay: std::time::Duration,
        fire: HostFire,
        fires: mpsc::UnboundedSender<HostFire>,
    ) {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                log::debug!("Alarm task cancelled. [request_id = {}]", fire.request_id);
            },
            _ = tokio::time::sleep(delay) => {
                if fires.send(fire).is_err() {
                    log::warn!("Alarm fired but nobody is listening for fires");
                }
            }
        }
    }
}

#[async_trait]
impl AlarmHost for TokioAlarmHost {
    async fn register_at(
        &self,
        request_id: RequestId,
        instant: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> Result<(), HostError> {
        if !self.exact_alarms_allowed.load(Ordering::SeqCst) {
            return Err(HostError::PermissionDenied);
        }

        let delay = (instant - self.clock.now()).to_std().unwrap_or_default();
        let cancellation_token = CancellationToken::new();
        let fire = HostFire {
            request_id,
            instant,
            payload: payload.clone(),
        };

        let task_handle = tokio::spawn(Self::wait_and_fire(
            cancellation_token.child_token(),
            delay,
            fire,
            self.fires.clone(),
        ));

        let mut tasks = self.lock_tasks();
        tasks.retain(|_, task| !task.task_handle.is_finished());
        if let Some(previous) = tasks.insert(
            request_id,
            ScheduledTask {
                task_handle,
                cancellation_token,
            },
        ) {
            previous.cancel();
        }

        Ok(())
    }

    async fn cancel(&self, request_id: RequestId) -> Result<(), HostError> {
        if let Some(task) = self.lock_tasks().remove(&request_id) {
            task.cancel();
        }
        Ok(())
    }
}
