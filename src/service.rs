//! Entry points for UI event handlers. Each call persists the change first
//! and then brings the alarm for that reminder in line with it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    datetime::{DateTimeCodec, FormatError},
    reminder::{Reminder, ReminderId, UserId},
    scheduling::{
        AlarmStore, ReconciliationSweeper, Rejection, ScheduleOutcome, SchedulingError, SweepReport,
    },
    settings::SchedulerSettings,
    storage::ReminderRepository,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] anyhow::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    Scheduled(DateTime<Utc>),
    /// Saved, but the UI should tell the user the time has already passed.
    Rejected(Rejection),
    Disabled,
}

impl From<ScheduleOutcome> for ArmOutcome {
    fn from(value: ScheduleOutcome) -> Self {
        match value {
            ScheduleOutcome::Scheduled(instant) => ArmOutcome::Scheduled(instant),
            ScheduleOutcome::Rejected(rejection) => ArmOutcome::Rejected(rejection),
        }
    }
}

pub struct ReminderService {
    repository: Arc<dyn ReminderRepository>,
    store: Arc<AlarmStore>,
    sweeper: ReconciliationSweeper,
    codec: DateTimeCodec,
    cancel_completed: bool,
}

impl ReminderService {
    pub fn new(
        repository: Arc<dyn ReminderRepository>,
        store: Arc<AlarmStore>,
        settings: &SchedulerSettings,
    ) -> Self {
        let codec = DateTimeCodec::new(settings.timezone);
        let sweeper = ReconciliationSweeper::new(Arc::clone(&store), codec)
            .with_cancel_completed(settings.cancel_completed);

        Self {
            repository,
            store,
            sweeper,
            codec,
            cancel_completed: settings.cancel_completed,
        }
    }

    pub fn codec(&self) -> DateTimeCodec {
        self.codec
    }

    pub async fn create(&self, reminder: Reminder) -> Result<ArmOutcome, ServiceError> {
        self.repository.save(reminder.clone()).await?;

        if !reminder.notification_active {
            return Ok(ArmOutcome::Disabled);
        }

        let instant = self.codec.parse(&reminder.date, &reminder.time)?;
        let outcome = self
            .store
            .schedule(&reminder.id, instant, reminder.payload())
            .await?;

        Ok(outcome.into())
    }

    /// The old alarm never survives an edit, even one whose new date cannot
    /// be read.
    pub async fn update(&self, reminder: Reminder) -> Result<ArmOutcome, ServiceError> {
        self.repository.update(reminder.clone()).await?;

        if !reminder.notification_active {
            self.store.cancel(&reminder.id).await;
            return Ok(ArmOutcome::Disabled);
        }

        let instant = match self.codec.parse(&reminder.date, &reminder.time) {
            Ok(instant) => instant,
            Err(error) => {
                self.store.cancel(&reminder.id).await;
                return Err(error.into());
            }
        };
        let outcome = self
            .store
            .reschedule(&reminder.id, instant, reminder.payload())
            .await?;

        Ok(outcome.into())
    }

    pub async fn delete(&self, id: &ReminderId) -> Result<(), ServiceError> {
        self.repository.delete(id).await?;
        self.store.cancel(id).await;
        Ok(())
    }

    /// Completion leaves a pending alarm alone unless `cancel_completed` is set.
    pub async fn mark_completed(&self, id: &ReminderId) -> Result<(), ServiceError> {
        self.repository.set_completed(id).await?;

        if self.cancel_completed {
            self.store.cancel(id).await;
        }

        Ok(())
    }

    pub async fn refresh(&self, user_id: &UserId) -> Option<SweepReport> {
        self.sweeper
            .sweep_user(self.repository.as_ref(), user_id)
            .await
    }

    /// Call once the user has granted exact alarm permission.
    pub async fn permission_granted(&self) -> Vec<SchedulingError> {
        self.store
            .retry_awaiting_permission()
            .await
            .into_iter()
            .filter_map(|(_, result)| result.err())
            .collect()
    }
}

#[cfg(test)]
mod tests;
