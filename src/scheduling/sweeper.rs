use std::{collections::HashSet, sync::Arc};

use crate::{
    datetime::DateTimeCodec,
    reminder::{Reminder, ReminderId, UserId},
    storage::ReminderRepository,
};

use super::alarm_store::{AlarmStore, ScheduleOutcome, SchedulingError};

#[derive(Debug, Default)]
pub struct SweepReport {
    pub scheduled: Vec<ReminderId>,
    pub past_due: Vec<ReminderId>,
    pub inactive: Vec<ReminderId>,
    pub unparseable: Vec<ReminderId>,
    pub removed: Vec<ReminderId>,
    pub failures: Vec<SchedulingError>,
}

impl SweepReport {
    pub fn permission_denied(&self) -> bool {
        self.failures
            .iter()
            .any(|error| matches!(error, SchedulingError::PermissionDenied { .. }))
    }
}

/// Brings the alarm store in line with a full reminder list.
///
/// Safe to run repeatedly and alongside direct schedule/cancel calls. An
/// unchanged list produces no host calls on the second run.
pub struct ReconciliationSweeper {
    store: Arc<AlarmStore>,
    codec: DateTimeCodec,
    cancel_completed: bool,
}

impl ReconciliationSweeper {
    pub fn new(store: Arc<AlarmStore>, codec: DateTimeCodec) -> Self {
        Self {
            store,
            codec,
            cancel_completed: false,
        }
    }

    /// Treat completed reminders like ones with notifications turned off.
    pub fn with_cancel_completed(mut self, cancel_completed: bool) -> Self {
        self.cancel_completed = cancel_completed;
        self
    }

    pub async fn sweep(&self, reminders: &[Reminder]) -> SweepReport {
        let mut report = SweepReport::default();
        let mut present = HashSet::with_capacity(reminders.len());

        for reminder in reminders {
            present.insert(reminder.id.clone());
            self.reconcile(reminder, &mut report).await;
        }

        for id in self.store.tracked_ids().await {
            if !present.contains(&id) {
                self.store.cancel(&id).await;
                report.removed.push(id);
            }
        }

        log::info!(
            "[SWEEP] Finished. [scheduled = {}, past_due = {}, inactive = {}, unparseable = {}, removed = {}, failures = {}]",
            report.scheduled.len(),
            report.past_due.len(),
            report.inactive.len(),
            report.unparseable.len(),
            report.removed.len(),
            report.failures.len()
        );

        report
    }

    /// `None` when the repository could not produce a list; nothing is
    /// touched in that case.
    pub async fn sweep_user(
        &self,
        repository: &dyn ReminderRepository,
        user_id: &UserId,
    ) -> Option<SweepReport> {
        match repository.list(user_id).await {
            Ok(reminders) => Some(self.sweep(&reminders).await),
            Err(error) => {
                log::warn!(
                    "[SWEEP] Reminder list unavailable, skipping this cycle. [user_id = {user_id}, error = {error:#}]"
                );
                None
            }
        }
    }

    async fn reconcile(&self, reminder: &Reminder, report: &mut SweepReport) {
        let id = &reminder.id;
        let eligible =
            reminder.notification_active && !(self.cancel_completed && reminder.is_completed);

        if !eligible {
            self.store.cancel(id).await;
            report.inactive.push(id.clone());
            return;
        }

        let instant = match self.codec.parse(&reminder.date, &reminder.time) {
            Ok(instant) => instant,
            Err(error) => {
                log::warn!("[SWEEP] Skipping reminder with unreadable date. [reminder_id = {id}, error = {error}]");
                report.unparseable.push(id.clone());
                return;
            }
        };

        if !self.store.policy().is_future(instant) {
            self.store.cancel(id).await;
            report.past_due.push(id.clone());
            return;
        }

        match self.store.schedule(id, instant, reminder.payload()).await {
            Ok(ScheduleOutcome::Scheduled(_)) => report.scheduled.push(id.clone()),
            Ok(ScheduleOutcome::Rejected(_)) => {
                self.store.cancel(id).await;
                report.past_due.push(id.clone());
            }
            Err(error) => {
                log::warn!("[SWEEP] Could not schedule reminder. [reminder_id = {id}, error = {error}]");
                report.failures.push(error);
            }
        }
    }
}
