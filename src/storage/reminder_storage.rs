use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::reminder::{Reminder, ReminderId, UserId};

/// The persisted reminder collection. Owned by the application, the
/// scheduling core only reads it and writes back postponed times.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Most recently touched first.
    async fn list(&self, user_id: &UserId) -> anyhow::Result<Vec<Reminder>>;
    async fn get(&self, id: &ReminderId) -> anyhow::Result<Option<Reminder>>;
    async fn save(&self, reminder: Reminder) -> anyhow::Result<()>;
    async fn update(&self, reminder: Reminder) -> anyhow::Result<()>;
    async fn delete(&self, id: &ReminderId) -> anyhow::Result<()>;
    async fn set_completed(&self, id: &ReminderId) -> anyhow::Result<()>;
    async fn postpone(&self, id: &ReminderId, date: &str, time: &str) -> anyhow::Result<()>;
}

pub struct InMemoryReminderRepository {
    store: RwLock<(i64, HashMap<ReminderId, Reminder>)>,
}

impl InMemoryReminderRepository {
    pub fn new() -> Self {
        InMemoryReminderRepository {
            store: RwLock::new((0, HashMap::new())),
        }
    }

    pub fn with_reminders(reminders: impl IntoIterator<Item = Reminder>) -> Self {
        let reminders: HashMap<ReminderId, Reminder> = reminders
            .into_iter()
            .map(|reminder| (reminder.id.clone(), reminder))
            .collect();
        let last_timestamp = reminders.values().map(|r| r.timestamp).max().unwrap_or(0);

        InMemoryReminderRepository {
            store: RwLock::new((last_timestamp, reminders)),
        }
    }
}

impl Default for InMemoryReminderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderRepository for InMemoryReminderRepository {
    async fn list(&self, user_id: &UserId) -> anyhow::Result<Vec<Reminder>> {
        let store = self.store.read().await;
        let mut reminders: Vec<Reminder> = store
            .1
            .values()
            .filter(|reminder| &reminder.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(reminders)
    }

    async fn get(&self, id: &ReminderId) -> anyhow::Result<Option<Reminder>> {
        let store = self.store.read().await;
        Ok(store.1.get(id).cloned())
    }

    async fn save(&self, mut reminder: Reminder) -> anyhow::Result<()> {
        let mut store = self.store.write().await;
        store.0 += 1;
        reminder.timestamp = store.0;
        log::info!("Saving reminder {}", reminder.id);
        store.1.insert(reminder.id.clone(), reminder);
        Ok(())
    }

    async fn update(&self, mut reminder: Reminder) -> anyhow::Result<()> {
        let mut store = self.store.write().await;
        anyhow::ensure!(store.1.contains_key(&reminder.id), "Reminder {} does not exist", reminder.id);
        store.0 += 1;
        reminder.timestamp = store.0;
        store.1.insert(reminder.id.clone(), reminder);
        Ok(())
    }

    async fn delete(&self, id: &ReminderId) -> anyhow::Result<()> {
        let mut store = self.store.write().await;
        if store.1.remove(id).is_none() {
            anyhow::bail!("Reminder {id} does not exist");
        }
        Ok(())
    }

    async fn set_completed(&self, id: &ReminderId) -> anyhow::Result<()> {
        let mut store = self.store.write().await;
        match store.1.get_mut(id) {
            Some(reminder) => {
                reminder.is_completed = true;
                Ok(())
            }
            None => anyhow::bail!("Reminder {id} does not exist"),
        }
    }

    async fn postpone(&self, id: &ReminderId, date: &str, time: &str) -> anyhow::Result<()> {
        let mut store = self.store.write().await;
        store.0 += 1;
        let timestamp = store.0;
        match store.1.get_mut(id) {
            Some(reminder) => {
                reminder.date = date.to_owned();
                reminder.time = time.to_owned();
                reminder.timestamp = timestamp;
                Ok(())
            }
            None => anyhow::bail!("Reminder {id} does not exist"),
        }
    }
}
