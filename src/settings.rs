use chrono_tz::Tz;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

use crate::{
    notification::NotificationChannel,
    reminder::{Reminder, UserId},
};

#[derive(Deserialize, Debug)]
pub struct SchedulerSettings {
    /// Zone the stored date and time strings are read in.
    pub timezone: Tz,
    pub cancel_completed: bool,
}

#[derive(Deserialize, Debug)]
pub struct NotificationSettings {
    pub channel_id: String,
    pub channel_name: String,
    pub channel_description: String,
}

impl NotificationSettings {
    pub fn channel(&self) -> NotificationChannel {
        NotificationChannel {
            id: self.channel_id.clone(),
            name: self.channel_name.clone(),
            description: self.channel_description.clone(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct DemoSettings {
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub scheduler: SchedulerSettings,
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub demo: DemoSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("scheduler.timezone", "UTC")?
            .set_default("scheduler.cancel_completed", false)?
            .set_default("notifications.channel_id", "reminder_channel")?
            .set_default("notifications.channel_name", "Reminders")?
            .set_default("notifications.channel_description", "Reminder notifications")
    }
}
