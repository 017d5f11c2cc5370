use std::{fmt, str::FromStr};

use serde::Deserialize;

pub type UserId = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(String);

impl ReminderId {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReminderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum ReminderCategory {
    Work,
    #[default]
    Personal,
    Health,
    Shopping,
    Travel,
}

impl ReminderCategory {
    pub const ALL: [ReminderCategory; 5] = [
        ReminderCategory::Work,
        ReminderCategory::Personal,
        ReminderCategory::Health,
        ReminderCategory::Shopping,
        ReminderCategory::Travel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReminderCategory::Work => "Work",
            ReminderCategory::Personal => "Personal",
            ReminderCategory::Health => "Health",
            ReminderCategory::Shopping => "Shopping",
            ReminderCategory::Travel => "Travel",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ReminderCategory::Work => "💼",
            ReminderCategory::Personal => "🔥",
            ReminderCategory::Health => "🏥",
            ReminderCategory::Shopping => "🛒",
            ReminderCategory::Travel => "✈️",
        }
    }

    /// ARGB color used by the category badge.
    pub fn color(&self) -> u32 {
        match self {
            ReminderCategory::Work => 0xFF5C6BC0,
            ReminderCategory::Personal => 0xFFEF5350,
            ReminderCategory::Health => 0xFF26A69A,
            ReminderCategory::Shopping => 0xFFFF9800,
            ReminderCategory::Travel => 0xFF42A5F5,
        }
    }

    /// Lenient lookup used for stored records. Unknown values become `Personal`.
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::warn!("Unknown reminder category {value}, defaulting to Personal");
            ReminderCategory::Personal
        })
    }
}

impl FromStr for ReminderCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown reminder category {s}"))
    }
}

impl From<String> for ReminderCategory {
    fn from(value: String) -> Self {
        Self::from_stored(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    #[serde(default)]
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: ReminderCategory,
    /// `dd MMM yyyy`, e.g. `25 Dec 2025`.
    pub date: String,
    /// `hh:mm AM`, e.g. `09:00 AM`.
    pub time: String,
    #[serde(default = "default_notification_active")]
    pub notification_active: bool,
    #[serde(default)]
    pub is_completed: bool,
    /// Ordering key only. Never used for scheduling.
    #[serde(default)]
    pub timestamp: i64,
}

fn default_notification_active() -> bool {
    true
}

impl Reminder {
    pub fn payload(&self) -> AlarmPayload {
        AlarmPayload {
            reminder_id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// What travels with a host alarm and comes back when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmPayload {
    pub reminder_id: ReminderId,
    pub title: String,
    pub description: String,
}
