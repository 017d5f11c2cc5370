//! Reminder alarm scheduling: turns stored reminders into exactly one
//! cancellable host alarm each, and handles what happens when one fires.

pub mod clock;
pub mod datetime;
pub mod notification;
pub mod reminder;
pub mod scheduling;
pub mod service;
pub mod settings;
pub mod storage;

#[cfg(test)]
mod test_utils;
