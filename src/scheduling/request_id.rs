//! Mapping of reminder ids onto the host's `i32` request id space.
//!
//! Every reminder gets one slot. A slot is the FNV-1a hash of the id,
//! reduced to 29 bits and linearly probed on collision. The request id is
//! `slot << 2 | action`, so each reminder owns four consecutive ids (the
//! fire alarm, the posted notification and its two buttons) and two
//! different reminders can never share one. Slots stay assigned for the
//! lifetime of the registry.

use std::collections::HashMap;
use std::fmt;

use crate::reminder::ReminderId;

const ACTION_BITS: u32 = 2;
const SLOT_BITS: u32 = 29;
const SLOT_COUNT: u32 = 1 << SLOT_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(i32);

impl RequestId {
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmAction {
    Fire = 0,
    Notification = 1,
    Postpone = 2,
    Accept = 3,
}

impl AlarmAction {
    pub const ALL: [AlarmAction; 4] = [
        AlarmAction::Fire,
        AlarmAction::Notification,
        AlarmAction::Postpone,
        AlarmAction::Accept,
    ];

    fn from_bits(bits: u32) -> Self {
        match bits {
            0 => AlarmAction::Fire,
            1 => AlarmAction::Notification,
            2 => AlarmAction::Postpone,
            _ => AlarmAction::Accept,
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestIdRegistry {
    slots: HashMap<ReminderId, u32>,
    owners: HashMap<u32, ReminderId>,
}

impl RequestIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_id(&mut self, id: &ReminderId, action: AlarmAction) -> RequestId {
        let slot = self.slot_for(id);
        RequestId(((slot << ACTION_BITS) | action as u32) as i32)
    }

    pub fn resolve(&self, request_id: RequestId) -> Option<(&ReminderId, AlarmAction)> {
        let raw = request_id.0 as u32;
        let owner = self.owners.get(&(raw >> ACTION_BITS))?;
        Some((owner, AlarmAction::from_bits(raw & ((1 << ACTION_BITS) - 1))))
    }

    fn slot_for(&mut self, id: &ReminderId) -> u32 {
        if let Some(slot) = self.slots.get(id) {
            return *slot;
        }

        let mut slot = stable_hash(id.as_str()) % SLOT_COUNT;
        while self.owners.contains_key(&slot) {
            slot = (slot + 1) % SLOT_COUNT;
        }

        self.slots.insert(id.clone(), slot);
        self.owners.insert(slot, id.clone());
        slot
    }
}

/// 32-bit FNV-1a. Identical across runs and platforms, unlike `DefaultHasher`.
fn stable_hash(value: &str) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c9dc5;
    const PRIME: u32 = 0x01000193;

    value.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(PRIME)
    })
}
