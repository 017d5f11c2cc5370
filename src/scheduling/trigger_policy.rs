use std::sync::Arc;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

use crate::clock::Clock;

pub const POSTPONE_DELAY: TimeDelta = TimeDelta::minutes(5);

#[derive(Clone)]
pub struct TriggerPolicy {
    clock: Arc<dyn Clock>,
}

impl TriggerPolicy {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_future(&self, instant: DateTime<Utc>) -> bool {
        is_future_at(instant, self.clock.now())
    }

    /// Does not check the result; callers must run it through `is_future`.
    pub fn postpone(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        instant + POSTPONE_DELAY
    }
}

/// Sub-second jitter in `now` is discarded so repeated checks within one
/// second agree.
pub fn is_future_at(instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    instant > now.trunc_subsecs(0)
}
