mod alarm_store;
mod host;
mod request_id;
mod sweeper;
mod tokio_host;
mod trigger_policy;

pub use alarm_store::{
    AlarmState, AlarmStore, Rejection, ScheduleOutcome, SchedulingError, StaleFire,
};
pub use host::{AlarmHost, HostError, HostFire};
pub use request_id::{AlarmAction, RequestId, RequestIdRegistry};
pub use sweeper::{ReconciliationSweeper, SweepReport};
pub use tokio_host::TokioAlarmHost;
pub use trigger_policy::{POSTPONE_DELAY, TriggerPolicy, is_future_at};
