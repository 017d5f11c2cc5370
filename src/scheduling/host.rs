use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::reminder::AlarmPayload;

use super::request_id::RequestId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Exact alarm permission was denied by the host")]
    PermissionDenied,

    #[error("Host service unavailable: {0}")]
    Unavailable(String),
}

/// Delivered by the host when a registered alarm goes off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFire {
    pub request_id: RequestId,
    pub instant: DateTime<Utc>,
    pub payload: AlarmPayload,
}

/// Exact-time wake-ups provided by the platform.
///
/// Registering an already registered `request_id` replaces the previous
/// alarm. Cancelling an unknown one is not an error.
#[async_trait]
pub trait AlarmHost: Send + Sync + 'static {
    async fn register_at(
        &self,
        request_id: RequestId,
        instant: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> Result<(), HostError>;

    async fn cancel(&self, request_id: RequestId) -> Result<(), HostError>;
}
