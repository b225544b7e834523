use serde::Serialize;
use utoipa::ToSchema;

/// Reported health of the backend.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Storage answered the ping.
    Ok,
    /// Running without a reachable storage backend.
    Degraded,
}

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Current health status.
    pub status: HealthStatus,
}

impl HealthResponse {
    /// Response for a fully operational backend.
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
        }
    }

    /// Response for degraded mode.
    pub fn degraded() -> Self {
        Self {
            status: HealthStatus::Degraded,
        }
    }
}
