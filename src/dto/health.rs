use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of live countdown timers.
    pub timers: usize,
    /// Number of connected SSE clients.
    pub listeners: usize,
}

impl HealthResponse {
    /// Health response for a fully operational service.
    pub fn ok(timers: usize, listeners: usize) -> Self {
        Self {
            status: "ok".to_string(),
            timers,
            listeners,
        }
    }

    /// Health response for a service whose storage is failing.
    pub fn degraded(timers: usize, listeners: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            timers,
            listeners,
        }
    }
}
