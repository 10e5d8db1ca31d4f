use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the service health, logging storage issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let timers = state.timers().len();
    let listeners = state.sse().receiver_count();

    match state.games().health_check().await {
        Ok(()) => HealthResponse::ok(timers, listeners),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(timers, listeners)
        }
    }
}
