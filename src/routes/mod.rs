use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod identity;
pub mod molkky;
pub mod settings;
pub mod sse;
pub mod timer;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(settings::router())
        .merge(molkky::router())
        .merge(timer::router());

    api_router.merge(docs::router()).with_state(state)
}
