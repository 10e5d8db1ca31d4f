use std::convert::Infallible;

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::{services::sse_service, state::SharedState};

/// Query string of the SSE endpoint. `EventSource` cannot send headers, so the user
/// identifier travels in the URL.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// Receive the events addressed to this user on top of the public ones.
    pub uid: Option<String>,
}

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    params(StreamQuery),
    responses((status = 200, description = "Event stream", content_type = "text/event-stream", body = String))
)]
/// Stream timer frames, speech and game updates to connected frontends.
pub async fn stream(
    State(state): State<SharedState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let uid = query
        .uid
        .map(|uid| uid.trim().to_string())
        .filter(|uid| !uid.is_empty());
    let (receiver, registration) = sse_service::subscribe(&state, uid.as_deref());
    info!(uid = uid.as_deref().unwrap_or("-"), "new SSE connection");
    sse_service::to_sse_stream(receiver, registration, uid)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/public", get(stream))
}
