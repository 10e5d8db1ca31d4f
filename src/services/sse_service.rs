use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::{ListenerRegistration, SharedState},
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the shared SSE stream. A stream opened by a user is counted as one
/// of their listeners for as long as the registration lives.
pub fn subscribe(
    state: &SharedState,
    uid: Option<&str>,
) -> (
    broadcast::Receiver<ServerEvent>,
    Option<ListenerRegistration>,
) {
    let registration = uid.map(|uid| state.sse().register(uid));
    (state.sse().subscribe(), registration)
}

/// Convert a broadcast receiver into an SSE response that only forwards the events
/// addressed to `uid` (or to everyone), starting with a handshake.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    registration: Option<ListenerRegistration>,
    uid: Option<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        // released when the client goes away
        let _registration = registration;

        if let Some(handshake) = handshake_event(uid.clone())
            && tx.send(Ok(handshake)).await.is_err()
        {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if !payload.reaches(uid.as_deref()) {
                                continue;
                            }

                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // frames are superseded by the next ones
                            debug!(skipped, "SSE subscriber lagging");
                            continue;
                        }
                    }
                }
            }
        }

        info!(uid = uid.as_deref().unwrap_or("-"), "SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn handshake_event(uid: Option<String>) -> Option<Event> {
    let handshake = Handshake {
        message: "stream connected".into(),
        uid,
    };
    match Event::default().event(EVENT_HANDSHAKE).json_data(&handshake) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE handshake");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::game_store::memory::MemoryStore, state::AppState};

    #[tokio::test]
    async fn user_streams_are_counted_while_open() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(AppConfig::default(), store.clone(), store);

        let (_anonymous, none) = subscribe(&state, None);
        assert!(none.is_none());

        let (_receiver, registration) = subscribe(&state, Some("uid-1"));
        assert!(state.sse().has_listener("uid-1"));
        assert!(!state.sse().has_listener("uid-2"));

        drop(registration);
        assert!(!state.sse().has_listener("uid-1"));
    }
}
