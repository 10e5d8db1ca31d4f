use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Broadcast hub shared by every SSE connection. Each subscriber filters the events
/// addressed to its own user.
#[derive(Clone)]
pub struct SseHub {
    sender: Arc<broadcast::Sender<ServerEvent>>,
    listeners: Arc<DashMap<String, usize>>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
            listeners: Arc::new(DashMap::new()),
        }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Record an open stream of `uid` until the returned registration is dropped.
    pub fn register(&self, uid: &str) -> ListenerRegistration {
        *self.listeners.entry(uid.to_string()).or_default() += 1;
        ListenerRegistration {
            listeners: self.listeners.clone(),
            uid: uid.to_string(),
        }
    }

    /// Whether `uid` has at least one open stream.
    pub fn has_listener(&self, uid: &str) -> bool {
        self.listeners.get(uid).is_some_and(|count| *count > 0)
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// Open stream of one user, counted by its hub.
pub struct ListenerRegistration {
    listeners: Arc<DashMap<String, usize>>,
    uid: String,
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        if let Some(mut count) = self.listeners.get_mut(&self.uid) {
            *count = count.saturating_sub(1);
        }
        self.listeners.remove_if(&self.uid, |_, count| *count == 0);
    }
}
