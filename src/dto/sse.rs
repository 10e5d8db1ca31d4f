use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{molkky::GameSummary, settings::SettingsDto, timer::TimerSnapshot},
    state::settings::GameKind,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
    /// Users the event is meant for. Empty means everyone.
    pub audience: Vec<String>,
}

impl ServerEvent {
    /// Raw event with a preformatted data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self {
            event,
            data,
            audience: Vec::new(),
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self::new(event.into(), serde_json::to_string(payload)?))
    }

    /// Restrict delivery to the connections of `uid`.
    pub fn for_audience(mut self, uid: &str) -> Self {
        self.audience.push(uid.to_string());
        self
    }

    /// Restrict delivery to the connections of any of `uids`.
    pub fn for_audiences<I, S>(mut self, uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience.extend(uids.into_iter().map(Into::into));
        self
    }

    /// Whether a connection opened by `uid` (or anonymously) should receive the event.
    pub fn reaches(&self, uid: Option<&str>) -> bool {
        if self.audience.is_empty() {
            return true;
        }
        uid.is_some_and(|uid| self.audience.iter().any(|candidate| candidate == uid))
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// User the stream is scoped to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast on every tick that changes the displayed remaining time.
pub struct TimerFrameEvent {
    pub id: Uuid,
    /// Remaining seconds rounded to a tenth.
    pub remaining: f64,
    /// Elapsed angle of the dial in degrees.
    pub angle: u32,
    /// SVG path of the elapsed sector.
    pub path: String,
    /// Dial fill color.
    pub color: String,
    /// Whether the countdown just reached zero and started over.
    pub restarted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a timer is created, controlled or reconfigured.
pub struct TimerChangedEvent(pub TimerSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a timer has been dropped.
pub struct TimerDeletedEvent {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever a game changes.
pub struct GameUpdatedEvent(pub GameSummary);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a user saved new settings.
pub struct SettingsChangedEvent {
    pub kind: GameKind,
    pub settings: SettingsDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_without_audience_reach_everyone() {
        let event = ServerEvent::new(Some("info".into()), "hello".into());
        assert!(event.reaches(None));
        assert!(event.reaches(Some("uid-1")));
    }

    #[test]
    fn scoped_events_reach_only_their_audience() {
        let uids = vec!["uid-1".to_string(), "uid-2".to_string()];
        let event = ServerEvent::new(None, "{}".into()).for_audiences(&uids);

        assert!(event.reaches(Some("uid-2")));
        assert!(!event.reaches(Some("uid-3")));
        assert!(!event.reaches(None));
    }
}
