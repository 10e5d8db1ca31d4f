use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        molkky::GameSummary,
        settings::SettingsDto,
        sse::{
            GameUpdatedEvent, ServerEvent, SettingsChangedEvent, TimerChangedEvent,
            TimerDeletedEvent, TimerFrameEvent,
        },
        timer::TimerSnapshot,
    },
    state::{SharedState, countdown::Tick, settings::GameKind},
};

pub(crate) const EVENT_TIMER_FRAME: &str = "timer.frame";
pub(crate) const EVENT_TIMER_CHANGED: &str = "timer.changed";
pub(crate) const EVENT_TIMER_DELETED: &str = "timer.deleted";
pub(crate) const EVENT_GAME_UPDATED: &str = "game.updated";
pub(crate) const EVENT_SETTINGS_CHANGED: &str = "settings.changed";

/// Broadcast a new remaining value of a running timer to its owner.
pub fn broadcast_timer_frame(state: &SharedState, owner: &str, id: Uuid, tick: &Tick) {
    let payload = TimerFrameEvent {
        id,
        remaining: tick.remaining,
        angle: tick.dial.angle,
        path: tick.dial.path.clone(),
        color: tick.dial.color.clone(),
        restarted: tick.restarted,
    };
    send_event(state, [owner], EVENT_TIMER_FRAME, &payload);
}

/// Broadcast the state of a timer after a control or a settings change.
pub fn broadcast_timer_changed(state: &SharedState, owner: &str, snapshot: TimerSnapshot) {
    send_event(
        state,
        [owner],
        EVENT_TIMER_CHANGED,
        &TimerChangedEvent(snapshot),
    );
}

/// Broadcast that a timer has been dropped.
pub fn broadcast_timer_deleted(state: &SharedState, owner: &str, id: Uuid) {
    send_event(state, [owner], EVENT_TIMER_DELETED, &TimerDeletedEvent { id });
}

/// Broadcast the new state of a game to every user it is shared with.
pub fn broadcast_game_updated(state: &SharedState, uids: &[String], summary: GameSummary) {
    send_event(
        state,
        uids.iter().map(String::as_str),
        EVENT_GAME_UPDATED,
        &GameUpdatedEvent(summary),
    );
}

/// Broadcast freshly saved settings to the connections of their owner.
pub fn broadcast_settings_changed(
    state: &SharedState,
    uid: &str,
    kind: GameKind,
    settings: SettingsDto,
) {
    send_event(
        state,
        [uid],
        EVENT_SETTINGS_CHANGED,
        &SettingsChangedEvent { kind, settings },
    );
}

fn send_event<'a>(
    state: &SharedState,
    audience: impl IntoIterator<Item = &'a str>,
    event: &str,
    payload: &impl Serialize,
) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => state.sse().broadcast(message.for_audiences(audience)),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
