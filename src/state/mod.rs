pub mod countdown;
pub mod dial;
pub mod molkky;
pub mod rules;
pub mod settings;
mod sse;
mod timers;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::game_store::{GameStore, SettingsStore},
    speech::{Speaker, SseSpeaker},
};

pub use self::sse::{ListenerRegistration, SseHub};
pub use self::timers::TimerSession;

pub type SharedState = Arc<AppState>;

/// Capacity of the SSE broadcast channel. Timer frames are frequent, so slow clients
/// may lag and skip frames.
const SSE_CAPACITY: usize = 256;

/// Handle to a live timer. The lock is held for the duration of a control or a tick.
pub type TimerHandle = Arc<Mutex<TimerSession>>;

/// Central application state: configuration, stores, live timers and the SSE hub.
pub struct AppState {
    config: AppConfig,
    games: Arc<dyn GameStore>,
    settings: Arc<dyn SettingsStore>,
    sse: SseHub,
    speaker: Option<Arc<dyn Speaker>>,
    timers: DashMap<Uuid, TimerHandle>,
    record_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    /// Timers announce their cues on the SSE stream of their owner.
    pub fn new(
        config: AppConfig,
        games: Arc<dyn GameStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> SharedState {
        Arc::new(Self::build(config, games, settings, None))
    }

    /// Same as [`AppState::new`] but every timer speaks through `speaker`.
    pub fn with_speaker(
        config: AppConfig,
        games: Arc<dyn GameStore>,
        settings: Arc<dyn SettingsStore>,
        speaker: Arc<dyn Speaker>,
    ) -> SharedState {
        Arc::new(Self::build(config, games, settings, Some(speaker)))
    }

    fn build(
        config: AppConfig,
        games: Arc<dyn GameStore>,
        settings: Arc<dyn SettingsStore>,
        speaker: Option<Arc<dyn Speaker>>,
    ) -> Self {
        Self {
            config,
            games,
            settings,
            sse: SseHub::new(SSE_CAPACITY),
            speaker,
            timers: DashMap::new(),
            record_locks: DashMap::new(),
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Store of games and player records.
    pub fn games(&self) -> Arc<dyn GameStore> {
        self.games.clone()
    }

    /// Store of per-user settings records.
    pub fn settings(&self) -> Arc<dyn SettingsStore> {
        self.settings.clone()
    }

    /// Broadcast hub used for the SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Speaker used by the timers of `uid`.
    pub fn speaker_for(&self, uid: &str) -> Arc<dyn Speaker> {
        match &self.speaker {
            Some(speaker) => speaker.clone(),
            None => Arc::new(SseSpeaker::new(self.sse.clone(), uid)),
        }
    }

    /// Registry of live timers keyed by their identifier.
    pub fn timers(&self) -> &DashMap<Uuid, TimerHandle> {
        &self.timers
    }

    /// Serialize read-modify-write cycles on one game or player record. The lock
    /// entry is dropped again once nobody holds or awaits it.
    pub async fn lock_record(self: &Arc<Self>, id: Uuid) -> RecordGuard {
        let lock = self.record_locks.entry(id).or_default().clone();
        let guard = lock.lock_owned().await;
        RecordGuard {
            state: self.clone(),
            id,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn record_lock_count(&self) -> usize {
        self.record_locks.len()
    }
}

/// Exclusive access to one record, released on drop.
pub struct RecordGuard {
    state: SharedState,
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // the map keeps one reference, waiters hold the others
        self.state
            .record_locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
