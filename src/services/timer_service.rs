use std::{sync::Arc, time::Instant};

use rand::{SeedableRng, rngs::StdRng};
use tokio::{
    sync::Mutex,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::timer::TimerSnapshot,
    error::ServiceError,
    services::{settings_service, sse_events},
    speech::{Speaker, Utterance},
    state::{
        SharedState, TimerHandle, TimerSession,
        countdown::{CountdownTimer, TimerPhase},
        settings::{CountdownSettings, GameKind},
    },
};

/// Controls applicable to a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerControl {
    /// Start a full countdown (restarts a running one).
    Start,
    /// Freeze the countdown.
    Pause,
    /// Continue a paused countdown.
    Resume,
    /// Play/pause button.
    Toggle,
    /// Start over with the full duration.
    Reset,
}

/// Create an idle timer for `kind`, using the countdown settings of `uid`.
pub async fn create_timer(
    state: &SharedState,
    uid: &str,
    kind: GameKind,
) -> Result<TimerSnapshot, ServiceError> {
    let settings = settings_service::load_settings(state, uid, kind)
        .await?
        .countdown()
        .ok_or_else(|| ServiceError::InvalidInput(format!("`{kind}` has no countdown")))?;

    let timer = CountdownTimer::new(settings, state.config().cues().clone());
    let session = TimerSession::new(uid.to_string(), kind, timer, state.speaker_for(uid));
    let id = session.id;
    let snapshot = snapshot(&session, Instant::now());

    state.timers().insert(id, Arc::new(Mutex::new(session)));
    info!(%id, uid, %kind, "timer created");
    sse_events::broadcast_timer_changed(state, uid, snapshot.clone());

    Ok(snapshot)
}

/// Timers owned by `uid`.
pub async fn list_timers(state: &SharedState, uid: &str) -> Vec<TimerSnapshot> {
    let now = Instant::now();
    let mut snapshots = Vec::new();
    for handle in handles(state) {
        let session = handle.lock().await;
        if session.owner == uid {
            snapshots.push(snapshot(&session, now));
        }
    }
    snapshots
}

/// Current state of a timer owned by `uid`.
pub async fn get_timer(
    state: &SharedState,
    uid: &str,
    id: Uuid,
) -> Result<TimerSnapshot, ServiceError> {
    let handle = find_timer(state, id)?;
    let session = handle.lock().await;
    ensure_owner(&session, uid)?;
    Ok(snapshot(&session, Instant::now()))
}

/// Stop and forget a timer owned by `uid`.
pub async fn delete_timer(state: &SharedState, uid: &str, id: Uuid) -> Result<(), ServiceError> {
    let handle = find_timer(state, id)?;
    {
        let mut session = handle.lock().await;
        ensure_owner(&session, uid)?;
        session.stop_driver();
    }

    state.timers().remove(&id);
    info!(%id, uid, "timer deleted");
    sse_events::broadcast_timer_deleted(state, uid, id);
    Ok(())
}

/// Apply `control` to a timer owned by `uid`.
pub async fn control_timer(
    state: &SharedState,
    uid: &str,
    id: Uuid,
    control: TimerControl,
) -> Result<TimerSnapshot, ServiceError> {
    let handle = find_timer(state, id)?;
    let mut session = handle.lock().await;
    ensure_owner(&session, uid)?;

    let now = Instant::now();
    match control {
        TimerControl::Start | TimerControl::Reset => session.timer.start(now),
        TimerControl::Pause => session.timer.pause(now)?,
        TimerControl::Resume => session.timer.resume(now)?,
        TimerControl::Toggle => session.timer.toggle(now),
    }
    refresh_driver(state, &handle, &mut session);

    let snapshot = snapshot(&session, now);
    debug!(%id, ?control, phase = ?session.timer.phase(), "timer controlled");
    sse_events::broadcast_timer_changed(state, uid, snapshot.clone());
    Ok(snapshot)
}

/// Push new countdown settings to every timer of `uid` for `kind`. Running timers
/// restart with the new length.
pub async fn apply_settings(
    state: &SharedState,
    uid: &str,
    kind: GameKind,
    settings: CountdownSettings,
) {
    for handle in handles(state) {
        let mut session = handle.lock().await;
        if session.owner != uid || session.kind != kind {
            continue;
        }

        let now = Instant::now();
        session.timer.apply_settings(settings, now);
        refresh_driver(state, &handle, &mut session);
        debug!(id = %session.id, uid, %kind, "timer settings updated");
        sse_events::broadcast_timer_changed(state, uid, snapshot(&session, now));
    }
}

/// Clone the handles out of the registry so no shard lock is held across awaits.
fn handles(state: &SharedState) -> Vec<TimerHandle> {
    state
        .timers()
        .iter()
        .map(|entry| entry.value().clone())
        .collect()
}

fn find_timer(state: &SharedState, id: Uuid) -> Result<TimerHandle, ServiceError> {
    state
        .timers()
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| ServiceError::NotFound(format!("timer `{id}` not found")))
}

/// Timers of other users are reported as missing.
fn ensure_owner(session: &TimerSession, uid: &str) -> Result<(), ServiceError> {
    if session.owner == uid {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "timer `{}` not found",
            session.id
        )))
    }
}

/// Spawn a driver for the current generation when the timer runs, stop it otherwise.
fn refresh_driver(state: &SharedState, handle: &TimerHandle, session: &mut TimerSession) {
    if session.timer.phase() == TimerPhase::Running {
        let generation = session.timer.generation();
        let driver = tokio::spawn(drive(state.clone(), handle.clone(), generation));
        session.replace_driver(driver);
    } else {
        session.stop_driver();
    }
}

/// Tick the timer until its generation changes or it stops running.
async fn drive(state: SharedState, handle: TimerHandle, generation: u64) {
    let mut rng = StdRng::from_os_rng();
    let mut ticker = interval(state.config().tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let mut session = handle.lock().await;
        if session.timer.generation() != generation || session.timer.phase() != TimerPhase::Running
        {
            break;
        }
        let Some(tick) = session.timer.tick_for(generation, Instant::now(), &mut rng) else {
            continue;
        };

        if let Some(cue) = &tick.cue {
            announce(session.speaker.clone(), session.id, cue.utterance());
        }
        if tick.restarted {
            info!(id = %session.id, "countdown reached zero; restarting");
        }
        sse_events::broadcast_timer_frame(&state, &session.owner, session.id, &tick);
    }

    debug!(%generation, "timer driver stopped");
}

/// Hand the utterance to the speaker without holding up the tick loop.
fn announce(speaker: Arc<dyn Speaker>, id: Uuid, utterance: Utterance) {
    let text = utterance.text.clone();
    let speech = speaker.speak(utterance);
    tokio::spawn(async move {
        if let Err(err) = speech.await {
            debug!(%id, text, error = %err, "cue not spoken");
        }
    });
}

fn snapshot(session: &TimerSession, now: Instant) -> TimerSnapshot {
    let remaining = session.timer.remaining_at(now).as_secs_f64();
    let dial = session.timer.dial_at(now);
    TimerSnapshot {
        id: session.id,
        kind: session.kind,
        phase: session.timer.phase().into(),
        remaining: (remaining * 10.0).round() / 10.0,
        angle: dial.angle,
        path: dial.path,
        color: dial.color,
        settings: session.timer.settings().into(),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex as StdMutex, time::Duration};

    use futures::future::BoxFuture;
    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::memory::MemoryStore,
        dto::{
            settings::{CountdownSettingsDto, SettingsDto},
            timer::VisibleTimerPhase,
        },
        services::sse_events::{EVENT_TIMER_CHANGED, EVENT_TIMER_FRAME},
        speech::SpeechError,
        state::{AppState, countdown::CueSchedule},
    };

    #[derive(Default)]
    struct RecordingSpeaker {
        spoken: StdMutex<Vec<String>>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, utterance: Utterance) -> BoxFuture<'static, Result<(), SpeechError>> {
            self.spoken.lock().unwrap().push(utterance.text);
            Box::pin(async { Ok(()) })
        }
    }

    fn app(speaker: Arc<RecordingSpeaker>) -> SharedState {
        let store = Arc::new(MemoryStore::new());
        let config = AppConfig::default()
            .with_tick_interval(Duration::from_millis(10))
            .with_cues(CueSchedule {
                thresholds: vec![1],
                sarcasm_at: None,
                lead: 0.9,
                remarks: Vec::new(),
            });
        AppState::with_speaker(config, store.clone(), store, speaker)
    }

    #[tokio::test]
    async fn new_timer_is_idle_with_full_time() {
        let state = app(Arc::default());
        let timer = create_timer(&state, "uid-1", GameKind::Timer).await.unwrap();

        assert_eq!(timer.phase, VisibleTimerPhase::Idle);
        assert_eq!(timer.remaining, 60.0);
        assert_eq!(timer.angle, 0);
        assert_eq!(timer.color, "#00ff00");
    }

    #[tokio::test]
    async fn molkky_has_no_timer() {
        let state = app(Arc::default());
        assert!(matches!(
            create_timer(&state, "uid-1", GameKind::Molkky).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn timers_are_private_to_their_owner() {
        let state = app(Arc::default());
        let timer = create_timer(&state, "uid-1", GameKind::Rummikub)
            .await
            .unwrap();

        assert!(matches!(
            get_timer(&state, "uid-2", timer.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_timer(&state, "uid-2", timer.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(list_timers(&state, "uid-2").await.is_empty());
        assert_eq!(list_timers(&state, "uid-1").await.len(), 1);

        delete_timer(&state, "uid-1", timer.id).await.unwrap();
        assert!(list_timers(&state, "uid-1").await.is_empty());
    }

    #[tokio::test]
    async fn controls_follow_the_phase() {
        let state = app(Arc::default());
        let id = create_timer(&state, "uid-1", GameKind::Timer)
            .await
            .unwrap()
            .id;

        assert!(matches!(
            control_timer(&state, "uid-1", id, TimerControl::Pause).await,
            Err(ServiceError::InvalidState(_))
        ));

        let running = control_timer(&state, "uid-1", id, TimerControl::Toggle)
            .await
            .unwrap();
        assert_eq!(running.phase, VisibleTimerPhase::Running);

        let paused = control_timer(&state, "uid-1", id, TimerControl::Toggle)
            .await
            .unwrap();
        assert_eq!(paused.phase, VisibleTimerPhase::Paused);

        let resumed = control_timer(&state, "uid-1", id, TimerControl::Resume)
            .await
            .unwrap();
        assert_eq!(resumed.phase, VisibleTimerPhase::Running);

        let reset = control_timer(&state, "uid-1", id, TimerControl::Reset)
            .await
            .unwrap();
        assert_eq!(reset.remaining, 60.0);
    }

    #[tokio::test]
    async fn running_timer_streams_frames_and_speaks_cues() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let state = app(speaker.clone());
        let mut receiver = state.sse().subscribe();

        let id = create_timer(&state, "uid-1", GameKind::Timer)
            .await
            .unwrap()
            .id;
        control_timer(&state, "uid-1", id, TimerControl::Start)
            .await
            .unwrap();

        let frame = timeout(Duration::from_secs(2), async {
            loop {
                let event = receiver.recv().await.unwrap();
                if event.event.as_deref() == Some(EVENT_TIMER_FRAME) {
                    return event;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(frame.audience, vec!["uid-1".to_string()]);

        // a 60s countdown with a 0.9s lead crosses threshold 1 only near the end,
        // so shorten it through the settings first
        save_short_countdown(&state).await;
        let spoken = timeout(Duration::from_secs(2), async {
            loop {
                if let Some(text) = speaker.spoken.lock().unwrap().first().cloned() {
                    return text;
                }
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(spoken, "1");
    }

    #[tokio::test]
    async fn saving_settings_restarts_running_timers_of_that_kind() {
        let state = app(Arc::default());
        let timer = create_timer(&state, "uid-1", GameKind::Timer)
            .await
            .unwrap();
        let rummikub = create_timer(&state, "uid-1", GameKind::Rummikub)
            .await
            .unwrap();
        control_timer(&state, "uid-1", timer.id, TimerControl::Start)
            .await
            .unwrap();
        let mut receiver = state.sse().subscribe();

        save_short_countdown(&state).await;

        let updated = get_timer(&state, "uid-1", timer.id).await.unwrap();
        assert_eq!(updated.phase, VisibleTimerPhase::Running);
        assert_eq!(updated.settings.countdown, 2);
        assert!(updated.remaining <= 2.0);

        let untouched = get_timer(&state, "uid-1", rummikub.id).await.unwrap();
        assert_eq!(untouched.settings.countdown, 60);

        let changed = timeout(Duration::from_secs(1), async {
            loop {
                let event = receiver.recv().await.unwrap();
                if event.event.as_deref() == Some(EVENT_TIMER_CHANGED) {
                    return event;
                }
            }
        })
        .await
        .unwrap();
        assert!(changed.data.contains(&timer.id.to_string()));
    }

    async fn save_short_countdown(state: &SharedState) {
        settings_service::save_settings(
            state,
            "uid-1",
            GameKind::Timer,
            SettingsDto::Countdown(CountdownSettingsDto {
                countdown: 2,
                speech: true,
                sarcasm: 0.0,
            }),
        )
        .await
        .unwrap();
    }
}
