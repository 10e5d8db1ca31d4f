//! Countdown timer: remaining-time arithmetic, spoken cues and restart handling.
//!
//! The timer never reads the clock itself. Every operation receives `now`, which keeps
//! the arithmetic deterministic and lets the caller drive ticks from any scheduler.

use std::time::{Duration, Instant};

use rand::{Rng, seq::IndexedRandom};
use thiserror::Error;

use crate::{
    speech::Utterance,
    state::{dial::Dial, settings::CountdownSettings},
};

/// Thresholds at which cues are spoken, and the remarks used at the sarcasm threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct CueSchedule {
    /// Remaining seconds at which a cue fires, in descending order.
    pub thresholds: Vec<u32>,
    /// Threshold replaced by an optional sarcastic remark instead of a number.
    pub sarcasm_at: Option<u32>,
    /// How many seconds ahead of a threshold the cue is spoken.
    pub lead: f64,
    /// Remarks picked at random at the sarcasm threshold.
    pub remarks: Vec<Utterance>,
}

impl Default for CueSchedule {
    fn default() -> Self {
        Self {
            thresholds: vec![30, 15, 10, 3, 2, 1],
            sarcasm_at: Some(15),
            lead: 0.25,
            remarks: vec![
                Utterance::new("We're waiting"),
                Utterance::new("Tick Tock"),
                Utterance {
                    text: "Yawn".into(),
                    pitch: Some(0.5),
                    rate: Some(0.4),
                },
                Utterance::new("I'm bored"),
            ],
        }
    }
}

impl CueSchedule {
    /// Index of the first threshold strictly below `duration` seconds.
    fn first_below(&self, duration: u32) -> usize {
        self.thresholds
            .iter()
            .position(|&threshold| threshold < duration)
            .unwrap_or(self.thresholds.len())
    }
}

/// Observable phases of a countdown. Reaching zero restarts the countdown on the spot,
/// so there is no lasting finished phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Never started.
    Idle,
    /// Counting down.
    Running,
    /// Frozen with some time left.
    Paused,
}

/// Error returned when a control does not apply to the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} a timer that is {phase:?}")]
pub struct InvalidTimerAction {
    /// Requested control.
    pub action: &'static str,
    /// Phase at the time of the request.
    pub phase: TimerPhase,
}

/// Something to announce while counting down.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// Read out the number of seconds left.
    Count(u32),
    /// Sarcastic remark.
    Remark(Utterance),
}

impl Cue {
    /// Utterance to hand over to the speaker.
    pub fn utterance(&self) -> Utterance {
        match self {
            Cue::Count(seconds) => Utterance::new(seconds.to_string()),
            Cue::Remark(utterance) => utterance.clone(),
        }
    }
}

/// Output of a tick that produced a new remaining value.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Remaining seconds rounded to a tenth.
    pub remaining: f64,
    /// Dial rendering of `remaining`.
    pub dial: Dial,
    /// Cue to announce, if a threshold was crossed.
    pub cue: Option<Cue>,
    /// Whether the countdown reached zero and started over.
    pub restarted: bool,
}

/// Countdown timer state.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    settings: CountdownSettings,
    cues: CueSchedule,
    phase: TimerPhase,
    finish_at: Option<Instant>,
    paused_remaining: Option<Duration>,
    next_cue: usize,
    last_tenths: Option<u64>,
    generation: u64,
}

impl CountdownTimer {
    /// Create an idle timer.
    pub fn new(settings: CountdownSettings, cues: CueSchedule) -> Self {
        Self {
            settings,
            cues,
            phase: TimerPhase::Idle,
            finish_at: None,
            paused_remaining: None,
            next_cue: 0,
            last_tenths: None,
            generation: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Settings in effect.
    pub fn settings(&self) -> CountdownSettings {
        self.settings
    }

    /// Counter bumped by every external control. Ticks scheduled under an older
    /// generation must be discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Configured countdown length.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.settings.countdown))
    }

    /// Time left at `now` without advancing the timer.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        match (self.phase, self.finish_at, self.paused_remaining) {
            (TimerPhase::Running, Some(finish_at), _) => finish_at.saturating_duration_since(now),
            (TimerPhase::Paused, _, Some(remaining)) => remaining,
            _ => self.duration(),
        }
    }

    /// Dial rendering at `now` without advancing the timer.
    pub fn dial_at(&self, now: Instant) -> Dial {
        Dial::new(
            self.remaining_at(now).as_secs_f64(),
            f64::from(self.settings.countdown),
        )
    }

    /// Start (or restart) a full countdown.
    pub fn start(&mut self, now: Instant) {
        self.generation += 1;
        self.restart(now);
    }

    /// Freeze the countdown, remembering the time left.
    pub fn pause(&mut self, now: Instant) -> Result<(), InvalidTimerAction> {
        let (TimerPhase::Running, Some(finish_at)) = (self.phase, self.finish_at) else {
            return Err(self.invalid("pause"));
        };

        self.freeze(finish_at, now);
        Ok(())
    }

    /// Continue a paused countdown from where it stopped. Cues already spoken stay
    /// spoken.
    pub fn resume(&mut self, now: Instant) -> Result<(), InvalidTimerAction> {
        let (TimerPhase::Paused, Some(remaining)) = (self.phase, self.paused_remaining) else {
            return Err(self.invalid("resume"));
        };

        self.thaw(remaining, now);
        Ok(())
    }

    /// Play/pause button: pause a running timer, resume a paused one, start an idle one.
    pub fn toggle(&mut self, now: Instant) {
        match (self.phase, self.finish_at, self.paused_remaining) {
            (TimerPhase::Running, Some(finish_at), _) => self.freeze(finish_at, now),
            (TimerPhase::Paused, _, Some(remaining)) => self.thaw(remaining, now),
            _ => self.start(now),
        }
    }

    /// Replace the settings. A running countdown restarts with the new length.
    pub fn apply_settings(&mut self, settings: CountdownSettings, now: Instant) {
        self.settings = settings;
        if self.phase == TimerPhase::Running {
            self.start(now);
        }
    }

    /// Advance the countdown to `now`, provided the caller's generation is still
    /// current. See [`CountdownTimer::tick`].
    pub fn tick_for<R: Rng>(
        &mut self,
        generation: u64,
        now: Instant,
        rng: &mut R,
    ) -> Option<Tick> {
        if generation != self.generation {
            return None;
        }
        self.tick(now, rng)
    }

    /// Advance the countdown to `now`. Returns `None` while not running or when the
    /// rounded remaining time did not change since the previous tick.
    pub fn tick<R: Rng>(&mut self, now: Instant, rng: &mut R) -> Option<Tick> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let finish_at = self.finish_at?;

        let mut remaining = finish_at.saturating_duration_since(now);
        let restarted = remaining.is_zero();
        if restarted {
            self.restart(now);
            remaining = self.duration();
        }

        let tenths = (remaining.as_secs_f64() * 10.0).round() as u64;
        if !restarted && self.last_tenths == Some(tenths) {
            return None;
        }
        self.last_tenths = Some(tenths);

        let remaining = tenths as f64 / 10.0;
        let cue = self.take_cue(remaining, rng);

        Some(Tick {
            remaining,
            dial: Dial::new(remaining, f64::from(self.settings.countdown)),
            cue,
            restarted,
        })
    }

    fn freeze(&mut self, finish_at: Instant, now: Instant) {
        self.generation += 1;
        self.paused_remaining = Some(finish_at.saturating_duration_since(now));
        self.finish_at = None;
        self.phase = TimerPhase::Paused;
    }

    fn thaw(&mut self, remaining: Duration, now: Instant) {
        self.generation += 1;
        self.finish_at = Some(now + remaining);
        self.paused_remaining = None;
        self.phase = TimerPhase::Running;
    }

    fn restart(&mut self, now: Instant) {
        self.phase = TimerPhase::Running;
        self.finish_at = Some(now + self.duration());
        self.paused_remaining = None;
        self.next_cue = self.cues.first_below(self.settings.countdown);
        self.last_tenths = None;
    }

    /// Consume every threshold crossed by `remaining` and announce the lowest one.
    fn take_cue<R: Rng>(&mut self, remaining: f64, rng: &mut R) -> Option<Cue> {
        let ahead = remaining - self.cues.lead;
        let mut crossed = None;
        while let Some(&threshold) = self.cues.thresholds.get(self.next_cue) {
            if ahead > f64::from(threshold) {
                break;
            }
            self.next_cue += 1;
            crossed = Some(threshold);
        }
        let threshold = crossed?;

        if self.cues.sarcasm_at == Some(threshold) {
            let sarcasm = self.settings.sarcasm.clamp(0.0, 1.0);
            if sarcasm <= 0.0 || !rng.random_bool(sarcasm) {
                return None;
            }
            return self.cues.remarks.choose(rng).cloned().map(Cue::Remark);
        }

        if !self.settings.speech {
            return None;
        }
        Some(Cue::Count(ahead.round().max(0.0) as u32))
    }

    fn invalid(&self, action: &'static str) -> InvalidTimerAction {
        InvalidTimerAction {
            action,
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn timer(countdown: u32, sarcasm: f64) -> CountdownTimer {
        CountdownTimer::new(
            CountdownSettings {
                countdown,
                speech: true,
                sarcasm,
            },
            CueSchedule::default(),
        )
    }

    fn millis(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Tick every 50 ms from `from` (inclusive) to `to` (exclusive), collecting cues.
    fn run(
        timer: &mut CountdownTimer,
        start: Instant,
        from: u64,
        to: u64,
        rng: &mut StdRng,
    ) -> Vec<Cue> {
        (from..to)
            .step_by(50)
            .filter_map(|elapsed| timer.tick(start + millis(elapsed), rng))
            .filter_map(|tick| tick.cue)
            .collect()
    }

    #[test]
    fn idle_timer_does_not_tick() {
        let mut timer = timer(30, 0.0);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(timer.tick(Instant::now(), &mut rng).is_none());
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn remaining_is_rounded_and_deduplicated() {
        let mut timer = timer(30, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let start = Instant::now();
        timer.start(start);

        let first = timer.tick(start + millis(26_800), &mut rng).unwrap();
        assert_eq!(first.remaining, 3.2);
        assert!(timer.tick(start + millis(26_820), &mut rng).is_none());

        let next = timer.tick(start + millis(26_900), &mut rng).unwrap();
        assert_eq!(next.remaining, 3.1);
    }

    #[test]
    fn three_is_announced_exactly_once() {
        let mut timer = timer(30, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let start = Instant::now();
        timer.start(start);

        let before = run(&mut timer, start, 0, 26_750, &mut rng);
        assert!(!before.contains(&Cue::Count(3)));
        assert_eq!(before, vec![Cue::Count(10)]);

        let at = timer.tick(start + millis(26_800), &mut rng).unwrap();
        assert_eq!(at.remaining, 3.2);
        assert_eq!(at.cue, Some(Cue::Count(3)));

        let after = run(&mut timer, start, 26_850, 27_700, &mut rng);
        assert!(after.is_empty());
    }

    #[test]
    fn full_countdown_reads_every_threshold_below_duration() {
        let mut timer = timer(12, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let start = Instant::now();
        timer.start(start);

        let cues = run(&mut timer, start, 0, 12_000, &mut rng);
        assert_eq!(
            cues,
            vec![Cue::Count(10), Cue::Count(3), Cue::Count(2), Cue::Count(1)]
        );
    }

    #[test]
    fn silent_timer_announces_nothing() {
        let mut timer = CountdownTimer::new(
            CountdownSettings {
                countdown: 12,
                speech: false,
                sarcasm: 0.0,
            },
            CueSchedule::default(),
        );
        let mut rng = StdRng::seed_from_u64(3);
        let start = Instant::now();
        timer.start(start);

        assert!(run(&mut timer, start, 0, 12_000, &mut rng).is_empty());
    }

    #[test]
    fn sarcasm_threshold_speaks_a_remark_instead_of_a_number() {
        let schedule = CueSchedule::default();
        let mut timer = timer(20, 1.0);
        let mut rng = StdRng::seed_from_u64(11);
        let start = Instant::now();
        timer.start(start);

        let cues = run(&mut timer, start, 0, 6_000, &mut rng);
        assert_eq!(cues.len(), 1);
        match &cues[0] {
            Cue::Remark(remark) => assert!(schedule.remarks.contains(remark)),
            other => panic!("expected a remark, got {other:?}"),
        }
    }

    #[test]
    fn sarcasm_threshold_is_silent_without_sarcasm() {
        let mut timer = timer(20, 0.0);
        let mut rng = StdRng::seed_from_u64(11);
        let start = Instant::now();
        timer.start(start);

        assert!(run(&mut timer, start, 0, 6_000, &mut rng).is_empty());
    }

    #[test]
    fn late_tick_only_announces_the_lowest_crossed_threshold() {
        let mut timer = timer(30, 0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();
        timer.start(start);

        let tick = timer.tick(start + millis(28_000), &mut rng).unwrap();
        assert_eq!(tick.cue, Some(Cue::Count(2)));
    }

    #[test]
    fn reaching_zero_restarts_the_countdown() {
        let mut timer = timer(5, 0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();
        timer.start(start);

        let tick = timer.tick(start + millis(5_000), &mut rng).unwrap();
        assert!(tick.restarted);
        assert_eq!(tick.remaining, 5.0);
        assert_eq!(tick.dial.angle, 0);
        assert_eq!(timer.phase(), TimerPhase::Running);

        let later = timer.tick(start + millis(7_000), &mut rng).unwrap();
        assert_eq!(later.remaining, 3.0);
        assert_eq!(later.cue, Some(Cue::Count(3)));
    }

    #[test]
    fn pause_and_resume_keep_remaining_time() {
        let mut timer = timer(30, 0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();
        timer.start(start);

        timer.pause(start + millis(20_000)).unwrap();
        assert_eq!(timer.phase(), TimerPhase::Paused);
        assert!(timer.tick(start + millis(25_000), &mut rng).is_none());
        assert_eq!(timer.remaining_at(start + millis(90_000)), millis(10_000));

        let resumed_at = start + millis(100_000);
        timer.resume(resumed_at).unwrap();
        let tick = timer.tick(resumed_at, &mut rng).unwrap();
        assert_eq!(tick.remaining, 10.0);
    }

    #[test]
    fn resume_keeps_the_cue_position() {
        let mut timer = timer(30, 0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();
        timer.start(start);
        timer.tick(start + millis(20_100), &mut rng).unwrap();

        timer.pause(start + millis(20_200)).unwrap();
        let resumed_at = start + millis(60_000);
        timer.resume(resumed_at).unwrap();

        let tick = timer.tick(resumed_at + millis(100), &mut rng).unwrap();
        assert_eq!(tick.remaining, 9.7);
        assert_eq!(tick.cue, None);
    }

    #[test]
    fn invalid_controls_are_rejected() {
        let mut timer = timer(30, 0.0);
        let now = Instant::now();

        assert_eq!(
            timer.pause(now),
            Err(InvalidTimerAction {
                action: "pause",
                phase: TimerPhase::Idle,
            })
        );
        timer.start(now);
        assert!(timer.resume(now).is_err());
    }

    #[test]
    fn toggle_cycles_through_phases() {
        let mut timer = timer(30, 0.0);
        let now = Instant::now();

        timer.toggle(now);
        assert_eq!(timer.phase(), TimerPhase::Running);
        let started = timer.generation();

        timer.toggle(now + millis(1_000));
        assert_eq!(timer.phase(), TimerPhase::Paused);
        assert_eq!(timer.generation(), started + 1);
        assert_eq!(timer.remaining_at(now + millis(1_500)), millis(29_000));

        timer.toggle(now + millis(2_000));
        assert_eq!(timer.phase(), TimerPhase::Running);
        assert_eq!(timer.generation(), started + 2);
        assert_eq!(timer.remaining_at(now + millis(2_000)), millis(29_000));
    }

    #[test]
    fn stale_generation_ticks_are_discarded() {
        let mut timer = timer(30, 0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();
        timer.start(start);
        let stale = timer.generation();

        timer.start(start + millis(1_000));
        assert!(timer.tick_for(stale, start + millis(2_000), &mut rng).is_none());

        let current = timer.generation();
        let tick = timer
            .tick_for(current, start + millis(2_000), &mut rng)
            .unwrap();
        assert_eq!(tick.remaining, 29.0);
    }

    #[test]
    fn new_settings_restart_a_running_countdown() {
        let mut timer = timer(30, 0.0);
        let start = Instant::now();
        timer.start(start);

        let settings = CountdownSettings {
            countdown: 90,
            speech: true,
            sarcasm: 0.0,
        };
        timer.apply_settings(settings, start + millis(5_000));
        assert_eq!(timer.remaining_at(start + millis(5_000)), millis(90_000));
    }

    #[test]
    fn new_settings_leave_a_paused_countdown_alone() {
        let mut timer = timer(30, 0.0);
        let start = Instant::now();
        timer.start(start);
        timer.pause(start + millis(5_000)).unwrap();

        let settings = CountdownSettings {
            countdown: 90,
            speech: true,
            sarcasm: 0.0,
        };
        timer.apply_settings(settings, start + millis(6_000));
        assert_eq!(timer.phase(), TimerPhase::Paused);
        assert_eq!(timer.remaining_at(start + millis(6_000)), millis(25_000));
    }
}
