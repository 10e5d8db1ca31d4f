use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    speech::Speaker,
    state::{countdown::CountdownTimer, settings::GameKind},
};

/// A countdown owned by one user, with the task currently ticking it.
pub struct TimerSession {
    /// Identifier of the timer.
    pub id: Uuid,
    /// User who created the timer.
    pub owner: String,
    /// Helper the timer belongs to.
    pub kind: GameKind,
    /// Countdown state.
    pub timer: CountdownTimer,
    /// Where cues are announced.
    pub speaker: Arc<dyn Speaker>,
    driver: Option<JoinHandle<()>>,
}

impl TimerSession {
    /// Wrap an idle countdown.
    pub fn new(
        owner: String,
        kind: GameKind,
        timer: CountdownTimer,
        speaker: Arc<dyn Speaker>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind,
            timer,
            speaker,
            driver: None,
        }
    }

    /// Install the task ticking the current generation, aborting any previous one.
    pub fn replace_driver(&mut self, driver: JoinHandle<()>) {
        if let Some(previous) = self.driver.replace(driver) {
            previous.abort();
        }
    }

    /// Abort the ticking task, if any.
    pub fn stop_driver(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

impl Drop for TimerSession {
    fn drop(&mut self) {
        self.stop_driver();
    }
}
