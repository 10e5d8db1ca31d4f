use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::settings::CountdownSettingsDto,
    state::{countdown::TimerPhase, settings::GameKind},
};

/// Payload used to create a countdown for a helper.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTimerRequest {
    /// Helper the timer belongs to (`timer` or `rummikub`).
    pub kind: GameKind,
}

/// Publicly visible timer phase.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleTimerPhase {
    /// Never started.
    Idle,
    /// Counting down.
    Running,
    /// Frozen with some time left.
    Paused,
}

impl From<TimerPhase> for VisibleTimerPhase {
    fn from(value: TimerPhase) -> Self {
        match value {
            TimerPhase::Idle => VisibleTimerPhase::Idle,
            TimerPhase::Running => VisibleTimerPhase::Running,
            TimerPhase::Paused => VisibleTimerPhase::Paused,
        }
    }
}

/// Full state of a timer, returned by every control.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimerSnapshot {
    pub id: Uuid,
    pub kind: GameKind,
    pub phase: VisibleTimerPhase,
    /// Remaining seconds rounded to a tenth.
    pub remaining: f64,
    /// Elapsed angle of the dial in degrees.
    pub angle: u32,
    /// SVG path of the elapsed sector.
    pub path: String,
    /// Dial fill color.
    pub color: String,
    pub settings: CountdownSettingsDto,
}
