//! Speech collaborator used by countdown timers to announce remaining time.

mod sse;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use self::sse::SseSpeaker;

/// Text to be spoken along with optional voice tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Utterance {
    /// Text read out loud.
    pub text: String,
    /// Voice pitch (browser default when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    /// Speaking rate (browser default when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
}

impl Utterance {
    /// Plain utterance using the default voice settings.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pitch: None,
            rate: None,
        }
    }
}

/// Failures reported by a [`Speaker`]. None of them should interrupt a countdown.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Nobody is able to synthesise speech right now.
    #[error("speech synthesis is not supported: {0}")]
    Unsupported(String),
}

/// Something able to read an utterance out loud.
pub trait Speaker: Send + Sync {
    /// Speak the utterance, resolving once it has been handed over for playback.
    fn speak(&self, utterance: Utterance) -> BoxFuture<'static, Result<(), SpeechError>>;
}
