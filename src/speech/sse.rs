use futures::{FutureExt, future::BoxFuture};

use super::{Speaker, SpeechError, Utterance};
use crate::{dto::sse::ServerEvent, state::SseHub};

const EVENT_SPEECH: &str = "speech";

/// Speaker that forwards utterances to the connected browsers of one user, which
/// perform the actual synthesis. Without an open stream of that user nothing can
/// speak, whoever else is connected.
#[derive(Clone)]
pub struct SseSpeaker {
    hub: SseHub,
    audience: String,
}

impl SseSpeaker {
    /// Build a speaker addressing the SSE subscribers of `audience`.
    pub fn new(hub: SseHub, audience: impl Into<String>) -> Self {
        Self {
            hub,
            audience: audience.into(),
        }
    }
}

impl Speaker for SseSpeaker {
    fn speak(&self, utterance: Utterance) -> BoxFuture<'static, Result<(), SpeechError>> {
        let result = if !self.hub.has_listener(&self.audience) {
            Err(SpeechError::Unsupported(format!(
                "no stream open for `{}`",
                self.audience
            )))
        } else {
            ServerEvent::json(Some(EVENT_SPEECH.to_string()), &utterance)
                .map(|event| self.hub.broadcast(event.for_audience(&self.audience)))
                .map_err(|err| SpeechError::Unsupported(err.to_string()))
        };

        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn speaking_without_listener_is_unsupported() {
        let speaker = SseSpeaker::new(SseHub::new(4), "uid-1");

        let result = speaker.speak(Utterance::new("3")).await;
        assert!(matches!(result, Err(SpeechError::Unsupported(_))));
    }

    #[tokio::test]
    async fn streams_of_other_users_do_not_count() {
        let hub = SseHub::new(4);
        let _receiver = hub.subscribe();
        let _listener = hub.register("uid-2");
        let speaker = SseSpeaker::new(hub, "uid-1");

        let result = speaker.speak(Utterance::new("3")).await;
        assert!(matches!(result, Err(SpeechError::Unsupported(_))));
    }

    #[tokio::test]
    async fn utterance_is_broadcast_to_its_audience() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();
        let _listener = hub.register("uid-1");
        let speaker = SseSpeaker::new(hub, "uid-1");

        speaker
            .speak(Utterance {
                text: "Yawn".into(),
                pitch: Some(0.5),
                rate: Some(0.4),
            })
            .await
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_SPEECH));
        assert_eq!(event.audience, vec!["uid-1".to_string()]);
        let payload: Utterance = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload.text, "Yawn");
        assert_eq!(payload.rate, Some(0.4));
    }
}
