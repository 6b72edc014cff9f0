//! Speech boundary
//!
//! The session only ever talks to a [`Speech`] implementation through
//! [`Voice`], which adds retry on synthesis outages, logging of spoken lines and
//! mirroring of responses back to a chat when the utterance came from one.

mod console;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

pub use console::ConsoleSpeech;

use crate::channels::ChatTransport;
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::{Error, Result};

/// Notice spoken once when recognition is unreachable
const SERVICE_UNAVAILABLE_NOTICE: &str = "Sorry, the speech service is not available right now.";

/// Audio cue played around speech
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Assistant started listening
    Start,
    /// Assistant finished listening
    End,
    /// Assistant is going to sleep
    Mute,
}

impl Prompt {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Mute => "mute",
        }
    }
}

/// Speech capture and playback
#[async_trait]
pub trait Speech: Send + Sync {
    /// Wait (bounded) for one utterance
    ///
    /// Returns an empty string when nothing was heard in the window.
    ///
    /// # Errors
    ///
    /// `Recognition` when speech was heard but not understood,
    /// `ServiceUnavailable` when the backend is unreachable, `InputClosed` when
    /// no more input will ever arrive
    async fn listen(&self) -> Result<String>;

    /// Play the optional cue, then speak `text` (may be empty)
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` when synthesis is unreachable
    async fn speak(&self, text: &str, prompt: Option<Prompt>) -> Result<()>;
}

/// Chat a response should be mirrored to
#[derive(Clone)]
struct Mirror {
    transport: Arc<dyn ChatTransport>,
    chat_id: i64,
}

/// Session-facing wrapper around a [`Speech`] backend
pub struct Voice {
    speech: Arc<dyn Speech>,
    speaker: String,
    retry: RetryPolicy,
    transport: Option<Arc<dyn ChatTransport>>,
    mirror: Option<Mirror>,
    notified_unavailable: AtomicBool,
}

impl Voice {
    #[must_use]
    pub fn new(speech: Arc<dyn Speech>, speaker: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            speech,
            speaker: speaker.into(),
            retry,
            transport: None,
            mirror: None,
            notified_unavailable: AtomicBool::new(false),
        }
    }

    /// Attach the chat transport used for mirroring
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Mirror spoken lines to `chat_id` until cleared
    pub fn reply_to(&mut self, chat_id: Option<i64>) {
        self.mirror = chat_id.and_then(|chat_id| {
            self.transport.clone().map(|transport| Mirror { transport, chat_id })
        });
    }

    /// Speak a line, degrading failures to silence
    pub async fn speak(&self, text: &str, prompt: Option<Prompt>) {
        if !text.is_empty() {
            tracing::info!(speaker = %self.speaker, "{text}");
        }

        let result = retry_with_backoff(&self.retry, "speak", Error::is_service_unavailable, || {
            self.speech.speak(text, prompt)
        })
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "speech synthesis failed");
        }

        if let Some(mirror) = &self.mirror
            && !text.is_empty()
            && let Err(e) = mirror.transport.send_message(mirror.chat_id, text).await
        {
            tracing::warn!(
                channel = mirror.transport.name(),
                chat_id = mirror.chat_id,
                error = %e,
                "failed to mirror response"
            );
        }
    }

    /// Play only a cue
    pub async fn cue(&self, prompt: Prompt) {
        self.speak("", Some(prompt)).await;
    }

    /// Listen for one utterance
    ///
    /// Recognition failures and service outages become an empty utterance.
    ///
    /// # Errors
    ///
    /// `InputClosed` and anything unexpected propagate to the supervisor
    pub async fn listen(&self) -> Result<String> {
        match self.speech.listen().await {
            Ok(text) => {
                self.notified_unavailable.store(false, Ordering::Relaxed);
                Ok(text)
            }
            Err(Error::Recognition(reason)) => {
                tracing::warn!(%reason, "could not understand audio");
                Ok(String::new())
            }
            Err(Error::ServiceUnavailable(reason)) => {
                tracing::warn!(%reason, "speech recognition unavailable");
                if !self.notified_unavailable.swap(true, Ordering::Relaxed) {
                    self.speak(SERVICE_UNAVAILABLE_NOTICE, None).await;
                }
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }
}
