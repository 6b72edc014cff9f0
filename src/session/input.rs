//! Cycle input: racing speech against remote commands, and classifying it

use crate::channels::{RemoteCommand, RemoteReceiver};
use crate::commands::{Category, CommandTable};
use crate::composer::wake_question;
use crate::matcher::Matcher;
use crate::voice::Voice;
use crate::{Error, Result};

use super::state::Heard;

/// One cycle's utterance and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub text: String,
    /// Chat to mirror responses to, for remote utterances
    pub reply_to: Option<i64>,
}

impl Input {
    #[must_use]
    pub fn spoken(text: String) -> Self {
        Self {
            text,
            reply_to: None,
        }
    }

    #[must_use]
    pub fn remote(command: RemoteCommand) -> Self {
        Self {
            text: command.text,
            reply_to: Some(command.chat_id),
        }
    }
}

enum Raced {
    Spoken(Result<String>),
    Remote(Option<RemoteCommand>),
    RemoteClosed,
}

/// Wait for the next utterance
///
/// With a remote channel, whichever source produces first wins the cycle. A
/// remote command already waiting is taken without listening. A non-empty
/// spoken utterance discards a remote command that arrived while listening.
///
/// # Errors
///
/// Propagates listen errors [`Voice::listen`] does not absorb
pub async fn next_input(voice: &Voice, remote: &mut Option<RemoteReceiver>) -> Result<Input> {
    let Some(rx) = remote.as_mut() else {
        return voice.listen().await.map(Input::spoken);
    };

    if rx.has_changed().unwrap_or(false)
        && let Some(command) = rx.borrow_and_update().clone()
    {
        return Ok(Input::remote(command));
    }

    let raced = tokio::select! {
        biased;
        changed = rx.changed() => match changed {
            Ok(()) => Raced::Remote(rx.borrow_and_update().clone()),
            Err(_) => Raced::RemoteClosed,
        },
        heard = voice.listen() => Raced::Spoken(heard),
    };

    match raced {
        Raced::Spoken(heard) => {
            let text = heard?;
            if !text.is_empty() && rx.has_changed().unwrap_or(false) {
                let dropped = rx.borrow_and_update().clone();
                tracing::debug!(?dropped, "spoken input won the cycle");
            }
            Ok(Input::spoken(text))
        }
        Raced::Remote(Some(command)) => Ok(Input::remote(command)),
        Raced::Remote(None) => Ok(Input::spoken(String::new())),
        Raced::RemoteClosed => {
            tracing::warn!("remote command channel closed");
            *remote = None;
            voice.listen().await.map(Input::spoken)
        }
    }
}

/// Classify an utterance for the current state
///
/// Asleep, only terminate and wake phrases count. Awake, mute and terminate
/// phrases come first, then a bare name, then wake phrases re-enter, and
/// everything else is a command.
#[must_use]
pub fn classify(matcher: &Matcher, table: &CommandTable, text: &str, awake: bool) -> Heard {
    let text = text.trim();
    if text.is_empty() {
        return Heard::Silence;
    }

    if awake {
        if matcher.matches(text, table.phrases(Category::Mute)) {
            return Heard::Mute;
        }
        if matcher.is_name_only(text) {
            return Heard::NameOnly;
        }
    }

    if matcher.matches(text, table.phrases(Category::Terminate)) {
        Heard::Terminate
    } else if let Some(question) = wake_question(matcher, table, text) {
        Heard::WakeWithQuestion(question)
    } else if matcher.matches(text, table.phrases(Category::Wakeup)) {
        Heard::Wake
    } else {
        Heard::Command(text.to_string())
    }
}

/// Whether an error should end the session quietly
#[must_use]
pub const fn is_shutdown(error: &Error) -> bool {
    matches!(error, Error::InputClosed)
}
