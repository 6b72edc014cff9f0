//! Chat transport bridge
//!
//! A chat transport lets remote text stand in for spoken input. Updates are
//! polled in the background and the latest one is published into a
//! single-slot watch channel the session races against the microphone.

mod dedup;
mod poller;
mod telegram;

use async_trait::async_trait;

pub use dedup::UpdateDedup;
pub use poller::{RemoteReceiver, RemoteSender, remote_channel, spawn_poller};
pub use telegram::TelegramChannel;

use crate::Result;

/// One text update received from a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUpdate {
    /// Transport-assigned, monotonically increasing id
    pub update_id: i64,

    /// Chat the text came from
    pub chat_id: i64,

    /// Message text
    pub text: String,
}

/// A remote utterance waiting to be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    /// Chat to mirror responses to
    pub chat_id: i64,

    /// Utterance text
    pub text: String,
}

/// Minimal chat transport used by the bridge
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &'static str;

    /// Fetch updates with id `>= offset`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<ChatUpdate>>;

    /// Send plain text to a chat
    ///
    /// # Errors
    ///
    /// Returns error if the message could not be delivered
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}
