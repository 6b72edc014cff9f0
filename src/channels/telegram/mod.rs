//! Telegram bridge
//!
//! Long-polls the Bot API for text messages and sends plain-text replies.

mod api;
mod types;

use async_trait::async_trait;
use reqwest::Client;

use super::{ChatTransport, ChatUpdate};
use crate::Result;
use crate::retry::RetryPolicy;

/// Telegram Bot API transport
#[derive(Clone)]
pub struct TelegramChannel {
    token: String,
    client: Client,
    retry: RetryPolicy,
}

impl TelegramChannel {
    /// Create a transport for the given bot token
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Check the token and switch the bot to polling mode
    ///
    /// # Errors
    ///
    /// Returns error if the token is invalid or the webhook cannot be removed
    pub async fn connect(&self) -> Result<()> {
        self.get_me().await?;
        self.delete_webhook().await?;
        tracing::info!("Telegram channel connected");
        Ok(())
    }
}

impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramChannel").finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatTransport for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<ChatUpdate>> {
        self.fetch_updates(offset).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_text(chat_id, text).await
    }
}
