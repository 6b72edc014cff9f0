//! Raw Telegram Bot API calls

use super::types::{
    API_BASE, GetUpdatesRequest, LONG_POLL_SECS, SendMessageRequest, TelegramResponse, Update,
};
use crate::channels::ChatUpdate;
use crate::retry::{delay_for_attempt, is_recoverable, parse_retry_after};
use crate::{Error, Result};

impl super::TelegramChannel {
    fn method_url(&self, method: &str) -> String {
        format!("{API_BASE}{}/{method}", self.token)
    }

    /// Send a plain-text message
    ///
    /// Rate limits and server errors are retried with backoff, honouring
    /// Telegram's `retry_after` hint.
    ///
    /// # Errors
    ///
    /// Returns error if the chat is unreachable or retries are exhausted
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = self.method_url("sendMessage");
        let request = SendMessageRequest {
            chat_id,
            text,
            disable_web_page_preview: Some(true),
        };

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::Channel(format!("Telegram API error: {e}")))?;

            let status = response.status();
            if status.is_success() {
                tracing::debug!(chat_id, "Telegram message sent");
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();
            let lower = body.to_lowercase();
            if lower.contains("chat not found") || lower.contains("bot was blocked by the user") {
                return Err(Error::Channel(format!(
                    "Telegram chat {chat_id} not reachable: {body}"
                )));
            }

            if attempt >= self.retry.max_retries || !is_recoverable(status.as_u16(), &body) {
                return Err(Error::Channel(format!("Telegram API error: {status} - {body}")));
            }

            let delay = delay_for_attempt(&self.retry, attempt, parse_retry_after(&body));
            tracing::warn!(
                chat_id,
                %status,
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying Telegram sendMessage"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Long-poll for new messages
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram reports `ok: false`
    pub async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<ChatUpdate>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: LONG_POLL_SECS,
            allowed_updates: ["message"],
        };

        let body = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram getUpdates error: {e}")))?
            .text()
            .await
            .map_err(|e| Error::Channel(format!("Telegram response read error: {e}")))?;

        parse_updates(&body)
    }

    /// Delete any webhook so getUpdates works
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn delete_webhook(&self) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("deleteWebhook"))
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram deleteWebhook error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Channel(format!(
                "Telegram deleteWebhook error: {status} - {body}"
            )));
        }

        tracing::debug!("Telegram webhook deleted");
        Ok(())
    }

    /// Validate the bot token
    ///
    /// # Errors
    ///
    /// Returns error if the token is rejected
    pub async fn get_me(&self) -> Result<()> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram getMe error: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Channel("Invalid Telegram bot token".to_string()));
        }

        Ok(())
    }
}

/// Convert a getUpdates body into text updates
///
/// Non-text messages and messages from bots are dropped but still count
/// towards the offset, so they are returned with empty text.
pub(crate) fn parse_updates(body: &str) -> Result<Vec<ChatUpdate>> {
    let parsed: TelegramResponse<Vec<Update>> = serde_json::from_str(body)?;
    if !parsed.ok {
        return Err(Error::Channel(format!(
            "Telegram getUpdates rejected: {}",
            parsed.description.unwrap_or_default()
        )));
    }

    Ok(parsed
        .result
        .unwrap_or_default()
        .into_iter()
        .map(|update| {
            let (chat_id, text) = update
                .message
                .filter(|m| !m.from.as_ref().is_some_and(|u| u.is_bot))
                .map(|m| (m.chat.id, m.text.unwrap_or_default()))
                .unwrap_or_default();
            ChatUpdate {
                update_id: update.update_id,
                chat_id,
                text,
            }
        })
        .collect())
}
