//! Telegram Bot API request/response types

use serde::{Deserialize, Serialize};

/// Telegram Bot API base URL
pub(crate) const API_BASE: &str = "https://api.telegram.org/bot";

/// Long-poll timeout passed to getUpdates, in seconds
pub(crate) const LONG_POLL_SECS: u64 = 30;

/// Telegram sendMessage request (plain text)
#[derive(Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
}

/// Telegram getUpdates request
#[derive(Serialize)]
pub(crate) struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: [&'static str; 1],
}

/// Telegram API response wrapper
#[derive(Debug, Deserialize)]
pub(crate) struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// A single update from getUpdates
#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// Message carried by an update
#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

/// Chat info
#[derive(Debug, Deserialize)]
pub(crate) struct Chat {
    pub id: i64,
}

/// Sender info
#[derive(Debug, Deserialize)]
pub(crate) struct User {
    pub is_bot: bool,
}
