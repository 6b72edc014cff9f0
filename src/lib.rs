//! Hark - Voice-driven command dispatcher for a desktop assistant
//!
//! This library provides the pieces of a listen-classify-respond loop:
//! - A reloadable phrase table mapping utterances to command categories
//! - A priority-ordered response composer with exclusivity gates
//! - A sleep/wake session state machine with a bounded supervisor
//! - Pluggable speech, skill and chat-transport boundaries
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      Inputs                          │
//! │     Speech (listen)     │     Telegram (poller)      │
//! └────────────────────┬────────────────────────────────┘
//!                      │  whichever arrives first
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Session Runtime                      │
//! │   State machine  │  Classifier  │  Command table    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Composer                          │
//! │   Gates  │  Skills (supervised)  │  Voice + mirror  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod announce;
pub mod channels;
pub mod commands;
pub mod composer;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod matcher;
pub mod retry;
pub mod session;
pub mod skills;
pub mod voice;

pub use channels::{ChatTransport, ChatUpdate, RemoteCommand, TelegramChannel};
pub use commands::{Category, CommandStore, CommandTable};
pub use composer::{Composer, Directive};
pub use config::Config;
pub use error::{Error, Result};
pub use matcher::Matcher;
pub use retry::RetryPolicy;
pub use session::{Runtime, Session, SessionState};
pub use skills::{LocalSkills, SkillDispatcher, SkillKind, SkillRequest, Skills};
pub use voice::{ConsoleSpeech, Prompt, Speech, Voice};
