//! Session runtime
//!
//! Owns the main loop: one cycle drains queued announcements, runs the state
//! machine's housekeeping, waits for an utterance, classifies it and performs
//! the resulting action. A bounded supervisor restarts the loop when an
//! unexpected error escapes a cycle.

mod input;
mod state;

use tokio::sync::mpsc;

pub use input::{Input, classify, next_input};
pub use state::{Action, Heard, Session, SessionState};

use crate::channels::RemoteReceiver;
use crate::commands::{Category, CommandStore, CommandTable};
use crate::composer::Composer;
use crate::config::SessionConfig;
use crate::voice::{Prompt, Voice};
use crate::Result;

/// Main loop and everything it drives
pub struct Runtime {
    config: SessionConfig,
    store: CommandStore,
    composer: Composer,
    voice: Voice,
    remote: Option<RemoteReceiver>,
    announcements: Option<mpsc::Receiver<String>>,
    assistant_name: String,
}

impl Runtime {
    #[must_use]
    pub fn new(
        config: SessionConfig,
        store: CommandStore,
        composer: Composer,
        voice: Voice,
        assistant_name: impl Into<String>,
    ) -> Self {
        Self {
            config,
            store,
            composer,
            voice,
            remote: None,
            announcements: None,
            assistant_name: assistant_name.into(),
        }
    }

    /// Accept remote commands from a chat bridge
    #[must_use]
    pub fn with_remote(mut self, remote: RemoteReceiver) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Speak lines queued by the announcer at the start of each cycle
    #[must_use]
    pub fn with_announcements(mut self, announcements: mpsc::Receiver<String>) -> Self {
        self.announcements = Some(announcements);
        self
    }

    /// Run sessions until deactivation, end of input, or too many failures
    ///
    /// # Errors
    ///
    /// Returns the last error once `max_restarts` consecutive sessions failed
    pub async fn run(&mut self) -> Result<()> {
        let mut failures = 0u32;
        loop {
            let mut progressed = false;
            match self.run_session(&mut progressed).await {
                Ok(()) => return Ok(()),
                Err(e) if input::is_shutdown(&e) => {
                    tracing::info!("input closed, shutting down");
                    return Ok(());
                }
                Err(e) => {
                    if progressed {
                        failures = 0;
                    }
                    failures += 1;
                    tracing::error!(error = %e, failures, "session loop failed");
                    if failures > self.config.max_restarts {
                        return Err(e);
                    }
                    tracing::info!(
                        delay_secs = self.config.restart_delay.as_secs(),
                        "trying to recover from internal error"
                    );
                    tokio::time::sleep(self.config.restart_delay).await;
                }
            }
        }
    }

    async fn run_session(&mut self, progressed: &mut bool) -> Result<()> {
        tracing::info!(assistant = %self.assistant_name, "assistant is active");
        let table = self.store.snapshot();
        match table.random(Category::StartGreeting) {
            Some(line) => self.voice.speak(line, Some(Prompt::Start)).await,
            None => self.voice.cue(Prompt::Start).await,
        }

        let mut session = Session::new(self.config.listen_timeout);
        while !session.is_terminated() {
            self.run_cycle(&mut session).await?;
            *progressed = true;
        }
        Ok(())
    }

    /// Run one listen-and-respond cycle
    ///
    /// # Errors
    ///
    /// Returns error if listening fails in a way the voice layer does not absorb
    pub async fn run_cycle(&mut self, session: &mut Session) -> Result<()> {
        self.speak_announcements().await;

        let table = self.store.snapshot();
        if let Some(action) = session.tick() {
            self.perform(action, &table, session).await;
        }

        if matches!(session.state(), SessionState::Listening { idle_cycles: 1 }) {
            tracing::debug!(assistant = %self.assistant_name, "listening...");
        }

        let input = next_input(&self.voice, &mut self.remote).await?;
        if let Some(chat_id) = input.reply_to {
            tracing::debug!(chat_id, "utterance from chat");
        }
        self.voice.reply_to(input.reply_to);

        let heard = classify(self.composer.matcher(), &table, &input.text, session.is_awake());
        let action = session.on_heard(heard);
        self.perform(action, &table, session).await;

        self.voice.reply_to(None);
        Ok(())
    }

    async fn speak_announcements(&mut self) {
        let Some(rx) = self.announcements.as_mut() else {
            return;
        };
        while let Ok(line) = rx.try_recv() {
            self.voice.speak(&line, None).await;
        }
    }

    async fn perform(&self, action: Action, table: &CommandTable, session: &mut Session) {
        match action {
            Action::None => {}
            Action::Doze { announce } => {
                if announce {
                    self.voice.cue(Prompt::Mute).await;
                    tracing::info!(assistant = %self.assistant_name, "ZzzzZz");
                }
                self.store.request_reload();
            }
            Action::Greet => self.greet(table, Some(Prompt::Start)).await,
            Action::Dispatch { text, prompt } => {
                self.voice.cue(prompt).await;
                let directive = self.composer.compose(table, &self.voice, &text).await;
                session.on_dispatched(directive);
            }
            Action::Mute => {
                tracing::info!(assistant = %self.assistant_name, "(muted)");
                self.voice.cue(Prompt::Mute).await;
            }
            Action::Terminate => self.composer.deactivate(table, &self.voice).await,
            Action::AcknowledgeName => {
                self.voice.cue(Prompt::End).await;
                self.greet(table, None).await;
            }
        }
    }

    async fn greet(&self, table: &CommandTable, prompt: Option<Prompt>) {
        match table.random(Category::WakeupResponses) {
            Some(line) => self.voice.speak(line, prompt).await,
            None => tracing::warn!("no wake greetings configured"),
        }
    }
}
