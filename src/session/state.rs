//! Session state machine
//!
//! Pure bookkeeping: the runtime classifies what was heard, feeds it in, and
//! performs the [`Action`] that comes back.

use crate::composer::Directive;
use crate::voice::Prompt;

/// Where the session is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Muted; only wake and terminate phrases are acted on
    Sleeping,
    /// Wake phrase heard, waiting for the command
    WakePending,
    /// Awake; `idle_cycles` counts listens since the last command
    Listening { idle_cycles: u32 },
    /// Shut down
    Terminated,
}

/// Classified input for one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heard {
    Silence,
    Mute,
    Terminate,
    Wake,
    /// Wake phrase followed by a question; carries the question
    WakeWithQuestion(String),
    /// The assistant's name and nothing else
    NameOnly,
    Command(String),
}

/// Side effect the runtime should perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    /// Sleeping cycle; `announce` on the first one after falling asleep
    Doze { announce: bool },
    /// Wake greeting with the start cue
    Greet,
    /// Play `prompt`, then run `text` through the composer
    Dispatch { text: String, prompt: Prompt },
    /// Mute cue, go quiet
    Mute,
    /// Farewell, then stop
    Terminate,
    /// End cue and a wake greeting
    AcknowledgeName,
}

/// Session state plus its counters
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    listen_timeout: u32,
    sleep_cycles: u32,
    mute_after_speaking: bool,
    deferred_wake: bool,
}

impl Session {
    /// New session, asleep
    #[must_use]
    pub const fn new(listen_timeout: u32) -> Self {
        Self {
            state: SessionState::Sleeping,
            listen_timeout,
            sleep_cycles: 0,
            mute_after_speaking: false,
            deferred_wake: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated)
    }

    /// Whether wake phrases should be treated as ordinary commands
    #[must_use]
    pub const fn is_awake(&self) -> bool {
        matches!(
            self.state,
            SessionState::WakePending | SessionState::Listening { .. }
        )
    }

    /// Whether the next cycle will force a mute
    #[must_use]
    pub const fn mute_after_speaking(&self) -> bool {
        self.mute_after_speaking
    }

    /// Whether the current dispatch came from a wake phrase with a question
    #[must_use]
    pub const fn deferred_wake(&self) -> bool {
        self.deferred_wake
    }

    /// Housekeeping before listening
    ///
    /// A pending mute-after-speaking wins; otherwise an idle session that hit
    /// the listen timeout falls asleep.
    pub fn tick(&mut self) -> Option<Action> {
        if self.mute_after_speaking {
            self.mute_after_speaking = false;
            self.fall_asleep(true);
            return Some(Action::Mute);
        }
        if let SessionState::Listening { idle_cycles } = self.state
            && idle_cycles >= self.listen_timeout
        {
            tracing::debug!(idle_cycles, "listen timeout reached");
            self.fall_asleep(false);
        }
        None
    }

    /// Advance on one classified input
    pub fn on_heard(&mut self, heard: Heard) -> Action {
        match self.state {
            SessionState::Terminated => Action::None,
            SessionState::Sleeping => self.asleep(heard),
            SessionState::WakePending | SessionState::Listening { .. } => self.awake(heard),
        }
    }

    /// Record how a dispatch ended
    pub fn on_dispatched(&mut self, directive: Directive) {
        self.deferred_wake = false;
        match directive {
            Directive::Terminate => {
                self.state = SessionState::Terminated;
                return;
            }
            Directive::MuteAfterSpeaking => self.mute_after_speaking = true,
            Directive::Continue => {}
        }
        if self.state == SessionState::WakePending {
            self.state = SessionState::Listening { idle_cycles: 1 };
        }
    }

    fn fall_asleep(&mut self, muted: bool) {
        self.state = SessionState::Sleeping;
        // an explicit mute already played its cue
        self.sleep_cycles = u32::from(muted);
    }

    fn asleep(&mut self, heard: Heard) -> Action {
        match heard {
            Heard::Terminate => {
                self.state = SessionState::Terminated;
                Action::Terminate
            }
            Heard::WakeWithQuestion(question) => {
                self.state = SessionState::WakePending;
                self.sleep_cycles = 0;
                self.deferred_wake = true;
                Action::Dispatch {
                    text: question,
                    prompt: Prompt::Start,
                }
            }
            Heard::Wake => {
                self.state = SessionState::WakePending;
                self.sleep_cycles = 0;
                Action::Greet
            }
            Heard::Silence | Heard::Mute | Heard::NameOnly | Heard::Command(_) => {
                self.sleep_cycles = self.sleep_cycles.saturating_add(1);
                Action::Doze {
                    announce: self.sleep_cycles == 1,
                }
            }
        }
    }

    fn awake(&mut self, heard: Heard) -> Action {
        match heard {
            Heard::Silence => {
                self.state = match self.state {
                    SessionState::Listening { idle_cycles } => SessionState::Listening {
                        idle_cycles: idle_cycles.saturating_add(1),
                    },
                    _ => SessionState::Listening { idle_cycles: 1 },
                };
                Action::None
            }
            Heard::Mute => {
                self.fall_asleep(true);
                Action::Mute
            }
            Heard::Terminate => {
                self.state = SessionState::Terminated;
                Action::Terminate
            }
            Heard::NameOnly => {
                self.state = SessionState::Listening { idle_cycles: 1 };
                Action::AcknowledgeName
            }
            Heard::Command(text) => {
                self.state = SessionState::Listening { idle_cycles: 1 };
                Action::Dispatch {
                    text,
                    prompt: Prompt::End,
                }
            }
            // re-entry: the start cue replaces the end cue
            Heard::WakeWithQuestion(text) => {
                self.state = SessionState::Listening { idle_cycles: 1 };
                Action::Dispatch {
                    text,
                    prompt: Prompt::Start,
                }
            }
            Heard::Wake => {
                self.state = SessionState::Listening { idle_cycles: 1 };
                Action::Greet
            }
        }
    }
}
