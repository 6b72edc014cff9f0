//! Command table: category name → trigger phrases
//!
//! Built once per load from a `commands_db.json` document. Placeholders are
//! substituted here so lookups never rescan or rewrite phrases.

mod reload;

pub use reload::{CommandStore, spawn_reloader};

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// Placeholder replaced by the assistant's name
pub const ASSISTANT_PLACEHOLDER: &str = "<assistant_name>";

/// Placeholder replaced by the user's name
pub const MASTER_PLACEHOLDER: &str = "<boss_name>";

/// Default table compiled into the binary
const EMBEDDED_COMMANDS: &str = include_str!("../../assets/commands_db.json");

/// Known command categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Wakeup,
    WakeupResponses,
    StartGreeting,
    Mute,
    Terminate,
    TerminateResponse,
    UnknownResponses,
    Greeting,
    GreetingResponses,
    AskAssistantName,
    AskAssistantNameResponse,
    Wallpaper,
    PlayMusic,
    Brightness,
    Wifi,
    SystemShutdownRestart,
    CreateProject,
    Time,
    MathCalculation,
    OpenApps,
    FindFile,
    Youtube,
    GoogleMaps,
    Wikipedia,
    Google,
    Confirmation,
    ConfirmationResponses,
}

impl Category {
    /// Every category, in document order
    pub const ALL: [Self; 27] = [
        Self::Wakeup,
        Self::WakeupResponses,
        Self::StartGreeting,
        Self::Mute,
        Self::Terminate,
        Self::TerminateResponse,
        Self::UnknownResponses,
        Self::Greeting,
        Self::GreetingResponses,
        Self::AskAssistantName,
        Self::AskAssistantNameResponse,
        Self::Wallpaper,
        Self::PlayMusic,
        Self::Brightness,
        Self::Wifi,
        Self::SystemShutdownRestart,
        Self::CreateProject,
        Self::Time,
        Self::MathCalculation,
        Self::OpenApps,
        Self::FindFile,
        Self::Youtube,
        Self::GoogleMaps,
        Self::Wikipedia,
        Self::Google,
        Self::Confirmation,
        Self::ConfirmationResponses,
    ];

    /// Name used in the command document
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wakeup => "wakeup",
            Self::WakeupResponses => "wakeup_responses",
            Self::StartGreeting => "start_greeting",
            Self::Mute => "mute",
            Self::Terminate => "terminate",
            Self::TerminateResponse => "terminate_response",
            Self::UnknownResponses => "unknown_responses",
            Self::Greeting => "greeting",
            Self::GreetingResponses => "greeting_responses",
            Self::AskAssistantName => "ask_assistant_name",
            Self::AskAssistantNameResponse => "ask_assistant_name_response",
            Self::Wallpaper => "wallpaper",
            Self::PlayMusic => "play_music",
            Self::Brightness => "brightness",
            Self::Wifi => "wifi",
            Self::SystemShutdownRestart => "system_shutdown_restart",
            Self::CreateProject => "create_project",
            Self::Time => "time",
            Self::MathCalculation => "math_calculation",
            Self::OpenApps => "open_apps",
            Self::FindFile => "find_file",
            Self::Youtube => "youtube",
            Self::GoogleMaps => "google_maps",
            Self::Wikipedia => "wikipedia",
            Self::Google => "google",
            Self::Confirmation => "confirmation",
            Self::ConfirmationResponses => "confirmation_responses",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the command document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandEntry {
    /// Category name
    pub name: String,

    /// Trigger phrases (or response lines for `*_responses` categories)
    #[serde(rename = "commands")]
    pub phrases: Vec<String>,
}

/// Raw command document
#[derive(Debug, Deserialize)]
struct CommandDocument {
    command_db: Vec<CommandEntry>,
}

/// Immutable mapping from category name to phrases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTable {
    phrases: HashMap<String, Vec<String>>,
}

impl CommandTable {
    /// Build a table from entries, substituting name placeholders
    ///
    /// Later entries with a duplicate name replace earlier ones.
    #[must_use]
    pub fn from_entries(entries: Vec<CommandEntry>, assistant_name: &str, master_name: &str) -> Self {
        let mut phrases = HashMap::with_capacity(entries.len());
        for entry in entries {
            let substituted = entry
                .phrases
                .into_iter()
                .map(|p| {
                    p.replace(ASSISTANT_PLACEHOLDER, assistant_name)
                        .replace(MASTER_PLACEHOLDER, master_name)
                })
                .collect();
            if phrases.insert(entry.name.clone(), substituted).is_some() {
                tracing::warn!(name = %entry.name, "duplicate command category, keeping the last");
            }
        }
        Self { phrases }
    }

    /// Parse a `{"command_db": [...]}` document
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid JSON of the expected shape
    pub fn parse(json: &str, assistant_name: &str, master_name: &str) -> Result<Self> {
        let doc: CommandDocument = serde_json::from_str(json)
            .map_err(|e| Error::CommandTable(format!("invalid command document: {e}")))?;
        Ok(Self::from_entries(doc.command_db, assistant_name, master_name))
    }

    /// Load a table from a file
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &Path, assistant_name: &str, master_name: &str) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::parse(&content, assistant_name, master_name).map(Some)
    }

    /// The table compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns error if the embedded document is malformed
    pub fn embedded(assistant_name: &str, master_name: &str) -> Result<Self> {
        Self::parse(EMBEDDED_COMMANDS, assistant_name, master_name)
    }

    /// Load from `path`, falling back to the embedded table when the file is absent
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but is malformed
    pub fn load_or_embedded(path: &Path, assistant_name: &str, master_name: &str) -> Result<Self> {
        if let Some(table) = Self::load(path, assistant_name, master_name)? {
            tracing::info!(path = %path.display(), categories = table.len(), "loaded command table");
            return Ok(table);
        }
        tracing::info!(path = %path.display(), "command file not found, using embedded table");
        Self::embedded(assistant_name, master_name)
    }

    /// Phrases for a category (empty if the category is absent)
    #[must_use]
    pub fn phrases(&self, category: Category) -> &[String] {
        self.phrases_by_name(category.as_str())
    }

    /// Phrases for a category looked up by document name
    #[must_use]
    pub fn phrases_by_name(&self, name: &str) -> &[String] {
        self.phrases.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Pick a random line from a category
    #[must_use]
    pub fn random(&self, category: Category) -> Option<&str> {
        use rand::seq::SliceRandom;
        self.phrases(category)
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    /// Category names and phrase counts, sorted by name
    #[must_use]
    pub fn summary(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<_> = self
            .phrases
            .iter()
            .map(|(name, phrases)| (name.as_str(), phrases.len()))
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// Whether the table has no categories
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}
