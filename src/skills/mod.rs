//! Skill handlers and the supervised call boundary
//!
//! The composer never calls a skill directly. It builds a [`SkillRequest`] and
//! hands it to [`SkillDispatcher::call`], which turns errors and panics into an
//! empty response.

mod builtin;
pub mod calculator;
mod system;
mod web;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

pub use builtin::LocalSkills;

use crate::Result;

/// Parameters for one skill invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillRequest {
    Wallpaper,
    PlayMusic { keyword: String },
    Brightness { utterance: String },
    Wifi { utterance: String },
    Power { utterance: String },
    NewProject { language: String, name: String },
    Time { utterance: String },
    Calculator { utterance: String },
    OpenApp { utterance: String },
    FindFile { keyword: String },
    VideoSearch { keyword: String },
    MapSearch { location: String },
    KnowledgeQuery { utterance: String },
    Encyclopedia { keyword: String },
    WebSearch { keyword: String },
}

/// Skill identity, for logging and test bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillKind {
    Wallpaper,
    Music,
    Brightness,
    Wifi,
    Power,
    Project,
    Time,
    Calculator,
    App,
    FileSearch,
    Video,
    Maps,
    Knowledge,
    Encyclopedia,
    WebSearch,
}

impl SkillKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wallpaper => "wallpaper",
            Self::Music => "music",
            Self::Brightness => "brightness",
            Self::Wifi => "wifi",
            Self::Power => "power",
            Self::Project => "project",
            Self::Time => "time",
            Self::Calculator => "calculator",
            Self::App => "app",
            Self::FileSearch => "file_search",
            Self::Video => "video",
            Self::Maps => "maps",
            Self::Knowledge => "knowledge",
            Self::Encyclopedia => "encyclopedia",
            Self::WebSearch => "web_search",
        }
    }
}

impl std::fmt::Display for SkillKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SkillRequest {
    #[must_use]
    pub const fn kind(&self) -> SkillKind {
        match self {
            Self::Wallpaper => SkillKind::Wallpaper,
            Self::PlayMusic { .. } => SkillKind::Music,
            Self::Brightness { .. } => SkillKind::Brightness,
            Self::Wifi { .. } => SkillKind::Wifi,
            Self::Power { .. } => SkillKind::Power,
            Self::NewProject { .. } => SkillKind::Project,
            Self::Time { .. } => SkillKind::Time,
            Self::Calculator { .. } => SkillKind::Calculator,
            Self::OpenApp { .. } => SkillKind::App,
            Self::FindFile { .. } => SkillKind::FileSearch,
            Self::VideoSearch { .. } => SkillKind::Video,
            Self::MapSearch { .. } => SkillKind::Maps,
            Self::KnowledgeQuery { .. } => SkillKind::Knowledge,
            Self::Encyclopedia { .. } => SkillKind::Encyclopedia,
            Self::WebSearch { .. } => SkillKind::WebSearch,
        }
    }
}

/// Set of skill handlers
///
/// An empty string means "no answer"; it is not an error.
#[async_trait]
pub trait Skills: Send + Sync {
    /// Run one skill
    ///
    /// # Errors
    ///
    /// Any failure; the dispatcher degrades it to an empty response
    async fn invoke(&self, request: &SkillRequest) -> Result<String>;
}

/// Supervised entry point into a [`Skills`] implementation
#[derive(Clone)]
pub struct SkillDispatcher {
    skills: Arc<dyn Skills>,
}

impl SkillDispatcher {
    #[must_use]
    pub fn new(skills: Arc<dyn Skills>) -> Self {
        Self { skills }
    }

    /// Invoke a skill, returning its trimmed response or an empty string on failure
    pub async fn call(&self, request: SkillRequest) -> String {
        let kind = request.kind();
        tracing::debug!(skill = %kind, "invoking skill");

        match AssertUnwindSafe(self.skills.invoke(&request)).catch_unwind().await {
            Ok(Ok(response)) => response.trim().to_string(),
            Ok(Err(e)) => {
                tracing::warn!(skill = %kind, error = %e, "skill failed");
                String::new()
            }
            Err(_) => {
                tracing::warn!(skill = %kind, "skill panicked");
                String::new()
            }
        }
    }
}

impl std::fmt::Debug for SkillDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillDispatcher").finish_non_exhaustive()
    }
}
