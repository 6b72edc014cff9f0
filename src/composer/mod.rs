//! Response composer
//!
//! Runs one utterance through the categories in a fixed priority order.
//! Terminal categories speak and return at once; the rest accumulate into a
//! [`DispatchContext`] whose gates keep noisier fallbacks from answering after
//! an authoritative source already has.

mod context;

pub use context::{ALL_GATES, DispatchContext, DispatchOutcome, EXCLUSIVE_GATES, Gate};

use crate::commands::{Category, CommandTable};
use crate::matcher::{Matcher, contains_any_word, word_count};
use crate::skills::{SkillDispatcher, SkillRequest};
use crate::voice::{Prompt, Voice};

/// Language used when a project request names none
pub const DEFAULT_PROJECT_LANGUAGE: &str = "python";

/// Folder name for scaffolded projects
pub const DEFAULT_PROJECT_NAME: &str = "NewProjectFolder";

/// Marker a skill puts in its reply when it has taken over the machine
const TAKEOVER_MARKER: &str = "Ok!";

/// Minimum keyword words that must appear in an encyclopedia passage
const RELEVANCE_MIN_HITS: usize = 4;

/// Gates closed by a successful knowledge engine answer
const ENGINE_SUPPRESSES: &[Gate] = &[Gate::Encyclopedia, Gate::WebSearch, Gate::NotConfirmation];

/// Gates closed by a relevant encyclopedia answer
const ENCYCLOPEDIA_SUPPRESSES: &[Gate] = &[Gate::WebSearch, Gate::NotConfirmation];

/// What the session should do after a composed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Keep listening
    Continue,
    /// Go to sleep at the start of the next cycle
    MuteAfterSpeaking,
    /// Shut the assistant down
    Terminate,
}

/// Question asked in the same breath as a wake phrase
///
/// "hey jarvis what time is it" yields `Some("what time is it")`; a bare wake
/// phrase yields `None`.
#[must_use]
pub fn wake_question(matcher: &Matcher, table: &CommandTable, utterance: &str) -> Option<String> {
    let wakeup = table.phrases(Category::Wakeup);
    if word_count(utterance) <= 2 || !matcher.matches(utterance, wakeup) {
        return None;
    }
    let question = matcher.extract_metadata(utterance, wakeup);
    (!question.is_empty()).then_some(question)
}

/// Whether an encyclopedia passage is about a keyword
///
/// Keywords of up to two words are always accepted. Longer keywords need at
/// least four of their words to occur in the passage.
#[must_use]
pub fn is_relevant(keyword: &str, passage: &str) -> bool {
    let words: Vec<String> = keyword.split_whitespace().map(str::to_lowercase).collect();
    if words.len() <= 2 {
        return true;
    }
    let passage = passage.to_lowercase();
    words.iter().filter(|w| passage.contains(w.as_str())).count() >= RELEVANCE_MIN_HITS
}

/// Split a project request into language and folder name
///
/// A trailing "in <language>" clause picks the language.
#[must_use]
pub fn parse_project(metadata: &str) -> (String, String) {
    let words: Vec<&str> = metadata.split_whitespace().collect();
    let language = words
        .iter()
        .rposition(|w| *w == "in")
        .filter(|&i| words.len() > 1 && i + 1 < words.len())
        .map_or_else(|| DEFAULT_PROJECT_LANGUAGE.to_string(), |i| words[i + 1..].join(" "));
    (language, DEFAULT_PROJECT_NAME.to_string())
}

/// Turns utterances into spoken responses
#[derive(Debug, Clone)]
pub struct Composer {
    matcher: Matcher,
    skills: SkillDispatcher,
}

impl Composer {
    #[must_use]
    pub fn new(assistant_name: &str, skills: SkillDispatcher) -> Self {
        Self {
            matcher: Matcher::new(assistant_name),
            skills,
        }
    }

    #[must_use]
    pub const fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Respond to one utterance
    pub async fn compose(&self, table: &CommandTable, voice: &Voice, utterance: &str) -> Directive {
        // a wake phrase with a question attached is handled once, never re-entered
        let text = match wake_question(&self.matcher, table, utterance) {
            Some(question) => {
                tracing::debug!(%question, "wake phrase with question");
                voice.cue(Prompt::Start).await;
                question
            }
            None => utterance.to_string(),
        };
        self.respond(table, voice, &text).await
    }

    /// Speak the farewell and the mute cue
    pub async fn deactivate(&self, table: &CommandTable, voice: &Voice) {
        speak_random(voice, table, Category::TerminateResponse).await;
        voice.cue(Prompt::Mute).await;
        tracing::info!("assistant deactivated");
    }

    fn keyword(&self, table: &CommandTable, text: &str, category: Category) -> Option<String> {
        let phrases = table.phrases(category);
        self.matcher
            .matches(text, phrases)
            .then(|| self.matcher.extract_metadata(text, phrases))
    }

    fn matches(&self, table: &CommandTable, text: &str, category: Category) -> bool {
        self.matcher.matches(text, table.phrases(category))
    }

    #[allow(clippy::too_many_lines)]
    async fn respond(&self, table: &CommandTable, voice: &Voice, text: &str) -> Directive {
        if self.matches(table, text, Category::Terminate) {
            self.deactivate(table, voice).await;
            return Directive::Terminate;
        }

        if self
            .keyword(table, text, Category::Greeting)
            .is_some_and(|rest| rest.is_empty())
        {
            speak_random(voice, table, Category::GreetingResponses).await;
            return Directive::Continue;
        }

        if self.matches(table, text, Category::AskAssistantName) {
            speak_random(voice, table, Category::AskAssistantNameResponse).await;
            return Directive::Continue;
        }

        if self.matches(table, text, Category::Wallpaper) {
            let response = self.skills.call(SkillRequest::Wallpaper).await;
            if !response.is_empty() {
                voice.speak(&response, None).await;
                return Directive::Continue;
            }
        }

        let text = self.matcher.clean(text);
        if text.is_empty() {
            voice.cue(Prompt::End).await;
            speak_random(voice, table, Category::WakeupResponses).await;
            return Directive::Continue;
        }
        let text = text.as_str();

        let mut ctx = DispatchContext::new();
        let mut directive = Directive::Continue;

        if let Some(keyword) = self.keyword(table, text, Category::PlayMusic) {
            let response = self.skills.call(SkillRequest::PlayMusic { keyword }).await;
            if response.contains(TAKEOVER_MARKER) {
                directive = Directive::MuteAfterSpeaking;
            }
            ctx = ctx.apply(DispatchOutcome::from_response(response, ALL_GATES));
        }

        let system_control = [Category::Brightness, Category::Wifi, Category::SystemShutdownRestart]
            .into_iter()
            .any(|c| self.matches(table, text, c));
        if system_control {
            if text.contains("brightness") {
                let response = self
                    .skills
                    .call(SkillRequest::Brightness { utterance: text.to_string() })
                    .await;
                ctx = ctx.apply(DispatchOutcome::from_response(response, &[Gate::Calculator]));
            } else if text.contains("wi-fi") {
                let response = self
                    .skills
                    .call(SkillRequest::Wifi { utterance: text.to_string() })
                    .await;
                ctx = ctx.apply(DispatchOutcome::from_response(response, &[Gate::Calculator]));
            } else if ["shutdown", "restart", "reboot"].iter().any(|w| text.contains(w)) {
                let response = self
                    .skills
                    .call(SkillRequest::Power { utterance: text.to_string() })
                    .await;
                if !response.is_empty() {
                    voice.speak(&response, None).await;
                    if response.contains(TAKEOVER_MARKER) {
                        self.deactivate(table, voice).await;
                        return Directive::Terminate;
                    }
                }
                return Directive::Continue;
            }
        }

        if let Some(metadata) = self.keyword(table, text, Category::CreateProject)
            && !metadata.is_empty()
        {
            let (language, name) = parse_project(&metadata);
            voice.speak("Ok! Just a moment.", None).await;
            let response = self
                .skills
                .call(SkillRequest::NewProject {
                    language: language.clone(),
                    name,
                })
                .await;
            voice.speak(&format!("Initiating new {language} project."), None).await;
            if !response.is_empty() {
                voice.speak(&response, None).await;
            }
            return Directive::Continue;
        }

        if self.matches(table, text, Category::Time) {
            let response = self
                .skills
                .call(SkillRequest::Time { utterance: text.to_string() })
                .await;
            ctx = ctx.apply(DispatchOutcome::from_response(response, ALL_GATES));
        }

        if ctx.use_calculator && self.matches(table, text, Category::MathCalculation) {
            let response = self
                .skills
                .call(SkillRequest::Calculator { utterance: text.to_string() })
                .await;
            ctx = ctx.apply(DispatchOutcome::from_response(response, ALL_GATES));
        }

        if self.matches(table, text, Category::OpenApps) {
            let response = self
                .skills
                .call(SkillRequest::OpenApp { utterance: text.to_string() })
                .await;
            ctx = ctx.apply(DispatchOutcome::from_response(response, ALL_GATES));
        }

        if let Some(keyword) = self.keyword(table, text, Category::FindFile) {
            let response = self.skills.call(SkillRequest::FindFile { keyword }).await;
            ctx = ctx.apply(DispatchOutcome::from_response(response, ALL_GATES));
        }

        if let Some(keyword) = self.keyword(table, text, Category::Youtube) {
            let response = self.skills.call(SkillRequest::VideoSearch { keyword }).await;
            ctx = ctx.apply(DispatchOutcome::from_response(response, EXCLUSIVE_GATES));
        }

        if ctx.ask_web_search
            && let Some(location) = self.keyword(table, text, Category::GoogleMaps)
            && !location.is_empty()
        {
            let response = self.skills.call(SkillRequest::MapSearch { location }).await;
            ctx = ctx.apply(DispatchOutcome::from_response(response, EXCLUSIVE_GATES));
        }

        let confirmations = table.phrases(Category::Confirmation);

        if ctx.ask_engine && !contains_any_word(text, confirmations) {
            let response = self
                .skills
                .call(SkillRequest::KnowledgeQuery { utterance: text.to_string() })
                .await;
            ctx = ctx.apply(DispatchOutcome::from_response(response, ENGINE_SUPPRESSES));
        }

        if ctx.ask_encyclopedia
            && !text.contains("weather")
            && let Some(keyword) = self.keyword(table, text, Category::Wikipedia)
        {
            let passage = self
                .skills
                .call(SkillRequest::Encyclopedia { keyword: keyword.clone() })
                .await;
            let passage = if is_relevant(&keyword, &passage) {
                passage
            } else {
                tracing::debug!(%keyword, "discarding irrelevant encyclopedia passage");
                String::new()
            };
            ctx = ctx.apply(DispatchOutcome::from_response(passage, ENCYCLOPEDIA_SUPPRESSES));
        }

        if ctx.ask_web_search
            && let Some(keyword) = self.keyword(table, text, Category::Google)
            && !keyword.is_empty()
        {
            let response = self.skills.call(SkillRequest::WebSearch { keyword }).await;
            ctx = ctx.apply(DispatchOutcome::from_response(response, &[Gate::NotConfirmation]));
        }

        if ctx.not_confirmation
            && let Some(rest) = self.keyword(table, text, Category::Confirmation)
            && (rest.is_empty() || self.matcher.matches(&rest, confirmations))
        {
            speak_random(voice, table, Category::ConfirmationResponses).await;
            return directive;
        }

        let mut response = ctx.into_response();
        if response.is_empty() {
            tracing::debug!(utterance = %text, "no category answered");
            response = table
                .random(Category::UnknownResponses)
                .unwrap_or_default()
                .to_string();
        }
        voice.speak(&response, None).await;
        directive
    }
}

async fn speak_random(voice: &Voice, table: &CommandTable, category: Category) {
    match table.random(category) {
        Some(line) => voice.speak(line, None).await,
        None => tracing::warn!(%category, "no lines configured"),
    }
}
