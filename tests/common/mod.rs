//! Shared test utilities

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hark::config::SessionConfig;
use hark::{
    CommandStore, CommandTable, Composer, Error, Prompt, Result, RetryPolicy, Runtime,
    SkillDispatcher, SkillKind, SkillRequest, Skills, Speech, Voice,
};

pub const ASSISTANT: &str = "Jarvis";
pub const MASTER: &str = "Tony";

/// Speech backend fed from a script
///
/// Each `listen` pops the next scripted result; an exhausted script reports
/// `InputClosed`, or never returns when holding. Everything spoken is recorded.
#[derive(Default)]
pub struct MockSpeech {
    script: Mutex<VecDeque<Result<String>>>,
    spoken: Mutex<Vec<(String, Option<Prompt>)>>,
    hold: bool,
}

impl MockSpeech {
    pub fn new<I, S>(utterances: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(utterances.into_iter().map(|u| Ok(u.into())))
    }

    pub fn scripted(results: impl IntoIterator<Item = Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(results.into_iter().collect()),
            spoken: Mutex::new(Vec::new()),
            hold: false,
        })
    }

    /// Speech that stays silent forever once the script runs out
    pub fn holding<S: Into<String>>(utterances: impl IntoIterator<Item = S>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(utterances.into_iter().map(|u| Ok(u.into())).collect()),
            spoken: Mutex::new(Vec::new()),
            hold: true,
        })
    }

    /// Every `speak` call as (text, cue)
    pub fn spoken(&self) -> Vec<(String, Option<Prompt>)> {
        self.spoken.lock().unwrap().clone()
    }

    /// Non-empty spoken lines only
    pub fn lines(&self) -> Vec<String> {
        self.spoken()
            .into_iter()
            .map(|(text, _)| text)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Cues played, in order
    pub fn cues(&self) -> Vec<Prompt> {
        self.spoken().into_iter().filter_map(|(_, p)| p).collect()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl Speech for MockSpeech {
    async fn listen(&self) -> Result<String> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None if self.hold => std::future::pending().await,
            None => Err(Error::InputClosed),
        }
    }

    async fn speak(&self, text: &str, prompt: Option<Prompt>) -> Result<()> {
        self.spoken.lock().unwrap().push((text.to_string(), prompt));
        Ok(())
    }
}

/// Skills with canned answers per kind and a call log
#[derive(Default)]
pub struct MockSkills {
    answers: HashMap<SkillKind, String>,
    calls: Mutex<Vec<SkillRequest>>,
}

impl MockSkills {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn answer(mut self, kind: SkillKind, response: &str) -> Self {
        self.answers.insert(kind, response.to_string());
        self
    }

    pub fn calls(&self) -> Vec<SkillRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<SkillKind> {
        self.calls().iter().map(SkillRequest::kind).collect()
    }
}

#[async_trait]
impl Skills for MockSkills {
    async fn invoke(&self, request: &SkillRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());
        Ok(self.answers.get(&request.kind()).cloned().unwrap_or_default())
    }
}

/// Embedded command table for Jarvis and Tony
pub fn table() -> CommandTable {
    CommandTable::embedded(ASSISTANT, MASTER).expect("embedded table parses")
}

/// Voice over `speech` that never waits between retries
pub fn voice(speech: &Arc<MockSpeech>) -> Voice {
    let speech: Arc<dyn Speech> = Arc::clone(speech) as Arc<dyn Speech>;
    Voice::new(
        speech,
        ASSISTANT,
        RetryPolicy {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        },
    )
}

pub fn composer(skills: &Arc<MockSkills>) -> Composer {
    let skills: Arc<dyn Skills> = Arc::clone(skills) as Arc<dyn Skills>;
    Composer::new(ASSISTANT, SkillDispatcher::new(skills))
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        listen_timeout: 3,
        listen_window: Duration::from_millis(10),
        restart_delay: Duration::ZERO,
        max_restarts: 2,
        announce_hourly: false,
    }
}

/// Runtime wired to mocks
pub fn runtime(speech: &Arc<MockSpeech>, skills: &Arc<MockSkills>) -> Runtime {
    Runtime::new(
        session_config(),
        CommandStore::new(table()),
        composer(skills),
        voice(speech),
        ASSISTANT,
    )
}

/// Whether `line` is one of the table's lines for `category`
pub fn is_one_of(table: &CommandTable, category: hark::Category, line: &str) -> bool {
    table.phrases(category).iter().any(|p| p == line)
}
