//! Composer integration tests
//!
//! Runs utterances through the full priority chain with scripted skills

use std::sync::Arc;

use hark::{Category, Directive, Prompt, SkillKind, SkillRequest};

mod common;
use common::{MockSkills, MockSpeech, composer, is_one_of, table, voice};

async fn compose(skills: MockSkills, utterance: &str) -> (Directive, Arc<MockSpeech>, Arc<MockSkills>) {
    let skills = Arc::new(skills);
    let speech = MockSpeech::new(Vec::<String>::new());
    let directive = composer(&skills)
        .compose(&table(), &voice(&speech), utterance)
        .await;
    (directive, speech, skills)
}

#[tokio::test]
async fn test_time_answer_is_exclusive() {
    let skills = MockSkills::new().answer(SkillKind::Time, "The time is 10:00 AM.");
    let (directive, speech, skills) = compose(skills, "what time is it").await;

    assert_eq!(directive, Directive::Continue);
    assert_eq!(skills.kinds(), vec![SkillKind::Time]);
    assert_eq!(speech.lines(), vec!["The time is 10:00 AM."]);
}

#[tokio::test]
async fn test_music_takeover_mutes_after_speaking() {
    let skills = MockSkills::new().answer(SkillKind::Music, "Ok! Playing lofi.");
    let (directive, speech, skills) = compose(skills, "play music lofi").await;

    assert_eq!(directive, Directive::MuteAfterSpeaking);
    assert_eq!(
        skills.calls(),
        vec![SkillRequest::PlayMusic {
            keyword: "lofi".into()
        }]
    );
    assert_eq!(speech.lines(), vec!["Ok! Playing lofi."]);
}

#[tokio::test]
async fn test_terminate_speaks_farewell_without_skills() {
    let (directive, speech, skills) = compose(MockSkills::new(), "goodbye jarvis").await;

    assert_eq!(directive, Directive::Terminate);
    assert!(skills.calls().is_empty());
    let lines = speech.lines();
    assert_eq!(lines.len(), 1);
    assert!(is_one_of(&table(), Category::TerminateResponse, &lines[0]));
    assert_eq!(speech.cues(), vec![Prompt::Mute]);
}

#[tokio::test]
async fn test_unanswered_falls_back_to_unknown_response() {
    let (directive, speech, skills) = compose(MockSkills::new(), "blah blah blah").await;

    assert_eq!(directive, Directive::Continue);
    assert_eq!(skills.kinds(), vec![SkillKind::Knowledge]);
    let lines = speech.lines();
    assert_eq!(lines.len(), 1);
    assert!(is_one_of(&table(), Category::UnknownResponses, &lines[0]));
}

#[tokio::test]
async fn test_relevant_encyclopedia_passage_is_spoken() {
    let passage = "The Leaning Tower of Pisa is the campanile of Pisa Cathedral.";
    let skills = MockSkills::new().answer(SkillKind::Encyclopedia, passage);
    let (_, speech, skills) = compose(skills, "tell me about the leaning tower of pisa").await;

    assert_eq!(skills.kinds(), vec![SkillKind::Knowledge, SkillKind::Encyclopedia]);
    assert_eq!(
        skills.calls()[1],
        SkillRequest::Encyclopedia {
            keyword: "the leaning tower of pisa".into()
        }
    );
    assert_eq!(speech.lines(), vec![passage]);
}

#[tokio::test]
async fn test_irrelevant_encyclopedia_passage_is_discarded() {
    let skills = MockSkills::new().answer(SkillKind::Encyclopedia, "A tower stands in Pisa.");
    let (_, speech, _) = compose(skills, "tell me about the leaning tower of pisa").await;

    let lines = speech.lines();
    assert_eq!(lines.len(), 1);
    assert!(is_one_of(&table(), Category::UnknownResponses, &lines[0]));
}

#[tokio::test]
async fn test_engine_answer_suppresses_encyclopedia() {
    let skills = MockSkills::new()
        .answer(SkillKind::Knowledge, "Alan Turing was a mathematician.")
        .answer(SkillKind::Encyclopedia, "Alan Mathison Turing was an English mathematician.");
    let (_, speech, skills) = compose(skills, "who is alan turing").await;

    assert_eq!(skills.kinds(), vec![SkillKind::Knowledge]);
    assert_eq!(speech.lines(), vec!["Alan Turing was a mathematician."]);
}

#[tokio::test]
async fn test_confirmation_vetoes_engine() {
    let (directive, speech, skills) = compose(MockSkills::new(), "yes").await;

    assert_eq!(directive, Directive::Continue);
    assert!(skills.calls().is_empty());
    let lines = speech.lines();
    assert_eq!(lines.len(), 1);
    assert!(is_one_of(&table(), Category::ConfirmationResponses, &lines[0]));
}

#[tokio::test]
async fn test_greeting_with_name() {
    let (_, speech, skills) = compose(MockSkills::new(), "hi jarvis").await;

    assert!(skills.calls().is_empty());
    let lines = speech.lines();
    assert_eq!(lines.len(), 1);
    assert!(is_one_of(&table(), Category::GreetingResponses, &lines[0]));
}

#[tokio::test]
async fn test_ask_name() {
    let (_, speech, _) = compose(MockSkills::new(), "what is your name").await;
    assert_eq!(speech.lines().len(), 1);
    assert!(is_one_of(
        &table(),
        Category::AskAssistantNameResponse,
        &speech.lines()[0]
    ));
}

#[tokio::test]
async fn test_bare_name_plays_end_cue_and_greets() {
    let (_, speech, skills) = compose(MockSkills::new(), "Jarvis").await;

    assert!(skills.calls().is_empty());
    assert_eq!(speech.cues(), vec![Prompt::End]);
    let lines = speech.lines();
    assert_eq!(lines.len(), 1);
    assert!(is_one_of(&table(), Category::WakeupResponses, &lines[0]));
}

#[tokio::test]
async fn test_power_takeover_terminates() {
    let skills = MockSkills::new().answer(SkillKind::Power, "Ok! The system will restart in one minute.");
    let (directive, speech, skills) = compose(skills, "restart the system").await;

    assert_eq!(directive, Directive::Terminate);
    assert_eq!(skills.kinds(), vec![SkillKind::Power]);
    let lines = speech.lines();
    assert_eq!(lines[0], "Ok! The system will restart in one minute.");
    assert!(is_one_of(&table(), Category::TerminateResponse, &lines[1]));
}

#[tokio::test]
async fn test_power_refusal_keeps_session() {
    let skills = MockSkills::new().answer(SkillKind::Power, "Power control is disabled.");
    let (directive, speech, _) = compose(skills, "reboot").await;

    assert_eq!(directive, Directive::Continue);
    assert_eq!(speech.lines(), vec!["Power control is disabled."]);
}

#[tokio::test]
async fn test_brightness_leaves_answer_sources_open() {
    let skills = MockSkills::new().answer(SkillKind::Brightness, "Brightness increased.");
    let (_, speech, skills) = compose(skills, "increase brightness").await;

    assert_eq!(skills.kinds(), vec![SkillKind::Brightness, SkillKind::Knowledge]);
    assert_eq!(speech.lines(), vec!["Brightness increased."]);
}

#[tokio::test]
async fn test_app_and_video_responses_accumulate() {
    let skills = MockSkills::new()
        .answer(SkillKind::App, "Opening firefox.")
        .answer(SkillKind::Video, "Here are the videos.");
    let (_, speech, skills) = compose(skills, "open firefox and search youtube for cats").await;

    assert_eq!(skills.kinds(), vec![SkillKind::App, SkillKind::Video]);
    assert_eq!(speech.lines(), vec!["Opening firefox. Here are the videos."]);
}

#[tokio::test]
async fn test_project_speaks_progress() {
    let skills = MockSkills::new().answer(SkillKind::Project, "Project NewProjectFolder is ready.");
    let (_, speech, skills) = compose(skills, "create a new project in rust").await;

    assert_eq!(
        skills.calls(),
        vec![SkillRequest::NewProject {
            language: "rust".into(),
            name: "NewProjectFolder".into()
        }]
    );
    assert_eq!(
        speech.lines(),
        vec![
            "Ok! Just a moment.",
            "Initiating new rust project.",
            "Project NewProjectFolder is ready."
        ]
    );
}

#[tokio::test]
async fn test_wake_phrase_with_question_is_answered_once() {
    let skills = MockSkills::new().answer(SkillKind::Time, "The time is 10:00 AM.");
    let (_, speech, skills) = compose(skills, "hey jarvis what time is it").await;

    assert_eq!(skills.kinds(), vec![SkillKind::Time]);
    assert_eq!(speech.cues(), vec![Prompt::Start]);
    assert_eq!(speech.lines(), vec!["The time is 10:00 AM."]);
}

#[tokio::test]
async fn test_weather_skips_encyclopedia() {
    let (_, _, skills) = compose(MockSkills::new(), "what is the weather in paris").await;

    assert_eq!(skills.kinds(), vec![SkillKind::Calculator, SkillKind::Knowledge]);
}

#[tokio::test]
async fn test_calculator_answer_closes_fallbacks() {
    let skills = MockSkills::new().answer(SkillKind::Calculator, "The answer is 42.");
    let (_, speech, skills) = compose(skills, "what is 6 times 7").await;

    assert_eq!(skills.kinds(), vec![SkillKind::Calculator]);
    assert_eq!(speech.lines(), vec!["The answer is 42."]);
}

#[tokio::test]
async fn test_greeting_with_question_falls_through() {
    let skills = MockSkills::new().answer(SkillKind::Time, "The time is 10:00 AM.");
    let (_, speech, skills) = compose(skills, "good morning what time is it").await;

    assert_eq!(skills.kinds(), vec![SkillKind::Time]);
    assert_eq!(speech.lines(), vec!["The time is 10:00 AM."]);
}

#[tokio::test]
async fn test_map_search_is_exclusive() {
    let skills = MockSkills::new().answer(SkillKind::Maps, "Here is paris on the map.");
    let (_, speech, skills) = compose(skills, "where is paris").await;

    assert_eq!(
        skills.calls(),
        vec![SkillRequest::MapSearch {
            location: "paris".into()
        }]
    );
    assert_eq!(speech.lines(), vec!["Here is paris on the map."]);
}

#[tokio::test]
async fn test_web_search_after_silent_engine() {
    let skills = MockSkills::new().answer(SkillKind::WebSearch, "Here are the results for rust.");
    let (_, speech, skills) = compose(skills, "search for rust").await;

    assert_eq!(skills.kinds(), vec![SkillKind::Knowledge, SkillKind::WebSearch]);
    assert_eq!(
        skills.calls()[1],
        SkillRequest::WebSearch {
            keyword: "rust".into()
        }
    );
    assert_eq!(speech.lines(), vec!["Here are the results for rust."]);
}

#[tokio::test]
async fn test_file_search_closes_fallbacks() {
    let skills = MockSkills::new().answer(SkillKind::FileSearch, "I found report.txt.");
    let (_, speech, skills) = compose(skills, "find the file report").await;

    assert_eq!(
        skills.calls(),
        vec![SkillRequest::FindFile {
            keyword: "report".into()
        }]
    );
    assert_eq!(speech.lines(), vec!["I found report.txt."]);
}
