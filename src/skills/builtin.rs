//! Default skill set backed by the local machine and public web APIs

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use super::{SkillRequest, Skills, calculator, system, web};
use crate::{Error, Result};
use crate::config::SkillsConfig;
use crate::matcher::tokens;

/// Timeout for knowledge lookups
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Built-in skills
pub struct LocalSkills {
    config: SkillsConfig,
    client: reqwest::Client,
    opener: Option<PathBuf>,
}

impl LocalSkills {
    /// Build the skill set and its HTTP client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: SkillsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("hark/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;
        let opener = web::find_opener();
        if opener.is_none() {
            tracing::warn!("no URL opener found, browser skills will stay silent");
        }

        Ok(Self {
            config,
            client,
            opener,
        })
    }

    fn browse(&self, url: &str, reply: String) -> Result<String> {
        web::open_url(self.opener.as_ref(), url)?;
        Ok(reply)
    }

    async fn find_file(&self, keyword: &str) -> Result<String> {
        let roots = self.config.search_roots.clone();
        let depth = self.config.search_depth;
        let needle = keyword.to_string();
        let found = tokio::task::spawn_blocking(move || system::find_files(&roots, depth, &needle))
            .await
            .map_err(|e| Error::Skill(format!("file search aborted: {e}")))?;
        Ok(system::describe_matches(keyword, &found))
    }
}

/// Spoken time or date
fn time_reply(utterance: &str) -> String {
    let now = chrono::Local::now();
    let asks_date = tokens(utterance)
        .iter()
        .any(|w| matches!(w.as_str(), "date" | "day" | "today"));
    if asks_date {
        format!("Today is {}.", now.format("%A, %B %-d, %Y"))
    } else {
        format!("The time is {}.", now.format("%I:%M %p"))
    }
}

#[async_trait]
impl Skills for LocalSkills {
    async fn invoke(&self, request: &SkillRequest) -> Result<String> {
        match request {
            // no portable way to set a wallpaper
            SkillRequest::Wallpaper => Ok(String::new()),
            SkillRequest::PlayMusic { keyword } => {
                let query = if keyword.is_empty() { "music" } else { keyword.as_str() };
                self.browse(
                    &web::youtube_search_url(query),
                    format!("Ok! Playing {query}."),
                )
            }
            SkillRequest::Brightness { utterance } => system::brightness(utterance).await,
            SkillRequest::Wifi { utterance } => system::wifi(utterance).await,
            SkillRequest::Power { utterance } => {
                system::power(utterance, self.config.allow_power_control).await
            }
            SkillRequest::NewProject { language, name } => {
                system::new_project(&self.config.projects_dir, language, name).await
            }
            SkillRequest::Time { utterance } => Ok(time_reply(utterance)),
            SkillRequest::Calculator { utterance } => Ok(calculator::evaluate(utterance)?
                .map(|v| format!("The answer is {}.", calculator::format_number(v)))
                .unwrap_or_default()),
            SkillRequest::OpenApp { utterance } => system::open_app(utterance).await,
            SkillRequest::FindFile { keyword } => self.find_file(keyword).await,
            SkillRequest::VideoSearch { keyword }
            | SkillRequest::MapSearch { location: keyword }
            | SkillRequest::WebSearch { keyword }
                if keyword.trim().is_empty() =>
            {
                Ok(String::new())
            }
            SkillRequest::VideoSearch { keyword } => self.browse(
                &web::youtube_search_url(keyword),
                format!("Here are the videos for {keyword}."),
            ),
            SkillRequest::MapSearch { location } => self.browse(
                &web::maps_url(location),
                format!("Here is the map of {location}."),
            ),
            SkillRequest::KnowledgeQuery { utterance } => {
                web::wolfram_short_answer(
                    &self.client,
                    self.config.wolfram_app_id.as_deref(),
                    utterance,
                )
                .await
            }
            SkillRequest::Encyclopedia { keyword } => {
                web::wikipedia_summary(&self.client, keyword).await
            }
            SkillRequest::WebSearch { keyword } => self.browse(
                &web::google_search_url(keyword),
                format!("Here is what I found for {keyword} on Google."),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills() -> LocalSkills {
        let dir = std::env::temp_dir();
        LocalSkills::new(SkillsConfig {
            wolfram_app_id: None,
            projects_dir: dir.clone(),
            search_roots: vec![dir],
            search_depth: 0,
            allow_power_control: false,
        })
        .unwrap()
    }

    #[test]
    fn new_builds_configured_client() {
        let built = LocalSkills::new(SkillsConfig {
            wolfram_app_id: None,
            projects_dir: std::env::temp_dir(),
            search_roots: Vec::new(),
            search_depth: 0,
            allow_power_control: false,
        });
        assert!(built.is_ok());
    }

    #[test]
    fn time_or_date() {
        assert!(time_reply("what time is it").starts_with("The time is "));
        assert!(time_reply("what day is it").starts_with("Today is "));
    }

    #[tokio::test]
    async fn calculator_reply() {
        let reply = skills()
            .invoke(&SkillRequest::Calculator {
                utterance: "what is 6 times 7".into(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "The answer is 42.");

        let none = skills()
            .invoke(&SkillRequest::Calculator {
                utterance: "what is love".into(),
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn knowledge_without_app_id_is_silent() {
        let reply = skills()
            .invoke(&SkillRequest::KnowledgeQuery {
                utterance: "distance to the moon".into(),
            })
            .await
            .unwrap();
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn empty_search_is_silent() {
        let reply = skills()
            .invoke(&SkillRequest::WebSearch {
                keyword: "  ".into(),
            })
            .await
            .unwrap();
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn wallpaper_is_unavailable() {
        assert!(skills().invoke(&SkillRequest::Wallpaper).await.unwrap().is_empty());
    }
}
