//! Browser-backed searches and HTTP knowledge sources

use std::path::PathBuf;

use serde::Deserialize;

use crate::{Error, Result};

/// Wikipedia page summary endpoint
const WIKIPEDIA_SUMMARY: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";

/// Wolfram|Alpha short answers endpoint
const WOLFRAM_RESULT: &str = "https://api.wolframalpha.com/v1/result";

/// Sentences kept from an encyclopedia summary
const SUMMARY_SENTENCES: usize = 2;

#[derive(Debug, Deserialize)]
struct WikipediaSummary {
    #[serde(rename = "type")]
    page_type: Option<String>,
    extract: Option<String>,
}

/// Locate the desktop URL opener
pub(super) fn find_opener() -> Option<PathBuf> {
    ["xdg-open", "open", "wslview"]
        .into_iter()
        .find_map(|bin| which::which(bin).ok())
}

/// Open `url` in the default browser without waiting for it
pub(super) fn open_url(opener: Option<&PathBuf>, url: &str) -> Result<()> {
    let opener = opener.ok_or_else(|| Error::Skill("no URL opener found on PATH".to_string()))?;
    tokio::process::Command::new(opener)
        .arg(url)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| Error::Skill(format!("failed to open {url}: {e}")))?;
    tracing::debug!(url, "opened in browser");
    Ok(())
}

#[must_use]
pub(super) fn google_search_url(query: &str) -> String {
    format!("https://www.google.com/search?q={}", urlencoding::encode(query))
}

#[must_use]
pub(super) fn youtube_search_url(query: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(query)
    )
}

#[must_use]
pub(super) fn maps_url(location: &str) -> String {
    format!("https://www.google.com/maps/place/{}", urlencoding::encode(location))
}

/// Fetch the opening sentences of the Wikipedia article for `keyword`
///
/// Missing and disambiguation pages yield an empty answer.
///
/// # Errors
///
/// Returns error if the request fails
pub(super) async fn wikipedia_summary(client: &reqwest::Client, keyword: &str) -> Result<String> {
    let title = keyword.trim().replace(' ', "_");
    let url = format!("{WIKIPEDIA_SUMMARY}{}", urlencoding::encode(&title));

    let response = client.get(&url).send().await?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(String::new());
    }
    let summary: WikipediaSummary = response.error_for_status()?.json().await?;

    if summary.page_type.as_deref() == Some("disambiguation") {
        return Ok(String::new());
    }
    Ok(first_sentences(
        summary.extract.as_deref().unwrap_or_default(),
        SUMMARY_SENTENCES,
    ))
}

/// Ask Wolfram|Alpha for a short spoken answer
///
/// Without an app id, or when Wolfram has no answer, the result is empty.
///
/// # Errors
///
/// Returns error if the request fails
pub(super) async fn wolfram_short_answer(
    client: &reqwest::Client,
    app_id: Option<&str>,
    question: &str,
) -> Result<String> {
    let Some(app_id) = app_id else {
        return Ok(String::new());
    };

    let response = client
        .get(WOLFRAM_RESULT)
        .query(&[("appid", app_id), ("i", question)])
        .send()
        .await?;

    // 501: no short answer for this input
    if response.status() == reqwest::StatusCode::NOT_IMPLEMENTED {
        return Ok(String::new());
    }
    Ok(response.error_for_status()?.text().await?)
}

/// Keep the first `n` sentences of a passage
#[must_use]
pub(super) fn first_sentences(text: &str, n: usize) -> String {
    text.match_indices(". ")
        .nth(n.saturating_sub(1))
        .map_or(text, |(i, _)| &text[..=i])
        .trim()
        .to_string()
}
