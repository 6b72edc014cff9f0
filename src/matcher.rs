//! Phrase matching and keyword extraction
//!
//! Utterances and phrases are compared as token sequences: lowercased,
//! whitespace-split, with leading and trailing punctuation trimmed from each
//! token. A phrase matches when its tokens appear as a contiguous run.

/// Split text into normalized tokens
#[must_use]
pub fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| c.is_ascii_punctuation()).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Position of the first contiguous occurrence of `needle` in `haystack`
fn find_run(haystack: &[String], needle: &[String]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Matcher bound to the assistant's name
#[derive(Debug, Clone)]
pub struct Matcher {
    name_tokens: Vec<String>,
}

impl Matcher {
    #[must_use]
    pub fn new(assistant_name: &str) -> Self {
        Self {
            name_tokens: tokens(assistant_name),
        }
    }

    /// Whether the utterance contains any phrase
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, utterance: &str, phrases: &[S]) -> bool {
        self.first_match(utterance, phrases).is_some()
    }

    /// First phrase, in declaration order, contained in the utterance
    #[must_use]
    pub fn first_match<'p, S: AsRef<str>>(&self, utterance: &str, phrases: &'p [S]) -> Option<&'p str> {
        let words = tokens(utterance);
        phrases
            .iter()
            .map(AsRef::as_ref)
            .find(|p| find_run(&words, &tokens(p)).is_some())
    }

    /// Remainder of the utterance once the matched phrase and the name are removed
    ///
    /// Only the first occurrence of the first matching phrase is removed. The
    /// result is lowercased and single-space joined; an empty string means the
    /// category was invoked without a parameter.
    #[must_use]
    pub fn extract_metadata<S: AsRef<str>>(&self, utterance: &str, phrases: &[S]) -> String {
        let mut words = tokens(utterance);
        for phrase in phrases {
            let needle = tokens(phrase.as_ref());
            if let Some(at) = find_run(&words, &needle) {
                words.drain(at..at + needle.len());
                break;
            }
        }
        self.without_name(words).join(" ")
    }

    /// Utterance with the assistant's name removed
    #[must_use]
    pub fn clean(&self, utterance: &str) -> String {
        self.without_name(tokens(utterance)).join(" ")
    }

    /// Whether the utterance mentions the assistant's name
    #[must_use]
    pub fn mentions_name(&self, utterance: &str) -> bool {
        find_run(&tokens(utterance), &self.name_tokens).is_some()
    }

    /// Whether the utterance is the assistant's name and nothing else
    #[must_use]
    pub fn is_name_only(&self, utterance: &str) -> bool {
        self.mentions_name(utterance) && self.clean(utterance).is_empty()
    }

    fn without_name(&self, mut words: Vec<String>) -> Vec<String> {
        while let Some(at) = find_run(&words, &self.name_tokens) {
            words.drain(at..at + self.name_tokens.len());
        }
        words
    }
}

/// Whether any single token of the utterance equals one of the phrases
///
/// Multi-word phrases can never equal a single token, so only one-word
/// entries take part.
#[must_use]
pub fn contains_any_word<S: AsRef<str>>(utterance: &str, phrases: &[S]) -> bool {
    let words = tokens(utterance);
    phrases.iter().any(|p| {
        let p = tokens(p.as_ref());
        p.len() == 1 && words.contains(&p[0])
    })
}

/// Word count of a keyword
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
