//! Candidate phrase extraction from post captions.

use std::collections::HashSet;

use regex::Regex;

/// Connective bigrams that never carry meme signal.
const STOP_BIGRAMS: &[&str] = &[
    "in the",
    "on the",
    "at the",
    "to the",
    "for the",
    "of the",
    "and the",
    "is the",
    "it is",
    "this is",
    "that is",
    "i am",
    "you are",
    "we are",
    "they are",
    "i have",
    "you have",
    "we have",
    "check out",
    "link in",
    "follow me",
    "like and",
    "comment below",
    "let me",
    "want to",
    "going to",
    "have to",
    "need to",
];

const MIN_BIGRAM_CHARS: usize = 5;
const MIN_TRIGRAM_CHARS: usize = 7;

/// Extracts contiguous two- and three-word phrases from post text.
#[derive(Debug, Clone)]
pub struct PhraseExtractor {
    urls: Regex,
    hashtags: Regex,
    mentions: Regex,
    punctuation: Regex,
    stop: HashSet<&'static str>,
}

impl Default for PhraseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            urls: Regex::new(r"http\S+|www\S+").expect("valid url regex"),
            hashtags: Regex::new(r"#\w+").expect("valid hashtag regex"),
            mentions: Regex::new(r"@\w+").expect("valid mention regex"),
            punctuation: Regex::new(r"[^\w\s]").expect("valid punctuation regex"),
            stop: STOP_BIGRAMS.iter().copied().collect(),
        }
    }

    /// Lowercased words with URLs, hashtags, mentions, and punctuation removed.
    #[must_use]
    pub fn clean_words(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let text = self.urls.replace_all(&lowered, "");
        let text = self.hashtags.replace_all(&text, "");
        let text = self.mentions.replace_all(&text, "");
        let text = self.punctuation.replace_all(&text, " ");
        text.split_whitespace().map(str::to_string).collect()
    }

    /// Distinct phrases in `text`, bigrams before trigrams, each once.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        let words = self.clean_words(text);
        let mut seen = HashSet::new();
        let mut phrases = Vec::new();

        for (size, min_chars) in [(2, MIN_BIGRAM_CHARS), (3, MIN_TRIGRAM_CHARS)] {
            for window in words.windows(size) {
                let phrase = window.join(" ");
                if phrase.chars().count() < min_chars || self.stop.contains(phrase.as_str()) {
                    continue;
                }
                if seen.insert(phrase.clone()) {
                    phrases.push(phrase);
                }
            }
        }

        phrases
    }
}
