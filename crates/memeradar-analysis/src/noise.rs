//! Noise suppression for trend candidates.
//!
//! Generic reactions, evergreen hashtags, single-account spam, and
//! promotional copy are rejected before anything is scored or persisted.

use std::collections::HashSet;

use memeradar_core::{NewTrendCandidate, NoiseLists, TermType, TrendCandidate};
use regex::Regex;

/// Evergreen hashtags survive only above this acceleration.
const EVERGREEN_ACCELERATION_OVERRIDE: f64 = 10.0;
/// A phrase dominated by a stop phrase beyond this share of its length is noise.
const STOP_PHRASE_OVERLAP: f64 = 0.7;
const MIN_PHRASE_CHARS: usize = 5;
const MIN_SINGLE_WORD_CHARS: usize = 15;

const PROMOTIONAL_PATTERNS: &[&str] = &[
    r"(?i)\b(discount|coupon|promo|sale|off|deal)\b",
    r"(?i)\b(link in bio|check out|subscribe|follow)\b",
    r"(?i)\b(buy now|shop now|order now|limited time)\b",
    r"(?i)\b(http|www\.)\b",
    r"(?i)\b\d+%\s*off\b",
    r"(?i)\b(giveaway|contest|win)\b",
];

/// The fields the noise filter looks at, whatever record they come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub term: &'a str,
    pub term_type: TermType,
    pub engagement: f64,
    pub acceleration: f64,
    pub distinct_authors: i64,
}

/// Records that can be judged by [`NoiseFilter`].
pub trait Scored {
    fn scored(&self) -> ScoredCandidate<'_>;
}

impl Scored for ScoredCandidate<'_> {
    fn scored(&self) -> ScoredCandidate<'_> {
        *self
    }
}

impl Scored for NewTrendCandidate {
    fn scored(&self) -> ScoredCandidate<'_> {
        ScoredCandidate {
            term: &self.term,
            term_type: self.term_type,
            engagement: self.total_engagement,
            acceleration: self.acceleration_score,
            distinct_authors: self.distinct_authors,
        }
    }
}

impl Scored for TrendCandidate {
    fn scored(&self) -> ScoredCandidate<'_> {
        ScoredCandidate {
            term: &self.term,
            term_type: self.term_type,
            engagement: self.total_engagement,
            acceleration: self.acceleration_score,
            distinct_authors: self.distinct_authors,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoiseFilter {
    stop_phrases: HashSet<String>,
    evergreen_hashtags: HashSet<String>,
    promotional: Vec<Regex>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new(&NoiseLists::default())
    }
}

impl NoiseFilter {
    #[must_use]
    pub fn new(lists: &NoiseLists) -> Self {
        let mut filter = Self {
            stop_phrases: HashSet::new(),
            evergreen_hashtags: HashSet::new(),
            promotional: PROMOTIONAL_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("valid promotional regex"))
                .collect(),
        };
        for phrase in &lists.stop_phrases {
            filter.add_stop_phrase(phrase);
        }
        for tag in &lists.evergreen_hashtags {
            filter.add_evergreen_hashtag(tag);
        }
        filter
    }

    pub fn add_stop_phrase(&mut self, phrase: &str) {
        let phrase = phrase.trim().to_lowercase();
        if !phrase.is_empty() {
            self.stop_phrases.insert(phrase);
        }
    }

    pub fn add_evergreen_hashtag(&mut self, hashtag: &str) {
        let tag = hashtag.trim().trim_start_matches('#').to_lowercase();
        if !tag.is_empty() {
            self.evergreen_hashtags.insert(tag);
        }
    }

    /// Whether a term is too generic, spammy, or promotional to be a meme.
    ///
    /// Image hashes are never noise.
    #[must_use]
    pub fn is_noise(&self, candidate: &ScoredCandidate<'_>) -> bool {
        let term = candidate.term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        match candidate.term_type {
            TermType::Hashtag => self.is_noise_hashtag(&term, candidate.acceleration),
            TermType::Phrase => self.is_noise_phrase(&term, candidate.distinct_authors),
            TermType::ImageHash => false,
        }
    }

    /// Keep only the records that are not noise, preserving order.
    #[must_use]
    pub fn filter<T: Scored>(&self, items: Vec<T>) -> Vec<T> {
        let before = items.len();
        let kept: Vec<T> = items
            .into_iter()
            .filter(|item| !self.is_noise(&item.scored()))
            .collect();
        tracing::debug!(before, kept = kept.len(), "noise filter applied");
        kept
    }

    fn is_noise_hashtag(&self, hashtag: &str, acceleration: f64) -> bool {
        let tag = hashtag.trim_start_matches('#');

        if self.evergreen_hashtags.contains(tag) && acceleration < EVERGREEN_ACCELERATION_OVERRIDE
        {
            return true;
        }
        if tag.chars().count() < 2 {
            return true;
        }
        tag.chars().all(|c| c.is_ascii_digit())
    }

    #[allow(clippy::cast_precision_loss)]
    fn is_noise_phrase(&self, phrase: &str, distinct_authors: i64) -> bool {
        if self.stop_phrases.contains(phrase) {
            return true;
        }

        let phrase_len = phrase.chars().count();
        let dominated = self.stop_phrases.iter().any(|stop| {
            phrase.contains(stop.as_str())
                && stop.chars().count() as f64 / phrase_len as f64 > STOP_PHRASE_OVERLAP
        });
        if dominated {
            return true;
        }

        if phrase_len < MIN_PHRASE_CHARS {
            return true;
        }
        if !phrase.contains(' ') && phrase_len < MIN_SINGLE_WORD_CHARS {
            return true;
        }
        if distinct_authors <= 1 {
            return true;
        }

        self.promotional.iter().any(|re| re.is_match(phrase))
    }
}
