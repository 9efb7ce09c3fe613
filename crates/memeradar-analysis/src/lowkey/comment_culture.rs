//! Repeated phrases in the comment sections of hot videos.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use memeradar_core::{normalize_comment_text, Comment, CommentPhrase};

use crate::error::StoreError;
use crate::store::ContentStore;

const MAX_PHRASE_CHARS: usize = 200;
const MIN_PHRASE_CHARS: usize = 3;
const MIN_REPEATS: i64 = 2;

/// One phrase's counts within a single video's comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseTally {
    pub phrase: String,
    pub occurrences: i64,
    pub likes: i64,
    pub commenters: i64,
}

/// Phrases repeated at least twice among `comments`, in phrase order.
#[must_use]
pub fn tally_phrases(comments: &[Comment]) -> Vec<PhraseTally> {
    let mut counts: BTreeMap<String, (i64, i64, HashSet<&str>)> = BTreeMap::new();
    for comment in comments {
        let Some(text) = comment.text.as_deref() else {
            continue;
        };
        let phrase: String = normalize_comment_text(text)
            .chars()
            .take(MAX_PHRASE_CHARS)
            .collect();
        if phrase.chars().count() < MIN_PHRASE_CHARS {
            continue;
        }
        let entry = counts.entry(phrase).or_default();
        entry.0 += 1;
        entry.1 += comment.score;
        if let Some(author) = comment.author.as_deref() {
            entry.2.insert(author);
        }
    }

    counts
        .into_iter()
        .filter(|(_, (occurrences, _, _))| *occurrences >= MIN_REPEATS)
        .map(|(phrase, (occurrences, likes, commenters))| PhraseTally {
            phrase,
            occurrences,
            likes,
            commenters: i64::try_from(commenters.len()).unwrap_or(i64::MAX),
        })
        .collect()
}

/// Fold one video's tally into the global phrase record.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn merge_phrase(
    existing: Option<CommentPhrase>,
    tally: &PhraseTally,
    now: DateTime<Utc>,
) -> CommentPhrase {
    let mut record = existing.unwrap_or_else(|| CommentPhrase {
        phrase: tally.phrase.clone(),
        first_seen_at: now,
        last_seen_at: now,
        video_count: 0,
        total_occurrences: 0,
        total_likes: 0,
        avg_likes: 0.0,
        distinct_commenters: 0,
    });
    record.last_seen_at = now;
    record.video_count += 1;
    record.total_occurrences += tally.occurrences;
    record.total_likes += tally.likes;
    record.distinct_commenters += tally.commenters;
    record.avg_likes = record.total_likes as f64 / record.total_occurrences.max(1) as f64;
    record
}

#[derive(Debug, Clone)]
pub struct CommentCultureAnalyzer {
    comments_per_video: usize,
}

impl CommentCultureAnalyzer {
    #[must_use]
    pub fn new(comments_per_video: usize) -> Self {
        Self { comments_per_video }
    }

    /// Record the repeated phrases under one video's top comments.
    /// Returns the phrases found.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if comments or phrase records cannot be read
    /// or written.
    pub async fn analyze_video(
        &self,
        store: &dyn ContentStore,
        post_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let comments = store
            .top_comments_for_post(post_id, self.comments_per_video)
            .await?;
        let tallies = tally_phrases(&comments);

        let mut phrases = Vec::with_capacity(tallies.len());
        for tally in tallies {
            let existing = store.comment_phrase(&tally.phrase).await?;
            store
                .save_comment_phrase(&merge_phrase(existing, &tally, now))
                .await?;
            phrases.push(tally.phrase);
        }

        tracing::debug!(post_id, phrases = phrases.len(), "comment culture analyzed");
        Ok(phrases)
    }
}
