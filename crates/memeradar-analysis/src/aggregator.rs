//! Folds the current bucket's posts and comments into term statistics.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use memeradar_core::{normalize_hashtag, Comment, Platform, Post, TermStat, TermType};

use crate::bucket::BucketClock;
use crate::error::StoreError;
use crate::phrases::PhraseExtractor;
use crate::store::ContentStore;

/// A caption phrase must appear in this many posts on a platform.
const MIN_PHRASE_POSTS: usize = 3;
/// A comment text must repeat this many times on a platform.
const MIN_COMMENT_REPEATS: i64 = 2;
const MAX_TERM_CHARS: usize = 512;

type Key = (String, TermType, Platform);

#[derive(Debug, Default)]
struct Accumulator {
    posts: HashSet<i64>,
    comments: i64,
    engagement: f64,
    authors: HashSet<String>,
}

impl Accumulator {
    fn add_post(&mut self, post: &Post) {
        if self.posts.insert(post.id) {
            self.engagement += post.engagement_score;
        }
        if let Some(author) = &post.author {
            self.authors.insert(author.clone());
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn add_comment(&mut self, comment: &Comment) {
        self.posts.insert(comment.post_id);
        self.comments += 1;
        self.engagement += comment.score as f64;
        if let Some(author) = &comment.author {
            self.authors.insert(author.clone());
        }
    }

    fn merge(&mut self, other: Accumulator) {
        self.posts.extend(other.posts);
        self.comments += other.comments;
        self.engagement += other.engagement;
        self.authors.extend(other.authors);
    }

    fn into_stat(self, key: Key, bucket: DateTime<Utc>) -> TermStat {
        let (term, term_type, platform) = key;
        TermStat {
            term,
            term_type,
            platform,
            bucket,
            count_posts: i64::try_from(self.posts.len()).unwrap_or(i64::MAX),
            count_comments: self.comments,
            sum_engagement: self.engagement,
            distinct_authors: i64::try_from(self.authors.len()).unwrap_or(i64::MAX),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TermAggregator {
    clock: BucketClock,
    extractor: PhraseExtractor,
}

impl TermAggregator {
    #[must_use]
    pub fn new(clock: BucketClock) -> Self {
        Self {
            clock,
            extractor: PhraseExtractor::new(),
        }
    }

    /// Recompute and upsert every statistic for the bucket containing `now`.
    ///
    /// Values are recomputed from the bucket's content and overwrite what is
    /// stored, so running twice over the same content is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if content cannot be read or a write fails.
    pub async fn aggregate(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<Vec<TermStat>, StoreError> {
        let bucket = self.clock.bucket_start(now);
        let end = self.clock.bucket_end(bucket);

        let posts = store.posts_between(bucket, end).await?;
        let comments = store.comments_between(bucket, end).await?;

        let stats = self.compute(&posts, &comments, bucket);
        for stat in &stats {
            store.upsert_term_stat(stat).await?;
        }

        tracing::info!(
            bucket = %bucket,
            posts = posts.len(),
            comments = comments.len(),
            stats = stats.len(),
            "term statistics aggregated"
        );
        Ok(stats)
    }

    /// Pure aggregation over one bucket's content.
    #[must_use]
    pub fn compute(
        &self,
        posts: &[Post],
        comments: &[Comment],
        bucket: DateTime<Utc>,
    ) -> Vec<TermStat> {
        let mut merged: BTreeMap<Key, Accumulator> = BTreeMap::new();

        for (key, acc) in hashtag_stats(posts) {
            merged.entry(key).or_default().merge(acc);
        }
        for (key, acc) in self.post_phrase_stats(posts) {
            merged.entry(key).or_default().merge(acc);
        }
        for (key, acc) in comment_phrase_stats(comments) {
            merged.entry(key).or_default().merge(acc);
        }

        merged
            .into_iter()
            .map(|(key, acc)| acc.into_stat(key, bucket))
            .collect()
    }

    fn post_phrase_stats(&self, posts: &[Post]) -> BTreeMap<Key, Accumulator> {
        let mut phrases: BTreeMap<Key, Accumulator> = BTreeMap::new();
        for post in posts {
            let Some(text) = post.text.as_deref() else {
                continue;
            };
            for phrase in self.extractor.extract(text) {
                phrases
                    .entry((phrase, TermType::Phrase, post.platform))
                    .or_default()
                    .add_post(post);
            }
        }
        phrases.retain(|_, acc| acc.posts.len() >= MIN_PHRASE_POSTS);
        phrases
    }
}

fn hashtag_stats(posts: &[Post]) -> BTreeMap<Key, Accumulator> {
    let mut tags: BTreeMap<Key, Accumulator> = BTreeMap::new();
    for post in posts {
        for tag in post.hashtags.iter().filter_map(|t| normalize_hashtag(t)) {
            tags.entry((tag, TermType::Hashtag, post.platform))
                .or_default()
                .add_post(post);
        }
    }
    tags
}

fn comment_phrase_stats(comments: &[Comment]) -> BTreeMap<Key, Accumulator> {
    let mut groups: BTreeMap<Key, Accumulator> = BTreeMap::new();
    for comment in comments {
        let Some(text) = comment.normalized_text.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        let term: String = text.chars().take(MAX_TERM_CHARS).collect();
        groups
            .entry((term, TermType::Phrase, comment.platform))
            .or_default()
            .add_comment(comment);
    }
    groups.retain(|_, acc| acc.comments >= MIN_COMMENT_REPEATS);
    groups
}
