//! Comment text repeated across many posts by many accounts.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};
use memeradar_core::{AnalysisConfig, Comment, CommentMemeConfig, Platform};
use serde::Serialize;

use crate::error::StoreError;
use crate::store::ContentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentMeme {
    pub normalized_text: String,
    pub original_samples: Vec<String>,
    pub platforms: BTreeSet<Platform>,
    pub distinct_posts: usize,
    pub total_occurrences: usize,
    pub total_engagement: i64,
    pub distinct_authors: usize,
    pub earliest_seen: DateTime<Utc>,
    pub example_post_urls: Vec<String>,
}

impl CommentMeme {
    #[must_use]
    pub fn cross_platform(&self) -> bool {
        self.platforms.len() > 1
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn virality_score(&self) -> f64 {
        let platform_bonus = if self.cross_platform() { 2.0 } else { 1.0 };
        (self.distinct_posts as f64
            + self.total_engagement as f64 * 0.5
            + self.distinct_authors as f64 * 0.3)
            * platform_bonus
    }
}

#[derive(Debug)]
struct Group<'a> {
    comments: Vec<&'a Comment>,
    posts: HashSet<i64>,
    authors: HashSet<&'a str>,
}

#[derive(Debug, Clone)]
pub struct CommentMemeDetector {
    config: CommentMemeConfig,
}

impl CommentMemeDetector {
    #[must_use]
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.comment_memes.clone(),
        }
    }

    /// Repeated comments collected in the lookback window before `now`,
    /// most viral first. `platform` restricts the comments considered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if comments cannot be read.
    pub async fn detect(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
        platform: Option<Platform>,
    ) -> Result<Vec<CommentMeme>, StoreError> {
        let since = now - Duration::hours(i64::from(self.config.lookback_hours));
        let comments = store.comments_between(since, now).await?;
        let memes = self.compute(&comments, platform);
        tracing::info!(
            comments = comments.len(),
            memes = memes.len(),
            "comment meme detection complete"
        );
        Ok(memes)
    }

    /// Only the memes spanning more than one platform.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if comments cannot be read.
    pub async fn detect_cross_platform(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<Vec<CommentMeme>, StoreError> {
        let memes = self.detect(store, now, None).await?;
        Ok(memes.into_iter().filter(CommentMeme::cross_platform).collect())
    }

    #[must_use]
    pub fn compute(&self, comments: &[Comment], platform: Option<Platform>) -> Vec<CommentMeme> {
        let mut groups: BTreeMap<&str, Group<'_>> = BTreeMap::new();
        for comment in comments {
            if platform.is_some_and(|p| p != comment.platform) {
                continue;
            }
            let Some(text) = comment.normalized_text.as_deref() else {
                continue;
            };
            if text.len() < self.config.min_text_len {
                continue;
            }
            let group = groups.entry(text).or_insert_with(|| Group {
                comments: Vec::new(),
                posts: HashSet::new(),
                authors: HashSet::new(),
            });
            group.comments.push(comment);
            group.posts.insert(comment.post_id);
            if let Some(author) = comment.author.as_deref() {
                group.authors.insert(author);
            }
        }

        let mut qualifying: Vec<(&str, Group<'_>)> = groups
            .into_iter()
            .filter(|(_, g)| {
                g.posts.len() >= self.config.min_distinct_posts
                    && g.authors.len() >= self.config.min_distinct_authors
            })
            .collect();
        qualifying.sort_by(|a, b| b.1.posts.len().cmp(&a.1.posts.len()));
        qualifying.truncate(self.config.max_candidates);

        let mut memes: Vec<CommentMeme> = qualifying
            .into_iter()
            .filter_map(|(text, group)| self.build(text, &group))
            .collect();
        memes.sort_by(|a, b| b.virality_score().total_cmp(&a.virality_score()));
        memes
    }

    fn build(&self, text: &str, group: &Group<'_>) -> Option<CommentMeme> {
        let earliest_seen = group.comments.iter().map(|c| c.collected_at).min()?;

        let mut samples = Vec::new();
        let mut urls = Vec::new();
        for comment in &group.comments {
            if let Some(raw) = comment.text.as_deref() {
                if samples.len() < self.config.max_samples && !samples.iter().any(|s| s == raw) {
                    samples.push(raw.to_string());
                }
            }
            if let Some(url) = comment.post_permalink.as_deref() {
                if urls.len() < self.config.max_samples && !urls.iter().any(|u| u == url) {
                    urls.push(url.to_string());
                }
            }
        }

        Some(CommentMeme {
            normalized_text: text.to_string(),
            original_samples: samples,
            platforms: group.comments.iter().map(|c| c.platform).collect(),
            distinct_posts: group.posts.len(),
            total_occurrences: group.comments.len(),
            total_engagement: group.comments.iter().map(|c| c.score).sum(),
            distinct_authors: group.authors.len(),
            earliest_seen,
            example_post_urls: urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use memeradar_core::normalize_comment_text;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn comment(id: i64, post_id: i64, platform: Platform, author: &str, text: &str) -> Comment {
        Comment {
            id,
            post_id,
            platform,
            post_permalink: Some(format!("https://{platform}.test/p/{post_id}")),
            author: Some(author.to_string()),
            collected_at: now() - Duration::minutes(30 + id),
            text: Some(text.to_string()),
            normalized_text: Some(normalize_comment_text(text)),
            score: 2,
        }
    }

    fn fire_comments(platform_for: impl Fn(i64) -> Platform) -> Vec<Comment> {
        let authors = ["ana", "ben", "cy", "dee"];
        (1..=6)
            .map(|i| {
                let author = authors[usize::try_from(i).unwrap() % authors.len()];
                let text = if i % 2 == 0 { "first 🔥" } else { "First 🔥!!" };
                comment(i, 100 + i, platform_for(i), author, text)
            })
            .collect()
    }

    #[tokio::test]
    async fn repeated_emoji_comment_is_a_meme() {
        let store = MemoryStore::new();
        for c in fire_comments(|_| Platform::Tiktok) {
            store.add_comment(c);
        }
        let detector = CommentMemeDetector::new(&AnalysisConfig::default());

        let memes = detector.detect(&store, now(), None).await.unwrap();
        assert_eq!(memes.len(), 1);
        let meme = &memes[0];
        assert_eq!(meme.normalized_text, "first 🔥");
        assert_eq!(meme.distinct_posts, 6);
        assert_eq!(meme.distinct_authors, 4);
        assert!(!meme.cross_platform());
        assert_eq!(meme.original_samples.len(), 2);
        assert_eq!(meme.example_post_urls.len(), 5);
        // 6 + 12 * 0.5 + 4 * 0.3
        assert!((meme.virality_score() - 13.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn cross_platform_memes_double_their_score() {
        let store = MemoryStore::new();
        for c in fire_comments(|i| if i < 4 { Platform::Tiktok } else { Platform::Instagram }) {
            store.add_comment(c);
        }
        let detector = CommentMemeDetector::new(&AnalysisConfig::default());

        let memes = detector.detect_cross_platform(&store, now()).await.unwrap();
        assert_eq!(memes.len(), 1);
        assert!(memes[0].cross_platform());
        assert!((memes[0].virality_score() - 26.4).abs() < 1e-9);

        let tiktok_only = detector
            .detect(&store, now(), Some(Platform::Tiktok))
            .await
            .unwrap();
        assert!(tiktok_only.is_empty(), "three posts on tiktok alone");
    }

    #[test]
    fn too_few_authors_or_short_text_is_ignored() {
        let detector = CommentMemeDetector::new(&AnalysisConfig::default());
        let one_author: Vec<Comment> = (1..=6)
            .map(|i| comment(i, 100 + i, Platform::Reddit, "spammer", "buy my mixtape now"))
            .collect();
        assert!(detector.compute(&one_author, None).is_empty());

        let short: Vec<Comment> = (1..=6)
            .map(|i| comment(i, 100 + i, Platform::Reddit, &format!("u{i}"), "lol 😂"))
            .collect();
        assert!(detector.compute(&short, None).is_empty());
    }

    #[tokio::test]
    async fn comments_outside_window_are_not_read() {
        let store = MemoryStore::new();
        for mut c in fire_comments(|_| Platform::Tiktok) {
            c.collected_at = now() - Duration::hours(5);
            store.add_comment(c);
        }
        let detector = CommentMemeDetector::new(&AnalysisConfig::default());
        assert!(detector.detect(&store, now(), None).await.unwrap().is_empty());
    }
}
