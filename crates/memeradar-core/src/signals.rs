//! Derived records written by the analysis engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermType {
    Hashtag,
    Phrase,
    ImageHash,
}

impl TermType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TermType::Hashtag => "hashtag",
            TermType::Phrase => "phrase",
            TermType::ImageHash => "image_hash",
        }
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TermType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hashtag" => Ok(TermType::Hashtag),
            "phrase" => Ok(TermType::Phrase),
            "image_hash" => Ok(TermType::ImageHash),
            other => Err(CoreError::UnknownTermType(other.to_string())),
        }
    }
}

/// Identity of a term series on one platform, independent of bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermKey {
    pub term: String,
    pub term_type: TermType,
    pub platform: Platform,
}

/// One bucket of aggregated counts for a term.
///
/// Unique per `(term, term_type, platform, bucket)`; writes are upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermStat {
    pub term: String,
    pub term_type: TermType,
    pub platform: Platform,
    pub bucket: DateTime<Utc>,
    pub count_posts: i64,
    pub count_comments: i64,
    pub sum_engagement: f64,
    pub distinct_authors: i64,
}

impl TermStat {
    #[must_use]
    pub fn frequency(&self) -> i64 {
        self.count_posts + self.count_comments
    }

    #[must_use]
    pub fn key(&self) -> TermKey {
        TermKey {
            term: self.term.clone(),
            term_type: self.term_type,
            platform: self.platform,
        }
    }
}

/// A trend candidate ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrendCandidate {
    pub term: String,
    pub term_type: TermType,
    pub platform: Platform,
    pub detected_at: DateTime<Utc>,
    pub current_frequency: i64,
    pub baseline_frequency: f64,
    pub acceleration_score: f64,
    pub z_score: f64,
    pub total_engagement: f64,
    pub distinct_authors: i64,
    pub trend_score: f64,
    pub example_refs: Vec<String>,
}

/// A persisted trend candidate.
///
/// `base_trend_score` is the composite score at detection time. Cross-platform
/// boosting derives `trend_score` from it, never from the current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendCandidate {
    pub id: i64,
    pub term: String,
    pub term_type: TermType,
    pub platform: Platform,
    pub detected_at: DateTime<Utc>,
    pub current_frequency: i64,
    pub baseline_frequency: f64,
    pub acceleration_score: f64,
    pub z_score: f64,
    pub total_engagement: f64,
    pub distinct_authors: i64,
    pub base_trend_score: f64,
    pub trend_score: f64,
    pub cross_platform: bool,
    pub platforms_seen: Vec<Platform>,
    pub example_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub id: i64,
    pub handle: String,
    /// `0` when the follower count has not been fetched.
    pub follower_count: i64,
    pub first_seen_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl Creator {
    #[must_use]
    pub fn followers_known(&self) -> bool {
        self.follower_count > 0
    }
}

/// Rolling snapshot over a creator's most recent videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCreatorStats {
    pub creator_id: i64,
    pub computed_at: DateTime<Utc>,
    pub videos_analyzed: i64,
    pub avg_views: f64,
    pub median_views: f64,
    pub avg_engagement_rate: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub avg_shares: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorStats {
    pub id: i64,
    pub creator_id: i64,
    pub computed_at: DateTime<Utc>,
    pub videos_analyzed: i64,
    pub avg_views: f64,
    pub median_views: f64,
    pub avg_engagement_rate: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub avg_shares: f64,
}

/// A qualifying video with its metrics captured at detection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHotVideo {
    pub post_id: i64,
    pub creator_id: i64,
    pub detected_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub virality_ratio: f64,
    pub engagement_rate: f64,
    pub comment_intensity: f64,
    pub spike_factor: f64,
    pub likes_to_views: f64,
    pub shares_to_likes: f64,
    pub discourse_signal: bool,
    pub meme_seed_score: f64,
}

/// A persisted hot video. Unique per post and never re-scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotVideo {
    pub id: i64,
    pub post_id: i64,
    pub creator_id: i64,
    pub detected_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub virality_ratio: f64,
    pub engagement_rate: f64,
    pub comment_intensity: f64,
    pub spike_factor: f64,
    pub likes_to_views: f64,
    pub shares_to_likes: f64,
    pub discourse_signal: bool,
    pub meme_seed_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchlistStatus {
    Active,
    Dropped,
}

impl WatchlistStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WatchlistStatus::Active => "active",
            WatchlistStatus::Dropped => "dropped",
        }
    }
}

impl fmt::Display for WatchlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchlistStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(WatchlistStatus::Active),
            "dropped" => Ok(WatchlistStatus::Dropped),
            other => Err(CoreError::UnknownWatchlistStatus(other.to_string())),
        }
    }
}

/// One entry per creator. Created on first qualification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub creator_id: i64,
    pub status: WatchlistStatus,
    pub first_qualified_at: DateTime<Utc>,
    pub last_qualified_at: DateTime<Utc>,
    pub max_virality_ratio: f64,
    pub max_spike_factor: f64,
    pub max_meme_seed_score: f64,
    pub qualifying_video_count: i64,
}

/// Global aggregate for a repeated comment phrase, keyed by `phrase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentPhrase {
    pub phrase: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub video_count: i64,
    pub total_occurrences: i64,
    pub total_likes: i64,
    pub avg_likes: f64,
    pub distinct_commenters: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_type_parses_storage_names() {
        for t in [TermType::Hashtag, TermType::Phrase, TermType::ImageHash] {
            assert_eq!(t.as_str().parse::<TermType>().unwrap(), t);
        }
    }

    #[test]
    fn frequency_sums_posts_and_comments() {
        let stat = TermStat {
            term: "very demure".to_string(),
            term_type: TermType::Phrase,
            platform: Platform::Tiktok,
            bucket: Utc::now(),
            count_posts: 4,
            count_comments: 9,
            sum_engagement: 0.0,
            distinct_authors: 3,
        };
        assert_eq!(stat.frequency(), 13);
    }

    #[test]
    fn unknown_watchlist_status_is_rejected() {
        assert!("paused".parse::<WatchlistStatus>().is_err());
    }
}
