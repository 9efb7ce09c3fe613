//! Repository interface between the detectors and durable storage.
//!
//! Detectors only ever see a `&dyn ContentStore`. [`PgStore`] backs it with
//! Postgres; [`MemoryStore`] keeps everything in process for tests and dry
//! runs.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memeradar_core::{
    Comment, CommentPhrase, Creator, CreatorStats, HotVideo, Media, NewCreatorStats, NewHotVideo,
    NewTrendCandidate, Platform, Post, TermKey, TermStat, TermType, TrendCandidate,
    WatchlistEntry, WatchlistStatus,
};

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ContentStore: Send + Sync {
    // -- content --------------------------------------------------------

    /// Posts collected in `[start, end)`.
    async fn posts_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError>;

    /// Comments collected in `[start, end)`.
    async fn comments_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Hashed media whose post was collected at or after `since`.
    async fn hashed_media_since(&self, since: DateTime<Utc>) -> Result<Vec<Media>, StoreError>;

    /// Images and GIFs without a hash, oldest first.
    async fn pending_media(&self, limit: usize) -> Result<Vec<Media>, StoreError>;

    /// Empty `hash` marks the media permanently unhashable.
    async fn set_media_hash(&self, media_id: i64, hash: &str) -> Result<(), StoreError>;

    async fn top_hashtag_permalinks(
        &self,
        tag: &str,
        platform: Platform,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;

    async fn top_comment_permalinks(
        &self,
        normalized_text: &str,
        platform: Platform,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;

    /// Newest posts on `platform` collected at or after `since`.
    async fn recent_posts(
        &self,
        platform: Platform,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError>;

    /// An author's newest posts on `platform`.
    async fn recent_posts_by_author(
        &self,
        platform: Platform,
        author: &str,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError>;

    async fn top_comments_for_post(
        &self,
        post_id: i64,
        limit: usize,
    ) -> Result<Vec<Comment>, StoreError>;

    // -- term statistics ------------------------------------------------

    /// Insert or overwrite the row for the stat's key tuple.
    async fn upsert_term_stat(&self, stat: &TermStat) -> Result<(), StoreError>;

    async fn term_stats_in_bucket(&self, bucket: DateTime<Utc>)
        -> Result<Vec<TermStat>, StoreError>;

    /// One series with buckets in `[from, until)`.
    async fn term_stat_history(
        &self,
        key: &TermKey,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<TermStat>, StoreError>;

    async fn term_stats_since(&self, since: DateTime<Utc>) -> Result<Vec<TermStat>, StoreError>;

    // -- trend candidates -----------------------------------------------

    async fn insert_trend_candidate(
        &self,
        candidate: &NewTrendCandidate,
    ) -> Result<TrendCandidate, StoreError>;

    async fn trend_candidates_for_term(
        &self,
        term: &str,
        term_type: TermType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TrendCandidate>, StoreError>;

    /// Flag every candidate for the term and set
    /// `trend_score = base_trend_score * multiplier`. Returns rows touched.
    async fn apply_cross_platform_boost(
        &self,
        term: &str,
        term_type: TermType,
        platforms: &[Platform],
        multiplier: f64,
    ) -> Result<u64, StoreError>;

    async fn recent_trend_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TrendCandidate>, StoreError>;

    // -- creators -------------------------------------------------------

    async fn get_or_create_creator(
        &self,
        handle: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<Creator, StoreError>;

    async fn get_creator(&self, creator_id: i64) -> Result<Option<Creator>, StoreError>;

    async fn latest_creator_stats(
        &self,
        creator_id: i64,
    ) -> Result<Option<CreatorStats>, StoreError>;

    async fn insert_creator_stats(
        &self,
        stats: &NewCreatorStats,
    ) -> Result<CreatorStats, StoreError>;

    async fn hot_video_for_post(&self, post_id: i64) -> Result<Option<HotVideo>, StoreError>;

    /// Returns the existing row unchanged when the post already has one.
    async fn insert_hot_video(&self, video: &NewHotVideo) -> Result<HotVideo, StoreError>;

    /// Best meme-seed score first.
    async fn hot_videos_for_creator(
        &self,
        creator_id: i64,
        limit: usize,
    ) -> Result<Vec<HotVideo>, StoreError>;

    // -- watchlist ------------------------------------------------------

    async fn watchlist_entry(&self, creator_id: i64)
        -> Result<Option<WatchlistEntry>, StoreError>;

    async fn save_watchlist_entry(&self, entry: &WatchlistEntry) -> Result<(), StoreError>;

    /// Drop active entries last qualified before `cutoff`.
    async fn drop_stale_watchlist(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Best max meme-seed score first.
    async fn list_watchlist(
        &self,
        status: Option<WatchlistStatus>,
        limit: usize,
    ) -> Result<Vec<WatchlistEntry>, StoreError>;

    // -- comment phrases ------------------------------------------------

    async fn comment_phrase(&self, phrase: &str) -> Result<Option<CommentPhrase>, StoreError>;

    async fn save_comment_phrase(&self, phrase: &CommentPhrase) -> Result<(), StoreError>;

    /// Phrases on at least `min_videos` videos, most widespread first.
    async fn trending_comment_phrases(
        &self,
        min_videos: i64,
        limit: usize,
    ) -> Result<Vec<CommentPhrase>, StoreError>;
}
