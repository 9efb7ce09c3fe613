use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memeradar_core::{
    normalize_hashtag, Comment, CommentPhrase, Creator, CreatorStats, HotVideo, Media, MediaType,
    NewCreatorStats, NewHotVideo, NewTrendCandidate, Platform, Post, TermKey, TermStat, TermType,
    TrendCandidate, WatchlistEntry, WatchlistStatus,
};

use super::ContentStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    media: Vec<Media>,
    term_stats: Vec<TermStat>,
    trend_candidates: Vec<TrendCandidate>,
    creators: Vec<Creator>,
    creator_stats: Vec<CreatorStats>,
    hot_videos: Vec<HotVideo>,
    watchlist: Vec<WatchlistEntry>,
    comment_phrases: Vec<CommentPhrase>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process [`ContentStore`]. Content is seeded through the `add_*`
/// methods; derived records can be inspected through the snapshot getters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_post(&self, post: Post) {
        self.lock().posts.push(post);
    }

    pub fn add_comment(&self, comment: Comment) {
        self.lock().comments.push(comment);
    }

    pub fn add_media(&self, media: Media) {
        self.lock().media.push(media);
    }

    /// Record a follower count fetched for `handle`, creating the creator if
    /// needed.
    pub fn set_follower_count(&self, handle: &str, follower_count: i64, at: DateTime<Utc>) {
        let mut state = self.lock();
        if let Some(creator) = state.creators.iter_mut().find(|c| c.handle == handle) {
            creator.follower_count = follower_count;
            creator.last_updated_at = at;
            return;
        }
        let id = state.next_id();
        state.creators.push(Creator {
            id,
            handle: handle.to_string(),
            follower_count,
            first_seen_at: at,
            last_updated_at: at,
        });
    }

    #[must_use]
    pub fn term_stats(&self) -> Vec<TermStat> {
        self.lock().term_stats.clone()
    }

    #[must_use]
    pub fn trend_candidates(&self) -> Vec<TrendCandidate> {
        self.lock().trend_candidates.clone()
    }

    #[must_use]
    pub fn media(&self) -> Vec<Media> {
        self.lock().media.clone()
    }

    #[must_use]
    pub fn hot_videos(&self) -> Vec<HotVideo> {
        self.lock().hot_videos.clone()
    }

    #[must_use]
    pub fn creator_stats(&self, creator_id: i64) -> Vec<CreatorStats> {
        self.lock()
            .creator_stats
            .iter()
            .filter(|s| s.creator_id == creator_id)
            .cloned()
            .collect()
    }
}

fn in_window(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    at >= start && at < end
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.collected_at.cmp(&a.collected_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn posts_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .lock()
            .posts
            .iter()
            .filter(|p| in_window(p.collected_at, start, end))
            .cloned()
            .collect())
    }

    async fn comments_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Comment>, StoreError> {
        Ok(self
            .lock()
            .comments
            .iter()
            .filter(|c| in_window(c.collected_at, start, end))
            .cloned()
            .collect())
    }

    async fn hashed_media_since(&self, since: DateTime<Utc>) -> Result<Vec<Media>, StoreError> {
        Ok(self
            .lock()
            .media
            .iter()
            .filter(|m| m.post_collected_at >= since && m.usable_hash().is_some())
            .cloned()
            .collect())
    }

    async fn pending_media(&self, limit: usize) -> Result<Vec<Media>, StoreError> {
        let mut pending: Vec<Media> = self
            .lock()
            .media
            .iter()
            .filter(|m| {
                m.image_hash.is_none() && matches!(m.media_type, MediaType::Image | MediaType::Gif)
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            b.post_collected_at
                .cmp(&a.post_collected_at)
                .then(b.id.cmp(&a.id))
        });
        pending.truncate(limit);
        Ok(pending)
    }

    async fn set_media_hash(&self, media_id: i64, hash: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        let media = state
            .media
            .iter_mut()
            .find(|m| m.id == media_id)
            .ok_or_else(|| StoreError::NotFound(format!("media {media_id}")))?;
        media.image_hash = Some(hash.to_string());
        Ok(())
    }

    async fn top_hashtag_permalinks(
        &self,
        tag: &str,
        platform: Platform,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let state = self.lock();
        let mut matching: Vec<&Post> = state
            .posts
            .iter()
            .filter(|p| {
                p.platform == platform
                    && in_window(p.collected_at, start, end)
                    && p.permalink.is_some()
                    && p
                        .hashtags
                        .iter()
                        .any(|h| normalize_hashtag(h).as_deref() == Some(tag))
            })
            .collect();
        matching.sort_by(|a, b| {
            b.engagement_score
                .total_cmp(&a.engagement_score)
                .then(a.id.cmp(&b.id))
        });
        Ok(matching
            .into_iter()
            .filter_map(|p| p.permalink.clone())
            .take(limit)
            .collect())
    }

    async fn top_comment_permalinks(
        &self,
        normalized_text: &str,
        platform: Platform,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let state = self.lock();
        let mut best: HashMap<&str, i64> = HashMap::new();
        for comment in &state.comments {
            if comment.platform != platform
                || !in_window(comment.collected_at, start, end)
                || comment.normalized_text.as_deref() != Some(normalized_text)
            {
                continue;
            }
            if let Some(permalink) = comment.post_permalink.as_deref() {
                let entry = best.entry(permalink).or_insert(comment.score);
                *entry = (*entry).max(comment.score);
            }
        }
        let mut ranked: Vec<(&str, i64)> = best.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(permalink, _)| permalink.to_string())
            .collect())
    }

    async fn recent_posts(
        &self,
        platform: Platform,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self
            .lock()
            .posts
            .iter()
            .filter(|p| p.platform == platform && p.collected_at >= since)
            .cloned()
            .collect();
        newest_first(&mut posts);
        posts.truncate(limit);
        Ok(posts)
    }

    async fn recent_posts_by_author(
        &self,
        platform: Platform,
        author: &str,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self
            .lock()
            .posts
            .iter()
            .filter(|p| p.platform == platform && p.author.as_deref() == Some(author))
            .cloned()
            .collect();
        newest_first(&mut posts);
        posts.truncate(limit);
        Ok(posts)
    }

    async fn top_comments_for_post(
        &self,
        post_id: i64,
        limit: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        let mut comments: Vec<Comment> = self
            .lock()
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        comments.truncate(limit);
        Ok(comments)
    }

    async fn upsert_term_stat(&self, stat: &TermStat) -> Result<(), StoreError> {
        let mut state = self.lock();
        let existing = state.term_stats.iter_mut().find(|s| {
            s.term == stat.term
                && s.term_type == stat.term_type
                && s.platform == stat.platform
                && s.bucket == stat.bucket
        });
        match existing {
            Some(row) => *row = stat.clone(),
            None => state.term_stats.push(stat.clone()),
        }
        Ok(())
    }

    async fn term_stats_in_bucket(
        &self,
        bucket: DateTime<Utc>,
    ) -> Result<Vec<TermStat>, StoreError> {
        Ok(self
            .lock()
            .term_stats
            .iter()
            .filter(|s| s.bucket == bucket)
            .cloned()
            .collect())
    }

    async fn term_stat_history(
        &self,
        key: &TermKey,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<TermStat>, StoreError> {
        let mut history: Vec<TermStat> = self
            .lock()
            .term_stats
            .iter()
            .filter(|s| {
                s.term == key.term
                    && s.term_type == key.term_type
                    && s.platform == key.platform
                    && in_window(s.bucket, from, until)
            })
            .cloned()
            .collect();
        history.sort_by_key(|s| s.bucket);
        Ok(history)
    }

    async fn term_stats_since(&self, since: DateTime<Utc>) -> Result<Vec<TermStat>, StoreError> {
        Ok(self
            .lock()
            .term_stats
            .iter()
            .filter(|s| s.bucket >= since)
            .cloned()
            .collect())
    }

    async fn insert_trend_candidate(
        &self,
        candidate: &NewTrendCandidate,
    ) -> Result<TrendCandidate, StoreError> {
        let mut state = self.lock();
        let stored = TrendCandidate {
            id: state.next_id(),
            term: candidate.term.clone(),
            term_type: candidate.term_type,
            platform: candidate.platform,
            detected_at: candidate.detected_at,
            current_frequency: candidate.current_frequency,
            baseline_frequency: candidate.baseline_frequency,
            acceleration_score: candidate.acceleration_score,
            z_score: candidate.z_score,
            total_engagement: candidate.total_engagement,
            distinct_authors: candidate.distinct_authors,
            base_trend_score: candidate.trend_score,
            trend_score: candidate.trend_score,
            cross_platform: false,
            platforms_seen: Vec::new(),
            example_refs: candidate.example_refs.clone(),
        };
        state.trend_candidates.push(stored.clone());
        Ok(stored)
    }

    async fn trend_candidates_for_term(
        &self,
        term: &str,
        term_type: TermType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TrendCandidate>, StoreError> {
        Ok(self
            .lock()
            .trend_candidates
            .iter()
            .filter(|c| {
                c.term == term
                    && c.term_type == term_type
                    && since.is_none_or(|s| c.detected_at >= s)
            })
            .cloned()
            .collect())
    }

    async fn apply_cross_platform_boost(
        &self,
        term: &str,
        term_type: TermType,
        platforms: &[Platform],
        multiplier: f64,
    ) -> Result<u64, StoreError> {
        let mut touched = 0;
        for candidate in self
            .lock()
            .trend_candidates
            .iter_mut()
            .filter(|c| c.term == term && c.term_type == term_type)
        {
            candidate.cross_platform = true;
            candidate.platforms_seen = platforms.to_vec();
            candidate.trend_score = candidate.base_trend_score * multiplier;
            touched += 1;
        }
        Ok(touched)
    }

    async fn recent_trend_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TrendCandidate>, StoreError> {
        let mut candidates: Vec<TrendCandidate> = self
            .lock()
            .trend_candidates
            .iter()
            .filter(|c| c.detected_at >= since)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.trend_score.total_cmp(&a.trend_score).then(a.id.cmp(&b.id)));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn get_or_create_creator(
        &self,
        handle: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<Creator, StoreError> {
        let mut state = self.lock();
        if let Some(existing) = state.creators.iter().find(|c| c.handle == handle) {
            return Ok(existing.clone());
        }
        let creator = Creator {
            id: state.next_id(),
            handle: handle.to_string(),
            follower_count: 0,
            first_seen_at: seen_at,
            last_updated_at: seen_at,
        };
        state.creators.push(creator.clone());
        Ok(creator)
    }

    async fn get_creator(&self, creator_id: i64) -> Result<Option<Creator>, StoreError> {
        Ok(self
            .lock()
            .creators
            .iter()
            .find(|c| c.id == creator_id)
            .cloned())
    }

    async fn latest_creator_stats(
        &self,
        creator_id: i64,
    ) -> Result<Option<CreatorStats>, StoreError> {
        Ok(self
            .lock()
            .creator_stats
            .iter()
            .filter(|s| s.creator_id == creator_id)
            .max_by(|a, b| a.computed_at.cmp(&b.computed_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn insert_creator_stats(
        &self,
        stats: &NewCreatorStats,
    ) -> Result<CreatorStats, StoreError> {
        let mut state = self.lock();
        let stored = CreatorStats {
            id: state.next_id(),
            creator_id: stats.creator_id,
            computed_at: stats.computed_at,
            videos_analyzed: stats.videos_analyzed,
            avg_views: stats.avg_views,
            median_views: stats.median_views,
            avg_engagement_rate: stats.avg_engagement_rate,
            avg_likes: stats.avg_likes,
            avg_comments: stats.avg_comments,
            avg_shares: stats.avg_shares,
        };
        state.creator_stats.push(stored.clone());
        Ok(stored)
    }

    async fn hot_video_for_post(&self, post_id: i64) -> Result<Option<HotVideo>, StoreError> {
        Ok(self
            .lock()
            .hot_videos
            .iter()
            .find(|v| v.post_id == post_id)
            .cloned())
    }

    async fn insert_hot_video(&self, video: &NewHotVideo) -> Result<HotVideo, StoreError> {
        let mut state = self.lock();
        if let Some(existing) = state.hot_videos.iter().find(|v| v.post_id == video.post_id) {
            return Ok(existing.clone());
        }
        let stored = HotVideo {
            id: state.next_id(),
            post_id: video.post_id,
            creator_id: video.creator_id,
            detected_at: video.detected_at,
            views: video.views,
            likes: video.likes,
            comments: video.comments,
            shares: video.shares,
            virality_ratio: video.virality_ratio,
            engagement_rate: video.engagement_rate,
            comment_intensity: video.comment_intensity,
            spike_factor: video.spike_factor,
            likes_to_views: video.likes_to_views,
            shares_to_likes: video.shares_to_likes,
            discourse_signal: video.discourse_signal,
            meme_seed_score: video.meme_seed_score,
        };
        state.hot_videos.push(stored.clone());
        Ok(stored)
    }

    async fn hot_videos_for_creator(
        &self,
        creator_id: i64,
        limit: usize,
    ) -> Result<Vec<HotVideo>, StoreError> {
        let mut videos: Vec<HotVideo> = self
            .lock()
            .hot_videos
            .iter()
            .filter(|v| v.creator_id == creator_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| {
            b.meme_seed_score
                .total_cmp(&a.meme_seed_score)
                .then(a.id.cmp(&b.id))
        });
        videos.truncate(limit);
        Ok(videos)
    }

    async fn watchlist_entry(
        &self,
        creator_id: i64,
    ) -> Result<Option<WatchlistEntry>, StoreError> {
        Ok(self
            .lock()
            .watchlist
            .iter()
            .find(|e| e.creator_id == creator_id)
            .cloned())
    }

    async fn save_watchlist_entry(&self, entry: &WatchlistEntry) -> Result<(), StoreError> {
        let mut state = self.lock();
        match state
            .watchlist
            .iter_mut()
            .find(|e| e.creator_id == entry.creator_id)
        {
            Some(existing) => {
                let first_qualified_at = existing.first_qualified_at;
                *existing = entry.clone();
                existing.first_qualified_at = first_qualified_at;
            }
            None => state.watchlist.push(entry.clone()),
        }
        Ok(())
    }

    async fn drop_stale_watchlist(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut dropped = 0;
        for entry in self
            .lock()
            .watchlist
            .iter_mut()
            .filter(|e| e.status == WatchlistStatus::Active && e.last_qualified_at < cutoff)
        {
            entry.status = WatchlistStatus::Dropped;
            dropped += 1;
        }
        Ok(dropped)
    }

    async fn list_watchlist(
        &self,
        status: Option<WatchlistStatus>,
        limit: usize,
    ) -> Result<Vec<WatchlistEntry>, StoreError> {
        let mut entries: Vec<WatchlistEntry> = self
            .lock()
            .watchlist
            .iter()
            .filter(|e| status.is_none_or(|s| e.status == s))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.max_meme_seed_score
                .total_cmp(&a.max_meme_seed_score)
                .then(a.creator_id.cmp(&b.creator_id))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    async fn comment_phrase(&self, phrase: &str) -> Result<Option<CommentPhrase>, StoreError> {
        Ok(self
            .lock()
            .comment_phrases
            .iter()
            .find(|p| p.phrase == phrase)
            .cloned())
    }

    async fn save_comment_phrase(&self, phrase: &CommentPhrase) -> Result<(), StoreError> {
        let mut state = self.lock();
        match state
            .comment_phrases
            .iter_mut()
            .find(|p| p.phrase == phrase.phrase)
        {
            Some(existing) => {
                let first_seen_at = existing.first_seen_at;
                *existing = phrase.clone();
                existing.first_seen_at = first_seen_at;
            }
            None => state.comment_phrases.push(phrase.clone()),
        }
        Ok(())
    }

    async fn trending_comment_phrases(
        &self,
        min_videos: i64,
        limit: usize,
    ) -> Result<Vec<CommentPhrase>, StoreError> {
        let mut phrases: Vec<CommentPhrase> = self
            .lock()
            .comment_phrases
            .iter()
            .filter(|p| p.video_count >= min_videos)
            .cloned()
            .collect();
        phrases.sort_by(|a, b| {
            b.video_count
                .cmp(&a.video_count)
                .then(b.total_occurrences.cmp(&a.total_occurrences))
                .then(a.phrase.cmp(&b.phrase))
        });
        phrases.truncate(limit);
        Ok(phrases)
    }
}
