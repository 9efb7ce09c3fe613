use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memeradar_core::{
    Comment, CommentPhrase, CoreError, Creator, CreatorStats, HotVideo, Media, NewCreatorStats,
    NewHotVideo, NewTrendCandidate, Platform, Post, TermKey, TermStat, TermType, TrendCandidate,
    WatchlistEntry, WatchlistStatus,
};
use sqlx::PgPool;

use super::ContentStore;
use crate::error::StoreError;

/// [`ContentStore`] over the `memeradar-db` query functions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = CoreError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl ContentStore for PgStore {
    async fn posts_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError> {
        convert_all(memeradar_db::list_posts_between(&self.pool, start, end).await?)
    }

    async fn comments_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Comment>, StoreError> {
        convert_all(memeradar_db::list_comments_between(&self.pool, start, end).await?)
    }

    async fn hashed_media_since(&self, since: DateTime<Utc>) -> Result<Vec<Media>, StoreError> {
        convert_all(memeradar_db::list_media_since(&self.pool, since).await?)
    }

    async fn pending_media(&self, limit: usize) -> Result<Vec<Media>, StoreError> {
        convert_all(memeradar_db::list_pending_media(&self.pool, sql_limit(limit)).await?)
    }

    async fn set_media_hash(&self, media_id: i64, hash: &str) -> Result<(), StoreError> {
        memeradar_db::set_media_hash(&self.pool, media_id, hash).await?;
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
        Ok(memeradar_db::top_hashtag_permalinks(
            &self.pool,
            tag,
            platform.as_str(),
            start,
            end,
            sql_limit(limit),
        )
        .await?)
    }

    async fn top_comment_permalinks(
        &self,
        normalized_text: &str,
        platform: Platform,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        Ok(memeradar_db::top_comment_permalinks(
            &self.pool,
            normalized_text,
            platform.as_str(),
            start,
            end,
            sql_limit(limit),
        )
        .await?)
    }

    async fn recent_posts(
        &self,
        platform: Platform,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        convert_all(
            memeradar_db::list_recent_posts(
                &self.pool,
                platform.as_str(),
                since,
                sql_limit(limit),
            )
            .await?,
        )
    }

    async fn recent_posts_by_author(
        &self,
        platform: Platform,
        author: &str,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        convert_all(
            memeradar_db::list_recent_posts_by_author(
                &self.pool,
                platform.as_str(),
                author,
                sql_limit(limit),
            )
            .await?,
        )
    }

    async fn top_comments_for_post(
        &self,
        post_id: i64,
        limit: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        convert_all(
            memeradar_db::list_top_comments_for_post(&self.pool, post_id, sql_limit(limit))
                .await?,
        )
    }

    async fn upsert_term_stat(&self, stat: &TermStat) -> Result<(), StoreError> {
        memeradar_db::upsert_term_stat(&self.pool, stat).await?;
        Ok(())
    }

    async fn term_stats_in_bucket(
        &self,
        bucket: DateTime<Utc>,
    ) -> Result<Vec<TermStat>, StoreError> {
        convert_all(memeradar_db::list_term_stats_in_bucket(&self.pool, bucket).await?)
    }

    async fn term_stat_history(
        &self,
        key: &TermKey,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<TermStat>, StoreError> {
        convert_all(
            memeradar_db::list_term_stat_history(
                &self.pool,
                &key.term,
                key.term_type.as_str(),
                key.platform.as_str(),
                from,
                until,
            )
            .await?,
        )
    }

    async fn term_stats_since(&self, since: DateTime<Utc>) -> Result<Vec<TermStat>, StoreError> {
        convert_all(memeradar_db::list_term_stats_since(&self.pool, since).await?)
    }

    async fn insert_trend_candidate(
        &self,
        candidate: &NewTrendCandidate,
    ) -> Result<TrendCandidate, StoreError> {
        let row = memeradar_db::insert_trend_candidate(&self.pool, candidate).await?;
        Ok(TrendCandidate::try_from(row)?)
    }

    async fn trend_candidates_for_term(
        &self,
        term: &str,
        term_type: TermType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TrendCandidate>, StoreError> {
        convert_all(
            memeradar_db::list_trend_candidates_for_term(
                &self.pool,
                term,
                term_type.as_str(),
                since,
            )
            .await?,
        )
    }

    async fn apply_cross_platform_boost(
        &self,
        term: &str,
        term_type: TermType,
        platforms: &[Platform],
        multiplier: f64,
    ) -> Result<u64, StoreError> {
        let platforms_seen = platforms
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Ok(memeradar_db::apply_cross_platform_boost(
            &self.pool,
            term,
            term_type.as_str(),
            &platforms_seen,
            multiplier,
        )
        .await?)
    }

    async fn recent_trend_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TrendCandidate>, StoreError> {
        convert_all(
            memeradar_db::list_recent_trend_candidates(&self.pool, since, sql_limit(limit))
                .await?,
        )
    }

    async fn get_or_create_creator(
        &self,
        handle: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<Creator, StoreError> {
        Ok(memeradar_db::get_or_create_creator(&self.pool, handle, seen_at)
            .await?
            .into())
    }

    async fn get_creator(&self, creator_id: i64) -> Result<Option<Creator>, StoreError> {
        Ok(memeradar_db::get_creator(&self.pool, creator_id)
            .await?
            .map(Creator::from))
    }

    async fn latest_creator_stats(
        &self,
        creator_id: i64,
    ) -> Result<Option<CreatorStats>, StoreError> {
        Ok(memeradar_db::get_latest_creator_stats(&self.pool, creator_id)
            .await?
            .map(CreatorStats::from))
    }

    async fn insert_creator_stats(
        &self,
        stats: &NewCreatorStats,
    ) -> Result<CreatorStats, StoreError> {
        Ok(memeradar_db::insert_creator_stats(&self.pool, stats)
            .await?
            .into())
    }

    async fn hot_video_for_post(&self, post_id: i64) -> Result<Option<HotVideo>, StoreError> {
        Ok(memeradar_db::get_hot_video_for_post(&self.pool, post_id)
            .await?
            .map(HotVideo::from))
    }

    async fn insert_hot_video(&self, video: &NewHotVideo) -> Result<HotVideo, StoreError> {
        Ok(memeradar_db::insert_hot_video(&self.pool, video).await?.into())
    }

    async fn hot_videos_for_creator(
        &self,
        creator_id: i64,
        limit: usize,
    ) -> Result<Vec<HotVideo>, StoreError> {
        Ok(
            memeradar_db::list_hot_videos_for_creator(&self.pool, creator_id, sql_limit(limit))
                .await?
                .into_iter()
                .map(HotVideo::from)
                .collect(),
        )
    }

    async fn watchlist_entry(
        &self,
        creator_id: i64,
    ) -> Result<Option<WatchlistEntry>, StoreError> {
        memeradar_db::get_watchlist_entry(&self.pool, creator_id)
            .await?
            .map(|row| WatchlistEntry::try_from(row).map_err(StoreError::from))
            .transpose()
    }

    async fn save_watchlist_entry(&self, entry: &WatchlistEntry) -> Result<(), StoreError> {
        memeradar_db::save_watchlist_entry(&self.pool, entry).await?;
        Ok(())
    }

    async fn drop_stale_watchlist(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(memeradar_db::drop_stale_watchlist_entries(&self.pool, cutoff).await?)
    }

    async fn list_watchlist(
        &self,
        status: Option<WatchlistStatus>,
        limit: usize,
    ) -> Result<Vec<WatchlistEntry>, StoreError> {
        convert_all(
            memeradar_db::list_watchlist(
                &self.pool,
                status.map(WatchlistStatus::as_str),
                sql_limit(limit),
            )
            .await?,
        )
    }

    async fn comment_phrase(&self, phrase: &str) -> Result<Option<CommentPhrase>, StoreError> {
        Ok(memeradar_db::get_comment_phrase(&self.pool, phrase)
            .await?
            .map(CommentPhrase::from))
    }

    async fn save_comment_phrase(&self, phrase: &CommentPhrase) -> Result<(), StoreError> {
        memeradar_db::save_comment_phrase(&self.pool, phrase).await?;
        Ok(())
    }

    async fn trending_comment_phrases(
        &self,
        min_videos: i64,
        limit: usize,
    ) -> Result<Vec<CommentPhrase>, StoreError> {
        Ok(
            memeradar_db::list_trending_comment_phrases(&self.pool, min_videos, sql_limit(limit))
                .await?
                .into_iter()
                .map(CommentPhrase::from)
                .collect(),
        )
    }
}
