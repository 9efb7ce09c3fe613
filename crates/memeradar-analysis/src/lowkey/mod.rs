//! Lowkey creator detection: small accounts with breakout videos.
//!
//! Each run scores the platform's recent videos against their creator's
//! own history, records qualifying videos as hot videos, moves creators
//! through the watchlist, and mines the comment sections of new hot videos
//! for repeated phrases.

pub mod comment_culture;
pub mod scorer;
pub mod stats;
pub mod watchlist;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use memeradar_core::{
    AnalysisConfig, Creator, HotVideo, LowkeyConfig, WatchlistEntry, WatchlistStatus,
};
use serde::Serialize;

use crate::error::StoreError;
use crate::store::ContentStore;

pub use comment_culture::CommentCultureAnalyzer;
pub use scorer::{LowkeyScorer, Rejection, VideoMetrics};

const TOP_CREATOR_VIDEOS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LowkeyRunSummary {
    pub videos_analyzed: usize,
    pub hot_videos_found: usize,
    pub creators_updated: usize,
    pub watchlist_additions: usize,
    pub phrases_detected: usize,
    pub watchlist_dropped: u64,
}

/// An active watchlist creator with their best videos.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCreator {
    pub creator: Creator,
    pub entry: WatchlistEntry,
    pub hot_videos: Vec<HotVideo>,
}

#[derive(Debug, Clone)]
pub struct LowkeyAnalyzer {
    config: LowkeyConfig,
    scorer: LowkeyScorer,
    culture: CommentCultureAnalyzer,
}

impl LowkeyAnalyzer {
    #[must_use]
    pub fn new(config: &AnalysisConfig) -> Self {
        let lowkey = config.lowkey.clone();
        Self {
            scorer: LowkeyScorer::new(lowkey.clone()),
            culture: CommentCultureAnalyzer::new(lowkey.comments_per_video),
            config: lowkey,
        }
    }

    /// One full detection pass over the analysis window ending at `now`.
    ///
    /// Rolling stats are refreshed after scoring so this run's videos are
    /// judged against the previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on any read or write failure.
    pub async fn run(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<LowkeyRunSummary, StoreError> {
        let since = now - Duration::hours(i64::from(self.config.analysis_window_hours));
        let posts = store
            .recent_posts(self.config.platform, since, self.config.max_videos_per_run)
            .await?;

        let mut summary = LowkeyRunSummary {
            videos_analyzed: posts.len(),
            ..LowkeyRunSummary::default()
        };
        let mut qualifying_creators: BTreeMap<i64, String> = BTreeMap::new();
        let mut new_videos: Vec<HotVideo> = Vec::new();

        for post in &posts {
            let Some(author) = post.author.as_deref().filter(|a| !a.is_empty()) else {
                continue;
            };
            let creator = store.get_or_create_creator(author, now).await?;
            let baseline = store.latest_creator_stats(creator.id).await?;

            let metrics = match self.scorer.qualify(post, &creator, baseline.as_ref()) {
                Ok(metrics) => metrics,
                Err(rejection) => {
                    tracing::debug!(
                        post_id = post.id,
                        creator = %creator.handle,
                        ?rejection,
                        "video did not qualify"
                    );
                    continue;
                }
            };

            summary.hot_videos_found += 1;
            qualifying_creators.insert(creator.id, creator.handle.clone());

            if store.hot_video_for_post(post.id).await?.is_some() {
                continue;
            }
            let video = store
                .insert_hot_video(&self.scorer.hot_video(post, &creator, &metrics, now))
                .await?;
            tracing::info!(
                creator = %creator.handle,
                likes = video.likes,
                spike_factor = video.spike_factor,
                meme_seed_score = video.meme_seed_score,
                "hot video detected"
            );

            let existing = store.watchlist_entry(creator.id).await?;
            let (entry, added) = watchlist::apply_qualification(existing, &video, now);
            store.save_watchlist_entry(&entry).await?;
            if added {
                summary.watchlist_additions += 1;
            }
            new_videos.push(video);
        }

        for (creator_id, handle) in &qualifying_creators {
            let history = store
                .recent_posts_by_author(
                    self.config.platform,
                    handle,
                    self.config.history_video_count,
                )
                .await?;
            if let Some(stats) = stats::compute_creator_stats(*creator_id, &history, now) {
                store.insert_creator_stats(&stats).await?;
                summary.creators_updated += 1;
            }
        }

        for video in &new_videos {
            let phrases = self.culture.analyze_video(store, video.post_id, now).await?;
            summary.phrases_detected += phrases.len();
        }

        summary.watchlist_dropped = store
            .drop_stale_watchlist(watchlist::stale_cutoff(now, self.config.watchlist_drop_days))
            .await?;

        tracing::info!(
            videos_analyzed = summary.videos_analyzed,
            hot_videos = summary.hot_videos_found,
            watchlist_additions = summary.watchlist_additions,
            watchlist_dropped = summary.watchlist_dropped,
            "lowkey detection complete"
        );
        Ok(summary)
    }

    /// Active watchlist creators by best meme-seed score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on any read failure.
    pub async fn top_creators(
        &self,
        store: &dyn ContentStore,
        limit: usize,
    ) -> Result<Vec<TopCreator>, StoreError> {
        let entries = store
            .list_watchlist(Some(WatchlistStatus::Active), limit)
            .await?;

        let mut creators = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(creator) = store.get_creator(entry.creator_id).await? else {
                continue;
            };
            let hot_videos = store
                .hot_videos_for_creator(creator.id, TOP_CREATOR_VIDEOS)
                .await?;
            creators.push(TopCreator {
                creator,
                entry,
                hot_videos,
            });
        }
        Ok(creators)
    }
}

#[cfg(test)]
#[path = "../lowkey_test.rs"]
mod tests;
