//! Per-video qualification and meme-seed scoring.

use chrono::{DateTime, Utc};
use memeradar_core::{Creator, CreatorStats, LowkeyConfig, NewHotVideo, Post, ScoreWeights};
use serde_json::Value;

/// Metadata keys carrying a view count, in priority order.
const VIEW_KEYS: &[&str] = &["play_count", "views", "playCount"];
/// Engagement divisor standing in for reach when followers are unknown.
const UNKNOWN_FOLLOWER_SCALE: f64 = 10_000.0;
/// Likes-to-views below this with heavy commenting reads as argument, not applause.
const DISCOURSE_LIKES_TO_VIEWS: f64 = 0.02;

/// Why a video did not qualify.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    BelowMinLikes { likes: i64 },
    TooManyFollowers { followers: i64 },
    NoSpike { spike_factor: f64 },
}

/// Raw counts and derived ratios for a qualifying video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetrics {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub virality_ratio: f64,
    pub engagement_rate: f64,
    pub comment_intensity: f64,
    pub spike_factor: f64,
}

impl VideoMetrics {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn likes_to_views(&self) -> f64 {
        if self.views > 0 {
            self.likes as f64 / self.views as f64
        } else {
            0.0
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn shares_to_likes(&self) -> f64 {
        if self.likes > 0 {
            self.shares as f64 / self.likes as f64
        } else {
            0.0
        }
    }
}

/// First positive view count found in the platform metadata.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn explicit_views(metadata: &Value) -> Option<i64> {
    VIEW_KEYS.iter().find_map(|key| {
        let value = metadata.get(key)?;
        let views = value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))?;
        (views > 0).then_some(views)
    })
}

/// Explicit views, else an estimate from likes, else zero.
#[must_use]
pub fn resolve_views(post: &Post, views_per_like: i64) -> i64 {
    match explicit_views(&post.metadata) {
        Some(views) => views,
        None if post.likes > 0 => post.likes.saturating_mul(views_per_like),
        None => 0,
    }
}

#[derive(Debug, Clone)]
pub struct LowkeyScorer {
    config: LowkeyConfig,
}

impl LowkeyScorer {
    #[must_use]
    pub fn new(config: LowkeyConfig) -> Self {
        Self { config }
    }

    /// Run the qualification gates for one video.
    ///
    /// `baseline` is the creator's latest rolling snapshot. Without one, or
    /// with zero average likes, the spike gate is skipped and the spike
    /// factor is 1.0.
    ///
    /// # Errors
    ///
    /// Returns the first [`Rejection`] the video hits.
    #[allow(clippy::cast_precision_loss)]
    pub fn qualify(
        &self,
        post: &Post,
        creator: &Creator,
        baseline: Option<&CreatorStats>,
    ) -> Result<VideoMetrics, Rejection> {
        let views = resolve_views(post, self.config.views_per_like);
        let likes = post.likes;
        let comments = post.comments_count;
        let shares = post.shares;

        if likes < self.config.min_likes {
            return Err(Rejection::BelowMinLikes { likes });
        }
        if creator.followers_known() && creator.follower_count > self.config.max_followers {
            return Err(Rejection::TooManyFollowers {
                followers: creator.follower_count,
            });
        }

        let interactions = (likes + comments + shares) as f64;
        let virality_ratio = if creator.followers_known() {
            views as f64 / creator.follower_count as f64
        } else {
            interactions / UNKNOWN_FOLLOWER_SCALE
        };

        let (engagement_rate, comment_intensity) = if views > 0 {
            (interactions / views as f64, comments as f64 / views as f64)
        } else {
            let per_like = comments as f64 / likes.max(1) as f64;
            (per_like, per_like)
        };

        let average_likes = baseline.map_or(0.0, |s| s.avg_likes);
        let spike_factor = if average_likes > 0.0 {
            likes as f64 / average_likes
        } else {
            1.0
        };
        if average_likes > 0.0 && spike_factor < self.config.min_spike_factor {
            return Err(Rejection::NoSpike { spike_factor });
        }

        Ok(VideoMetrics {
            views,
            likes,
            comments,
            shares,
            virality_ratio,
            engagement_rate,
            comment_intensity,
            spike_factor,
        })
    }

    /// Weighted blend of capped, normalized sub-scores.
    #[must_use]
    pub fn meme_seed_score(&self, metrics: &VideoMetrics, phrase_score: f64) -> f64 {
        let ScoreWeights {
            virality_ratio,
            engagement_rate,
            comment_intensity,
            spike_factor,
            repeated_phrases,
        } = self.config.weights;

        let virality = ((metrics.virality_ratio + 1.0).log10() / 2.0).min(1.0);
        let engagement = (metrics.engagement_rate / 0.20).min(1.0);
        let intensity = (metrics.comment_intensity / 0.05).min(1.0);
        let spike = ((metrics.spike_factor + 1.0).log10() / 1.5).min(1.0);
        let phrases = phrase_score.min(1.0);

        virality * virality_ratio
            + engagement * engagement_rate
            + intensity * comment_intensity
            + spike * spike_factor
            + phrases * repeated_phrases
    }

    #[must_use]
    pub fn hot_video(
        &self,
        post: &Post,
        creator: &Creator,
        metrics: &VideoMetrics,
        detected_at: DateTime<Utc>,
    ) -> NewHotVideo {
        let likes_to_views = metrics.likes_to_views();
        NewHotVideo {
            post_id: post.id,
            creator_id: creator.id,
            detected_at,
            views: metrics.views,
            likes: metrics.likes,
            comments: metrics.comments,
            shares: metrics.shares,
            virality_ratio: metrics.virality_ratio,
            engagement_rate: metrics.engagement_rate,
            comment_intensity: metrics.comment_intensity,
            spike_factor: metrics.spike_factor,
            likes_to_views,
            shares_to_likes: metrics.shares_to_likes(),
            discourse_signal: metrics.comment_intensity >= self.config.min_comment_intensity
                && likes_to_views < DISCOURSE_LIKES_TO_VIEWS,
            meme_seed_score: self.meme_seed_score(metrics, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use memeradar_core::Platform;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn post(likes: i64, comments: i64, shares: i64, metadata: Value) -> Post {
        Post {
            id: 7,
            platform: Platform::Tiktok,
            external_id: "7".to_string(),
            author: Some("smallcreator".to_string()),
            created_at: None,
            collected_at: at(),
            text: None,
            permalink: None,
            likes,
            shares,
            comments_count: comments,
            engagement_score: 0.0,
            upvote_ratio: None,
            subreddit: None,
            hashtags: Vec::new(),
            metadata,
        }
    }

    fn creator(follower_count: i64) -> Creator {
        Creator {
            id: 1,
            handle: "smallcreator".to_string(),
            follower_count,
            first_seen_at: at(),
            last_updated_at: at(),
        }
    }

    fn baseline(avg_likes: f64) -> CreatorStats {
        CreatorStats {
            id: 1,
            creator_id: 1,
            computed_at: at(),
            videos_analyzed: 10,
            avg_views: 0.0,
            median_views: 0.0,
            avg_engagement_rate: 0.0,
            avg_likes,
            avg_comments: 0.0,
            avg_shares: 0.0,
        }
    }

    fn scorer() -> LowkeyScorer {
        LowkeyScorer::new(LowkeyConfig::default())
    }

    #[test]
    fn view_keys_are_checked_in_priority_order() {
        assert_eq!(explicit_views(&json!({"views": 10, "play_count": 20})), Some(20));
        assert_eq!(explicit_views(&json!({"play_count": 0, "views": 30})), Some(30));
        assert_eq!(explicit_views(&json!({"playCount": "4500"})), Some(4500));
        assert_eq!(explicit_views(&json!({"other": 1})), None);
        assert_eq!(explicit_views(&Value::Null), None);
    }

    #[test]
    fn missing_views_are_estimated_from_likes() {
        assert_eq!(resolve_views(&post(150_000, 0, 0, Value::Null), 15), 2_250_000);
        assert_eq!(resolve_views(&post(0, 0, 0, Value::Null), 15), 0);
    }

    #[test]
    fn small_creator_with_estimated_views_qualifies() {
        let metrics = scorer()
            .qualify(&post(150_000, 9_000, 3_000, Value::Null), &creator(50_000), None)
            .unwrap();
        assert_eq!(metrics.views, 2_250_000);
        assert!((metrics.virality_ratio - 45.0).abs() < 1e-9);
        assert!((metrics.engagement_rate - 0.072).abs() < 1e-9);
        assert!((metrics.comment_intensity - 0.004).abs() < 1e-9);
        assert!((metrics.spike_factor - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn likes_floor_and_follower_ceiling_reject() {
        let s = scorer();
        assert_eq!(
            s.qualify(&post(99_999, 0, 0, Value::Null), &creator(1_000), None),
            Err(Rejection::BelowMinLikes { likes: 99_999 })
        );
        assert_eq!(
            s.qualify(&post(200_000, 0, 0, Value::Null), &creator(300_001), None),
            Err(Rejection::TooManyFollowers { followers: 300_001 })
        );
    }

    #[test]
    fn unknown_followers_use_engagement_proxy() {
        let metrics = scorer()
            .qualify(&post(120_000, 6_000, 4_000, Value::Null), &creator(0), None)
            .unwrap();
        assert!((metrics.virality_ratio - 13.0).abs() < 1e-9);
    }

    #[test]
    fn spike_gate_applies_only_with_baseline() {
        let s = scorer();
        let p = post(150_000, 0, 0, Value::Null);
        let c = creator(50_000);
        assert!(matches!(
            s.qualify(&p, &c, Some(&baseline(100_000.0))),
            Err(Rejection::NoSpike { .. })
        ));
        let metrics = s.qualify(&p, &c, Some(&baseline(30_000.0))).unwrap();
        assert!((metrics.spike_factor - 5.0).abs() < 1e-9);
        assert!(s.qualify(&p, &c, Some(&baseline(0.0))).is_ok());
    }

    #[test]
    fn meme_seed_score_blends_capped_components() {
        let s = scorer();
        let metrics = s
            .qualify(&post(150_000, 9_000, 3_000, Value::Null), &creator(50_000), None)
            .unwrap();
        let expected = 46.0_f64.log10() / 2.0 * 0.25
            + 0.36 * 0.20
            + 0.08 * 0.20
            + 2.0_f64.log10() / 1.5 * 0.20;
        assert!((s.meme_seed_score(&metrics, 0.0) - expected).abs() < 1e-9);

        let maxed = VideoMetrics {
            views: 1,
            likes: 1,
            comments: 1,
            shares: 1,
            virality_ratio: 1e6,
            engagement_rate: 5.0,
            comment_intensity: 5.0,
            spike_factor: 1e6,
        };
        assert!((s.meme_seed_score(&maxed, 3.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn discourse_signal_needs_comments_without_likes() {
        let s = scorer();
        let p = post(100_000, 200_000, 0, json!({"views": 10_000_000}));
        let metrics = s.qualify(&p, &creator(10_000), None).unwrap();
        let video = s.hot_video(&p, &creator(10_000), &metrics, at());
        assert!((video.likes_to_views - 0.01).abs() < 1e-12);
        assert!(video.discourse_signal);

        let applause = post(150_000, 1_000, 3_000, Value::Null);
        let metrics = s.qualify(&applause, &creator(10_000), None).unwrap();
        let video = s.hot_video(&applause, &creator(10_000), &metrics, at());
        assert!(!video.discourse_signal);
        assert!((video.shares_to_likes - 0.02).abs() < 1e-12);
    }
}
