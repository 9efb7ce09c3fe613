//! Tunable thresholds for every detector.
//!
//! Each section has a `Default` carrying the production defaults, so a
//! missing override never prevents a cycle from running.

use crate::Platform;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Width of one aggregation bucket.
    pub bucket_minutes: u32,
    /// Number of prior buckets forming the trend baseline.
    pub history_buckets: u32,
    pub trend: TrendThresholds,
    pub comment_memes: CommentMemeConfig,
    pub templates: TemplateConfig,
    pub cross_platform: CrossPlatformConfig,
    pub lowkey: LowkeyConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: 30,
            history_buckets: 6,
            trend: TrendThresholds::default(),
            comment_memes: CommentMemeConfig::default(),
            templates: TemplateConfig::default(),
            cross_platform: CrossPlatformConfig::default(),
            lowkey: LowkeyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendThresholds {
    pub min_frequency: i64,
    pub min_engagement: f64,
    pub z_score_threshold: f64,
    pub acceleration_threshold: f64,
    pub min_unique_users: i64,
    /// Example permalinks attached to each candidate.
    pub example_limit: usize,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            min_frequency: 10,
            min_engagement: 5.0,
            z_score_threshold: 2.0,
            acceleration_threshold: 3.0,
            min_unique_users: 2,
            example_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentMemeConfig {
    pub lookback_hours: u32,
    /// Minimum normalized length in bytes.
    pub min_text_len: usize,
    pub min_distinct_posts: usize,
    pub min_distinct_authors: usize,
    pub max_candidates: usize,
    pub max_samples: usize,
}

impl Default for CommentMemeConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 2,
            min_text_len: 10,
            min_distinct_posts: 5,
            min_distinct_authors: 3,
            max_candidates: 100,
            max_samples: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateConfig {
    pub lookback_hours: u32,
    pub min_occurrences: usize,
    pub max_candidates: usize,
    /// Two hashes within this Hamming distance are the same template.
    pub hamming_threshold: u32,
    /// Media hashed per cycle.
    pub hash_batch_size: usize,
    pub hash_concurrency: usize,
    pub download_timeout_secs: u64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 2,
            min_occurrences: 3,
            max_candidates: 50,
            hamming_threshold: 10,
            hash_batch_size: 100,
            hash_concurrency: 4,
            download_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossPlatformConfig {
    pub lookback_hours: u32,
    pub min_platforms: usize,
    pub max_terms: usize,
}

impl Default for CrossPlatformConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 2,
            min_platforms: 2,
            max_terms: 100,
        }
    }
}

/// Independent contribution weights for the meme-seed score. They need not
/// sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWeights {
    pub virality_ratio: f64,
    pub engagement_rate: f64,
    pub comment_intensity: f64,
    pub spike_factor: f64,
    pub repeated_phrases: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            virality_ratio: 0.25,
            engagement_rate: 0.20,
            comment_intensity: 0.20,
            spike_factor: 0.20,
            repeated_phrases: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LowkeyConfig {
    pub enabled: bool,
    pub platform: Platform,
    pub max_followers: i64,
    pub min_likes: i64,
    /// Views assumed per like when the platform reports none.
    pub views_per_like: i64,
    pub min_spike_factor: f64,
    /// Comment intensity at or above which a low likes-to-views video is
    /// flagged as discourse.
    pub min_comment_intensity: f64,
    pub history_video_count: usize,
    pub analysis_window_hours: u32,
    pub max_videos_per_run: usize,
    pub comments_per_video: usize,
    pub watchlist_drop_days: u32,
    pub weights: ScoreWeights,
}

impl Default for LowkeyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            platform: Platform::Tiktok,
            max_followers: 300_000,
            min_likes: 100_000,
            views_per_like: 15,
            min_spike_factor: 3.0,
            min_comment_intensity: 0.02,
            history_video_count: 10,
            analysis_window_hours: 48,
            max_videos_per_run: 500,
            comments_per_video: 50,
            watchlist_drop_days: 30,
            weights: ScoreWeights::default(),
        }
    }
}
