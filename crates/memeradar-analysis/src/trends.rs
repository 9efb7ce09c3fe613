//! Baseline comparison for the current bucket's term statistics.

use chrono::{DateTime, Utc};
use memeradar_core::{
    AnalysisConfig, NewTrendCandidate, Post, TermStat, TermType, TrendCandidate, TrendThresholds,
};

use crate::bucket::BucketClock;
use crate::error::StoreError;
use crate::phrases::PhraseExtractor;
use crate::store::ContentStore;

/// Statistical comparison of one term against its own history.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendMetrics {
    pub current_frequency: i64,
    pub baseline_frequency: f64,
    pub baseline_std: f64,
    pub acceleration_score: f64,
    pub z_score: f64,
    pub total_engagement: f64,
    pub distinct_authors: i64,
}

impl TrendMetrics {
    /// Compare `current` with the prior buckets of the same series.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(current: &TermStat, history: &[TermStat]) -> Self {
        let current_frequency = current.frequency();
        let frequencies: Vec<f64> = history.iter().map(|s| s.frequency() as f64).collect();

        let baseline_frequency = if frequencies.is_empty() {
            0.0
        } else {
            frequencies.iter().sum::<f64>() / frequencies.len() as f64
        };
        // Fewer than two points has no sample deviation; 1.0 keeps z meaningful.
        let baseline_std = if frequencies.len() < 2 {
            1.0
        } else {
            let variance = frequencies
                .iter()
                .map(|f| (f - baseline_frequency).powi(2))
                .sum::<f64>()
                / (frequencies.len() - 1) as f64;
            variance.sqrt()
        };

        let frequency = current_frequency as f64;
        let acceleration_score = (frequency + 1.0) / (baseline_frequency + 1.0);
        let z_score = if baseline_std > 0.0 {
            (frequency - baseline_frequency) / baseline_std
        } else {
            frequency - baseline_frequency
        };

        Self {
            current_frequency,
            baseline_frequency,
            baseline_std,
            acceleration_score,
            z_score,
            total_engagement: current.sum_engagement,
            distinct_authors: current.distinct_authors,
        }
    }

    /// Fixed linear blend; only comparable within one run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn trend_score(&self) -> f64 {
        self.acceleration_score * 0.4
            + self.z_score * 0.3
            + (self.total_engagement / 100.0) * 0.2
            + (self.distinct_authors as f64 / 10.0) * 0.1
    }
}

#[derive(Debug, Clone)]
pub struct TrendDetector {
    clock: BucketClock,
    history_buckets: u32,
    thresholds: TrendThresholds,
    extractor: PhraseExtractor,
}

impl TrendDetector {
    #[must_use]
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            clock: BucketClock::new(config.bucket_minutes),
            history_buckets: config.history_buckets,
            thresholds: config.trend.clone(),
            extractor: PhraseExtractor::new(),
        }
    }

    #[must_use]
    pub fn is_trending(&self, metrics: &TrendMetrics) -> bool {
        let t = &self.thresholds;
        metrics.distinct_authors >= t.min_unique_users
            && metrics.current_frequency >= t.min_frequency
            && (metrics.z_score >= t.z_score_threshold
                || metrics.acceleration_score >= t.acceleration_threshold)
            && metrics.total_engagement >= t.min_engagement
    }

    /// Find trending terms in the bucket containing `now`, strongest
    /// (acceleration times z-score) first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if statistics or example references cannot be read.
    pub async fn detect(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<Vec<NewTrendCandidate>, StoreError> {
        let bucket = self.clock.bucket_start(now);
        let history_start = self.clock.history_start(bucket, self.history_buckets);
        let current_stats = store.term_stats_in_bucket(bucket).await?;

        let mut trending: Vec<(TermStat, TrendMetrics)> = Vec::new();
        for stat in current_stats {
            if stat.frequency() < self.thresholds.min_frequency {
                continue;
            }
            let history = store
                .term_stat_history(&stat.key(), history_start, bucket)
                .await?;
            let metrics = TrendMetrics::compute(&stat, &history);
            if self.is_trending(&metrics) {
                tracing::debug!(
                    term = %stat.term,
                    platform = %stat.platform,
                    acceleration = metrics.acceleration_score,
                    z_score = metrics.z_score,
                    "term is trending"
                );
                trending.push((stat, metrics));
            }
        }

        trending.sort_by(|a, b| {
            let strength = |m: &TrendMetrics| m.acceleration_score * m.z_score;
            strength(&b.1).total_cmp(&strength(&a.1))
        });

        let mut bucket_posts: Option<Vec<Post>> = None;
        let mut candidates = Vec::with_capacity(trending.len());
        for (stat, metrics) in trending {
            let example_refs = self
                .example_refs(store, &stat, &mut bucket_posts)
                .await?;
            candidates.push(NewTrendCandidate {
                term: stat.term,
                term_type: stat.term_type,
                platform: stat.platform,
                detected_at: now,
                current_frequency: metrics.current_frequency,
                baseline_frequency: metrics.baseline_frequency,
                acceleration_score: metrics.acceleration_score,
                z_score: metrics.z_score,
                total_engagement: metrics.total_engagement,
                distinct_authors: metrics.distinct_authors,
                trend_score: metrics.trend_score(),
                example_refs,
            });
        }

        tracing::info!(bucket = %bucket, trending = candidates.len(), "trend detection complete");
        Ok(candidates)
    }

    /// Persist candidates in order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any insert fails.
    pub async fn save(
        &self,
        store: &dyn ContentStore,
        candidates: &[NewTrendCandidate],
    ) -> Result<Vec<TrendCandidate>, StoreError> {
        let mut saved = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            saved.push(store.insert_trend_candidate(candidate).await?);
        }
        Ok(saved)
    }

    /// Permalinks for the highest-engagement posts or comments carrying the term.
    async fn example_refs(
        &self,
        store: &dyn ContentStore,
        stat: &TermStat,
        bucket_posts: &mut Option<Vec<Post>>,
    ) -> Result<Vec<String>, StoreError> {
        let limit = self.thresholds.example_limit;
        let start = stat.bucket;
        let end = self.clock.bucket_end(start);

        match stat.term_type {
            TermType::Hashtag => {
                store
                    .top_hashtag_permalinks(&stat.term, stat.platform, start, end, limit)
                    .await
            }
            TermType::Phrase => {
                let refs = store
                    .top_comment_permalinks(&stat.term, stat.platform, start, end, limit)
                    .await?;
                if !refs.is_empty() {
                    return Ok(refs);
                }
                // Caption phrases have no comment matches; fall back to the posts.
                if bucket_posts.is_none() {
                    *bucket_posts = Some(store.posts_between(start, end).await?);
                }
                let posts = bucket_posts.as_deref().unwrap_or_default();
                Ok(self.caption_refs(posts, stat, limit))
            }
            TermType::ImageHash => Ok(Vec::new()),
        }
    }

    fn caption_refs(&self, posts: &[Post], stat: &TermStat, limit: usize) -> Vec<String> {
        let mut matching: Vec<&Post> = posts
            .iter()
            .filter(|p| p.platform == stat.platform && p.permalink.is_some())
            .filter(|p| {
                p.text.as_deref().is_some_and(|text| {
                    let cleaned = format!(" {} ", self.extractor.clean_words(text).join(" "));
                    cleaned.contains(&format!(" {} ", stat.term))
                })
            })
            .collect();
        matching.sort_by(|a, b| b.engagement_score.total_cmp(&a.engagement_score));
        matching
            .into_iter()
            .filter_map(|p| p.permalink.clone())
            .take(limit)
            .collect()
    }
}
