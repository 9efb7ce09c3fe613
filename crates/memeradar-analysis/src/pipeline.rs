//! One analysis cycle, run after each collection pass.

use chrono::{DateTime, Utc};
use memeradar_core::{AnalysisConfig, TrendCandidate};
use serde::Serialize;

use crate::aggregator::TermAggregator;
use crate::bucket::BucketClock;
use crate::comment_memes::{CommentMeme, CommentMemeDetector};
use crate::correlator::{CrossPlatformCorrelator, CrossPlatformTrend};
use crate::error::AnalysisError;
use crate::lowkey::{LowkeyAnalyzer, LowkeyRunSummary};
use crate::noise::NoiseFilter;
use crate::store::ContentStore;
use crate::templates::{HashBatchReport, ImageTemplate, TemplateDetector};
use crate::trends::TrendDetector;

/// Everything one cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub bucket: DateTime<Utc>,
    pub term_stats_written: usize,
    /// Trending before noise suppression.
    pub trends_detected: usize,
    pub trends: Vec<TrendCandidate>,
    pub comment_memes: Vec<CommentMeme>,
    pub media_hashing: HashBatchReport,
    pub templates: Vec<ImageTemplate>,
    pub cross_platform: Vec<CrossPlatformTrend>,
    pub candidates_boosted: u64,
    pub lowkey: Option<LowkeyRunSummary>,
}

/// Detectors built once from configuration and reused every cycle.
#[derive(Debug, Clone)]
pub struct Pipeline {
    clock: BucketClock,
    aggregator: TermAggregator,
    trends: TrendDetector,
    noise: NoiseFilter,
    comment_memes: CommentMemeDetector,
    templates: TemplateDetector,
    correlator: CrossPlatformCorrelator,
    lowkey: Option<LowkeyAnalyzer>,
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] for a zero-width bucket, or
    /// [`AnalysisError::Http`] if the image download client cannot be built.
    pub fn new(config: &AnalysisConfig, noise: NoiseFilter) -> Result<Self, AnalysisError> {
        if config.bucket_minutes == 0 {
            return Err(AnalysisError::Config(
                "bucket width must be at least one minute".to_string(),
            ));
        }
        let clock = BucketClock::new(config.bucket_minutes);
        Ok(Self {
            clock,
            aggregator: TermAggregator::new(clock),
            trends: TrendDetector::new(config),
            noise,
            comment_memes: CommentMemeDetector::new(config),
            templates: TemplateDetector::new(config)?,
            correlator: CrossPlatformCorrelator::new(config),
            lowkey: config.lowkey.enabled.then(|| LowkeyAnalyzer::new(config)),
        })
    }

    /// Run every detector for the bucket containing `now`.
    ///
    /// 1. Aggregate the bucket's posts and comments into term statistics.
    /// 2. Detect trending terms against their baselines.
    /// 3. Drop noise, then persist the surviving candidates.
    /// 4. Detect comment memes.
    /// 5. Hash a batch of pending media, then detect image templates.
    /// 6. Correlate terms across platforms and boost their candidates.
    /// 7. Score lowkey creators, when enabled.
    ///
    /// Cross-platform boosting must follow step 3 since it rewrites the
    /// candidates saved there.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Store`] if the content store fails. Image
    /// download failures are logged and never abort the cycle.
    pub async fn run_cycle(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<CycleReport, AnalysisError> {
        let bucket = self.clock.bucket_start(now);
        tracing::info!(bucket = %bucket, "analysis cycle started");

        let stats = self.aggregator.aggregate(store, now).await?;

        let detected = self.trends.detect(store, now).await?;
        let trends_detected = detected.len();
        let kept = self.noise.filter(detected);
        let trends = self.trends.save(store, &kept).await?;

        let comment_memes = self.comment_memes.detect(store, now, None).await?;

        let media_hashing = self.templates.hash_pending(store).await?;
        let templates = self.templates.detect(store, now).await?;

        let cross_platform = self.correlator.analyze(store, now).await?;
        let candidates_boosted = self.correlator.apply_boosts(store, &cross_platform).await?;

        let lowkey = match &self.lowkey {
            Some(analyzer) => Some(analyzer.run(store, now).await?),
            None => None,
        };

        tracing::info!(
            bucket = %bucket,
            term_stats = stats.len(),
            trends_detected,
            trends_saved = trends.len(),
            comment_memes = comment_memes.len(),
            templates = templates.len(),
            cross_platform = cross_platform.len(),
            candidates_boosted,
            "analysis cycle complete"
        );

        Ok(CycleReport {
            bucket,
            term_stats_written: stats.len(),
            trends_detected,
            trends,
            comment_memes,
            media_hashing,
            templates,
            cross_platform,
            candidates_boosted,
            lowkey,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use memeradar_core::{Platform, Post, TermStat, TermType};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 20, 0).unwrap()
    }

    fn post(id: i64, platform: Platform, author: String, tags: &[&str]) -> Post {
        Post {
            id,
            platform,
            external_id: id.to_string(),
            author: Some(author),
            created_at: None,
            collected_at: now() - Duration::minutes(5),
            text: None,
            permalink: Some(format!("https://{platform}.test/p/{id}")),
            likes: 10,
            shares: 0,
            comments_count: 0,
            engagement_score: 10.0,
            upvote_ratio: None,
            subreddit: None,
            hashtags: tags.iter().map(ToString::to_string).collect(),
            metadata: serde_json::Value::Null,
        }
    }

    async fn seed_history(store: &MemoryStore, term: &str, platform: Platform) {
        for (hours_back, count) in [(3, 3), (2, 7), (1, 5)] {
            store
                .upsert_term_stat(&TermStat {
                    term: term.to_string(),
                    term_type: TermType::Hashtag,
                    platform,
                    bucket: Utc.with_ymd_and_hms(2026, 5, 1, 12 - hours_back, 0, 0).unwrap(),
                    count_posts: count,
                    count_comments: 0,
                    sum_engagement: 30.0,
                    distinct_authors: 3,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn cycle_detects_saves_and_boosts_a_spreading_hashtag() {
        let store = MemoryStore::new();
        let mut id = 0;
        for platform in [Platform::Instagram, Platform::Twitter] {
            seed_history(&store, "cats", platform).await;
            seed_history(&store, "fyp", platform).await;
            for n in 0..20 {
                id += 1;
                store.add_post(post(id, platform, format!("user{n}"), &["cats", "fyp"]));
            }
        }

        let pipeline = Pipeline::new(&AnalysisConfig::default(), NoiseFilter::default()).unwrap();
        let report = pipeline.run_cycle(&store, now()).await.unwrap();

        assert_eq!(report.bucket, Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap());
        assert!(report.lowkey.is_none());
        assert_eq!(report.trends.len(), 2, "fyp is evergreen noise");
        assert!(report.trends_detected > report.trends.len());
        assert!(report.trends.iter().all(|t| t.term == "cats"));
        assert_eq!(report.trends[0].example_refs.len(), 5);

        let cats = report
            .cross_platform
            .iter()
            .find(|t| t.term == "cats")
            .unwrap();
        assert_eq!(cats.platform_count(), 2);
        assert!(report.candidates_boosted >= 2);

        for candidate in store.trend_candidates().iter().filter(|c| c.term == "cats") {
            assert!(candidate.cross_platform);
            assert!((candidate.trend_score - candidate.base_trend_score * 1.5).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn raw_hashtag_spelling_still_yields_example_refs() {
        let store = MemoryStore::new();
        seed_history(&store, "cats", Platform::Reddit).await;
        for n in 0..20 {
            let tag = if n % 2 == 0 { "#Cats" } else { " CATS" };
            store.add_post(post(n + 1, Platform::Reddit, format!("user{n}"), &[tag]));
        }

        let pipeline = Pipeline::new(&AnalysisConfig::default(), NoiseFilter::default()).unwrap();
        let report = pipeline.run_cycle(&store, now()).await.unwrap();

        let cats = report
            .trends
            .iter()
            .find(|t| t.term == "cats")
            .expect("cats should trend");
        assert_eq!(cats.current_frequency, 20);
        assert_eq!(cats.example_refs.len(), 5);
        assert!(cats
            .example_refs
            .iter()
            .all(|r| r.starts_with("https://reddit.test/p/")));
    }

    #[tokio::test]
    async fn rerunning_a_cycle_keeps_term_stats_stable() {
        let store = MemoryStore::new();
        for n in 0..12 {
            store.add_post(post(n, Platform::Reddit, format!("user{n}"), &["caturday"]));
        }
        let pipeline = Pipeline::new(&AnalysisConfig::default(), NoiseFilter::default()).unwrap();

        pipeline.run_cycle(&store, now()).await.unwrap();
        let first = store.term_stats();
        pipeline.run_cycle(&store, now()).await.unwrap();
        assert_eq!(store.term_stats(), first);
    }

    #[test]
    fn zero_bucket_width_is_rejected() {
        let config = AnalysisConfig {
            bucket_minutes: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            Pipeline::new(&config, NoiseFilter::default()),
            Err(AnalysisError::Config(_))
        ));
    }
}
