//! Terms trending on more than one platform at once.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use memeradar_core::{AnalysisConfig, CrossPlatformConfig, Platform, TermStat, TermType};
use serde::Serialize;

use crate::error::StoreError;
use crate::store::ContentStore;

const EXAMPLES_PER_CANDIDATE: usize = 2;
const MAX_EXAMPLES: usize = 10;

/// Latest bucket of a term on one platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformMetrics {
    pub frequency: i64,
    pub engagement: f64,
    pub authors: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossPlatformTrend {
    pub term: String,
    pub term_type: TermType,
    pub platforms: BTreeMap<Platform, PlatformMetrics>,
    pub total_frequency: i64,
    pub total_engagement: f64,
    pub avg_acceleration: f64,
    pub boosted_score: f64,
    pub example_refs: Vec<String>,
}

impl CrossPlatformTrend {
    #[must_use]
    pub fn platform_count(&self) -> usize {
        self.platforms.len()
    }

    #[must_use]
    pub fn platform_list(&self) -> Vec<Platform> {
        self.platforms.keys().copied().collect()
    }
}

/// Score multiplier for a term seen on `platforms` platforms.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn boost_multiplier(platforms: usize) -> f64 {
    match platforms {
        2 => 1.5,
        3 => 2.5,
        4 => 4.0,
        n => n as f64,
    }
}

#[derive(Debug, Clone)]
pub struct CrossPlatformCorrelator {
    config: CrossPlatformConfig,
}

impl CrossPlatformCorrelator {
    #[must_use]
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.cross_platform.clone(),
        }
    }

    fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(i64::from(self.config.lookback_hours))
    }

    /// Terms whose statistics span enough platforms in the lookback window,
    /// best boosted score first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if statistics or candidates cannot be read.
    pub async fn analyze(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<Vec<CrossPlatformTrend>, StoreError> {
        let since = self.since(now);
        let stats = store.term_stats_since(since).await?;

        let mut trends = Vec::new();
        for ((term, term_type), latest) in self.group_terms(stats) {
            trends.push(self.build_trend(store, term, term_type, &latest, since).await?);
        }
        trends.sort_by(|a, b| b.boosted_score.total_cmp(&a.boosted_score));

        tracing::info!(trends = trends.len(), "cross-platform analysis complete");
        Ok(trends)
    }

    /// Flag and boost stored candidates for every cross-platform term.
    /// Returns the number of candidate rows touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any update fails.
    pub async fn apply_boosts(
        &self,
        store: &dyn ContentStore,
        trends: &[CrossPlatformTrend],
    ) -> Result<u64, StoreError> {
        let mut touched = 0;
        for trend in trends {
            let multiplier = boost_multiplier(trend.platform_count());
            let updated = store
                .apply_cross_platform_boost(
                    &trend.term,
                    trend.term_type,
                    &trend.platform_list(),
                    multiplier,
                )
                .await?;
            if updated > 0 {
                tracing::debug!(
                    term = %trend.term,
                    platforms = trend.platform_count(),
                    multiplier,
                    updated,
                    "cross-platform boost applied"
                );
            }
            touched += updated;
        }
        Ok(touched)
    }

    /// [`Self::analyze`] followed by [`Self::apply_boosts`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on any read or write failure.
    pub async fn update_trend_candidates(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let trends = self.analyze(store, now).await?;
        self.apply_boosts(store, &trends).await
    }

    /// Latest stat per platform for each term spanning enough platforms,
    /// widest spread first.
    fn group_terms(
        &self,
        stats: Vec<TermStat>,
    ) -> Vec<((String, TermType), BTreeMap<Platform, TermStat>)> {
        let mut grouped: BTreeMap<(String, TermType), BTreeMap<Platform, TermStat>> =
            BTreeMap::new();
        for stat in stats {
            let per_platform = grouped
                .entry((stat.term.clone(), stat.term_type))
                .or_default();
            let newer = per_platform
                .get(&stat.platform)
                .is_none_or(|existing| existing.bucket < stat.bucket);
            if newer {
                per_platform.insert(stat.platform, stat);
            }
        }

        let mut wide: Vec<_> = grouped
            .into_iter()
            .filter(|(_, per_platform)| per_platform.len() >= self.config.min_platforms)
            .collect();
        wide.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        wide.truncate(self.config.max_terms);
        wide
    }

    #[allow(clippy::cast_precision_loss)]
    async fn build_trend(
        &self,
        store: &dyn ContentStore,
        term: String,
        term_type: TermType,
        latest: &BTreeMap<Platform, TermStat>,
        since: DateTime<Utc>,
    ) -> Result<CrossPlatformTrend, StoreError> {
        let platforms: BTreeMap<Platform, PlatformMetrics> = latest
            .iter()
            .map(|(platform, stat)| {
                (
                    *platform,
                    PlatformMetrics {
                        frequency: stat.frequency(),
                        engagement: stat.sum_engagement,
                        authors: stat.distinct_authors,
                    },
                )
            })
            .collect();
        let total_frequency: i64 = platforms.values().map(|m| m.frequency).sum();
        let total_engagement: f64 = platforms.values().map(|m| m.engagement).sum();

        let candidates = store
            .trend_candidates_for_term(&term, term_type, Some(since))
            .await?;
        let avg_acceleration = if candidates.is_empty() {
            1.0
        } else {
            candidates.iter().map(|c| c.acceleration_score).sum::<f64>() / candidates.len() as f64
        };

        let mut seen = BTreeSet::new();
        let example_refs: Vec<String> = candidates
            .iter()
            .flat_map(|c| c.example_refs.iter().take(EXAMPLES_PER_CANDIDATE))
            .filter(|r| seen.insert(r.as_str()))
            .take(MAX_EXAMPLES)
            .cloned()
            .collect();

        let boosted_score = (total_frequency as f64 * total_engagement * avg_acceleration)
            .max(0.0)
            .sqrt()
            * boost_multiplier(platforms.len());

        Ok(CrossPlatformTrend {
            term,
            term_type,
            platforms,
            total_frequency,
            total_engagement,
            avg_acceleration,
            boosted_score,
            example_refs,
        })
    }
}
