//! Reused image templates, grouped by perceptual hash.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use memeradar_core::{AnalysisConfig, Media, Platform, TemplateConfig};
use serde::Serialize;

use crate::error::{AnalysisError, ImageHashError, StoreError};
use crate::phash::{are_similar, ImageHasher};
use crate::store::ContentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageTemplate {
    pub image_hash: String,
    pub platforms: BTreeSet<Platform>,
    pub occurrences: usize,
    pub distinct_posts: usize,
    pub total_engagement: f64,
    pub example_urls: Vec<String>,
    pub first_seen: DateTime<Utc>,
}

impl ImageTemplate {
    #[must_use]
    pub fn cross_platform(&self) -> bool {
        self.platforms.len() > 1
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn template_score(&self) -> f64 {
        let platform_bonus = if self.cross_platform() { 2.0 } else { 1.0 };
        (self.occurrences as f64 * self.total_engagement * platform_bonus)
            .max(0.0)
            .sqrt()
    }
}

/// Outcome of one hashing batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HashBatchReport {
    pub hashed: usize,
    /// Left unhashed; retried next cycle.
    pub unavailable: usize,
    /// Marked permanently unhashable.
    pub unhashable: usize,
}

#[derive(Debug, Clone)]
pub struct TemplateDetector {
    config: TemplateConfig,
    hasher: ImageHasher,
}

const MAX_EXAMPLE_URLS: usize = 5;

impl TemplateDetector {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the download client cannot be built.
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Ok(Self {
            hasher: ImageHasher::new(config.templates.download_timeout_secs)?,
            config: config.templates.clone(),
        })
    }

    /// Whether two hashes are within the configured Hamming distance.
    #[must_use]
    pub fn same_template(&self, a: &str, b: &str) -> bool {
        are_similar(a, b, self.config.hamming_threshold)
    }

    /// Hash one bounded batch of pending images, newest first.
    ///
    /// Download and decode failures are logged and counted, never returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the batch cannot be read or a hash cannot be
    /// written.
    pub async fn hash_pending(
        &self,
        store: &dyn ContentStore,
    ) -> Result<HashBatchReport, StoreError> {
        let pending = store.pending_media(self.config.hash_batch_size).await?;
        if pending.is_empty() {
            return Ok(HashBatchReport::default());
        }

        let results = stream::iter(pending.into_iter().map(|media| {
            let hasher = self.hasher.clone();
            async move {
                let result = hasher.hash_url(&media.media_url).await;
                (media, result)
            }
        }))
        .buffer_unordered(self.config.hash_concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

        let mut report = HashBatchReport::default();
        for (media, result) in results {
            match result {
                Ok(hash) => {
                    store.set_media_hash(media.id, &hash).await?;
                    report.hashed += 1;
                }
                Err(ImageHashError::Unhashable(reason)) => {
                    tracing::warn!(
                        media_id = media.id,
                        url = %media.media_url,
                        reason = %reason,
                        "image cannot be hashed; skipping permanently"
                    );
                    store.set_media_hash(media.id, "").await?;
                    report.unhashable += 1;
                }
                Err(ImageHashError::Unavailable(reason)) => {
                    tracing::warn!(
                        media_id = media.id,
                        url = %media.media_url,
                        reason = %reason,
                        "image unavailable; will retry"
                    );
                    report.unavailable += 1;
                }
            }
        }

        tracing::info!(
            hashed = report.hashed,
            unavailable = report.unavailable,
            unhashable = report.unhashable,
            "media hashing batch complete"
        );
        Ok(report)
    }

    /// Hashes seen often enough in the lookback window, best score first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if media cannot be read.
    pub async fn detect(
        &self,
        store: &dyn ContentStore,
        now: DateTime<Utc>,
    ) -> Result<Vec<ImageTemplate>, StoreError> {
        let since = now - Duration::hours(i64::from(self.config.lookback_hours));
        let media = store.hashed_media_since(since).await?;
        let templates = self.compute(&media);
        tracing::info!(
            media = media.len(),
            templates = templates.len(),
            "template detection complete"
        );
        Ok(templates)
    }

    #[must_use]
    pub fn compute(&self, media: &[Media]) -> Vec<ImageTemplate> {
        let mut groups: BTreeMap<&str, Vec<&Media>> = BTreeMap::new();
        for item in media {
            if let Some(hash) = item.usable_hash() {
                groups.entry(hash).or_default().push(item);
            }
        }

        let mut qualifying: Vec<(&str, Vec<&Media>)> = groups
            .into_iter()
            .filter(|(_, items)| items.len() >= self.config.min_occurrences)
            .collect();
        qualifying.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        qualifying.truncate(self.config.max_candidates);

        let mut templates: Vec<ImageTemplate> = qualifying
            .into_iter()
            .filter_map(|(hash, items)| build_template(hash, &items))
            .collect();
        templates.sort_by(|a, b| b.template_score().total_cmp(&a.template_score()));
        templates
    }
}

fn build_template(hash: &str, items: &[&Media]) -> Option<ImageTemplate> {
    let first_seen = items.iter().map(|m| m.post_collected_at).min()?;

    // Engagement belongs to the post; count each post once.
    let per_post: HashMap<i64, f64> = items
        .iter()
        .map(|m| (m.post_id, m.post_engagement))
        .collect();

    Some(ImageTemplate {
        image_hash: hash.to_string(),
        platforms: items.iter().map(|m| m.platform).collect(),
        occurrences: items.len(),
        distinct_posts: per_post.len(),
        total_engagement: per_post.values().sum(),
        example_urls: items
            .iter()
            .take(MAX_EXAMPLE_URLS)
            .map(|m| m.media_url.clone())
            .collect(),
        first_seen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use memeradar_core::MediaType;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn media(id: i64, post_id: i64, platform: Platform, hash: Option<&str>) -> Media {
        Media {
            id,
            post_id,
            platform,
            media_url: format!("https://cdn.test/{id}.png"),
            media_type: MediaType::Image,
            image_hash: hash.map(str::to_string),
            post_engagement: 50.0,
            post_collected_at: now() - Duration::minutes(20),
        }
    }

    fn detector() -> TemplateDetector {
        TemplateDetector::new(&AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn exact_hash_groups_need_three_occurrences() {
        let hash = "c3c3c3c3c3c3c3c3";
        let items = vec![
            media(1, 10, Platform::Reddit, Some(hash)),
            // Two images on one post count once toward engagement.
            media(2, 10, Platform::Reddit, Some(hash)),
            media(3, 11, Platform::Instagram, Some(hash)),
            media(4, 12, Platform::Reddit, Some("0f0f0f0f0f0f0f0f")),
            media(5, 13, Platform::Reddit, Some("0f0f0f0f0f0f0f0f")),
            media(6, 14, Platform::Reddit, Some("")),
        ];

        let templates = detector().compute(&items);
        assert_eq!(templates.len(), 1);
        let template = &templates[0];
        assert_eq!(template.occurrences, 3);
        assert_eq!(template.distinct_posts, 2);
        assert!((template.total_engagement - 100.0).abs() < f64::EPSILON);
        assert!(template.cross_platform());
        assert!((template.template_score() - (3.0_f64 * 100.0 * 2.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn same_template_uses_configured_threshold() {
        let base = "ffffffffffffffff";
        // 4 and 12 bits flipped.
        let near = "fffffffffffffff0";
        let far = "fffffffffffff000";

        let default = detector();
        assert!(default.same_template(base, near));
        assert!(!default.same_template(base, far));
        assert!(!default.same_template(base, "not-a-hash"));

        let mut config = AnalysisConfig::default();
        config.templates.hamming_threshold = 12;
        let loose = TemplateDetector::new(&config).unwrap();
        assert!(loose.same_template(base, far));

        config.templates.hamming_threshold = 0;
        let strict = TemplateDetector::new(&config).unwrap();
        assert!(!strict.same_template(base, near));
        assert!(strict.same_template(base, base));
    }

    #[tokio::test]
    async fn detect_reads_only_the_lookback_window() {
        let store = MemoryStore::new();
        for id in 1..=3 {
            let mut item = media(id, id, Platform::Tiktok, Some("aaaaaaaaaaaaaaaa"));
            item.post_collected_at = now() - Duration::hours(6);
            store.add_media(item);
        }
        assert!(detector().detect(&store, now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hashing_batch_separates_retryable_and_permanent_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/text.png"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not an image"))
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let mut missing = media(1, 1, Platform::Reddit, None);
        missing.media_url = format!("{}/missing.png", server.uri());
        let mut text = media(2, 2, Platform::Reddit, None);
        text.media_url = format!("{}/text.png", server.uri());
        let mut video = media(3, 3, Platform::Tiktok, None);
        video.media_type = MediaType::Video;
        store.add_media(missing);
        store.add_media(text);
        store.add_media(video);

        let report = detector().hash_pending(&store).await.unwrap();
        assert_eq!(
            report,
            HashBatchReport {
                hashed: 0,
                unavailable: 1,
                unhashable: 1,
            }
        );

        let stored = store.media();
        assert_eq!(stored[0].image_hash, None, "retryable stays pending");
        assert_eq!(stored[1].image_hash.as_deref(), Some(""));
        assert_eq!(stored[2].image_hash, None, "videos are never hashed");
    }

    #[tokio::test]
    async fn hashing_batch_takes_newest_media_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new.png"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let mut old = media(1, 1, Platform::Reddit, None);
        old.media_url = format!("{}/old.png", server.uri());
        old.post_collected_at = now() - Duration::days(3);
        let mut new = media(2, 2, Platform::Reddit, None);
        new.media_url = format!("{}/new.png", server.uri());
        store.add_media(old);
        store.add_media(new);

        let mut config = AnalysisConfig::default();
        config.templates.hash_batch_size = 1;
        let detector = TemplateDetector::new(&config).unwrap();

        let report = detector.hash_pending(&store).await.unwrap();
        assert_eq!(report.unavailable, 1);
        server.verify().await;
    }
}
