//! Meme and trend detection for memeradar.
//!
//! Aggregates collected posts and comments into per-bucket term statistics,
//! flags terms accelerating past their baseline, and layers comment-meme,
//! image-template, cross-platform, and lowkey-creator detection on top. All
//! detectors read and write through [`ContentStore`], backed by Postgres in
//! production and by [`MemoryStore`] in tests.

pub mod aggregator;
pub mod bucket;
pub mod comment_memes;
pub mod correlator;
pub mod error;
pub mod lowkey;
pub mod noise;
pub mod phash;
pub mod phrases;
pub mod pipeline;
pub mod store;
pub mod templates;
pub mod trends;

pub use aggregator::TermAggregator;
pub use bucket::BucketClock;
pub use comment_memes::{CommentMeme, CommentMemeDetector};
pub use correlator::{
    boost_multiplier, CrossPlatformCorrelator, CrossPlatformTrend, PlatformMetrics,
};
pub use error::{AnalysisError, ImageHashError, StoreError};
pub use lowkey::{LowkeyAnalyzer, LowkeyRunSummary, TopCreator};
pub use noise::{NoiseFilter, Scored, ScoredCandidate};
pub use phash::{are_similar, hamming_distance, ImageHasher};
pub use phrases::PhraseExtractor;
pub use pipeline::{CycleReport, Pipeline};
pub use store::{ContentStore, MemoryStore, PgStore};
pub use templates::{HashBatchReport, ImageTemplate, TemplateDetector};
pub use trends::{TrendDetector, TrendMetrics};
