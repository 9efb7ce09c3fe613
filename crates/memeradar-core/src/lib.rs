//! Shared domain records, thresholds, and configuration for Meme Radar.

mod app_config;
mod config;
pub mod content;
pub mod noise_lists;
pub mod signals;
pub mod text;
pub mod thresholds;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use content::{Comment, Media, MediaType, Platform, Post};
pub use noise_lists::{load_noise_lists, NoiseLists};
pub use signals::{
    CommentPhrase, Creator, CreatorStats, HotVideo, NewCreatorStats, NewHotVideo,
    NewTrendCandidate, TermKey, TermStat, TermType, TrendCandidate, WatchlistEntry,
    WatchlistStatus,
};
pub use text::{normalize_comment_text, normalize_hashtag};
pub use thresholds::{
    AnalysisConfig, CommentMemeConfig, CrossPlatformConfig, LowkeyConfig, ScoreWeights,
    TemplateConfig, TrendThresholds,
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("unknown term type: {0}")]
    UnknownTermType(String),
    #[error("unknown media type: {0}")]
    UnknownMediaType(String),
    #[error("unknown watchlist status: {0}")]
    UnknownWatchlistStatus(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read noise lists at {path}: {source}")]
    NoiseFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse noise lists: {0}")]
    NoiseFileParse(#[source] serde_yaml::Error),

    #[error("noise list validation failed: {0}")]
    Validation(String),
}
