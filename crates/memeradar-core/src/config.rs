use std::env::VarError;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::thresholds::AnalysisConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let database_url =
        lookup("DATABASE_URL").map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".into()))?;

    let env = match lookup("MEMERADAR_ENV") {
        Ok(raw) => parse_environment(&raw)?,
        Err(_) => Environment::Development,
    };
    let log_level = lookup("MEMERADAR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let noise_path = lookup("MEMERADAR_NOISE_PATH").ok().map(PathBuf::from);

    let db_max_connections = parse_or(&lookup, "MEMERADAR_DB_MAX_CONNECTIONS", 10_u32)?;
    let db_min_connections = parse_or(&lookup, "MEMERADAR_DB_MIN_CONNECTIONS", 1_u32)?;
    let db_acquire_timeout_secs = parse_or(&lookup, "MEMERADAR_DB_ACQUIRE_TIMEOUT_SECS", 10_u64)?;

    let analysis = build_analysis_config(&lookup)?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        noise_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        analysis,
    })
}

fn build_analysis_config<F>(lookup: &F) -> Result<AnalysisConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let mut cfg = AnalysisConfig::default();

    cfg.bucket_minutes = parse_or(lookup, "MEMERADAR_BUCKET_MINUTES", cfg.bucket_minutes)?;
    if cfg.bucket_minutes == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MEMERADAR_BUCKET_MINUTES".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    cfg.history_buckets = parse_or(lookup, "MEMERADAR_HISTORY_BUCKETS", cfg.history_buckets)?;

    let trend = &mut cfg.trend;
    trend.min_frequency = parse_or(lookup, "MEMERADAR_MIN_FREQUENCY", trend.min_frequency)?;
    trend.min_engagement = parse_or(lookup, "MEMERADAR_MIN_ENGAGEMENT", trend.min_engagement)?;
    trend.z_score_threshold =
        parse_or(lookup, "MEMERADAR_Z_SCORE_THRESHOLD", trend.z_score_threshold)?;
    trend.acceleration_threshold = parse_or(
        lookup,
        "MEMERADAR_ACCELERATION_THRESHOLD",
        trend.acceleration_threshold,
    )?;
    trend.min_unique_users =
        parse_or(lookup, "MEMERADAR_MIN_UNIQUE_USERS", trend.min_unique_users)?;

    cfg.comment_memes.lookback_hours = parse_or(
        lookup,
        "MEMERADAR_COMMENT_MEME_LOOKBACK_HOURS",
        cfg.comment_memes.lookback_hours,
    )?;

    let templates = &mut cfg.templates;
    templates.lookback_hours = parse_or(
        lookup,
        "MEMERADAR_TEMPLATE_LOOKBACK_HOURS",
        templates.lookback_hours,
    )?;
    templates.hash_batch_size = parse_or(
        lookup,
        "MEMERADAR_IMAGE_HASH_BATCH_SIZE",
        templates.hash_batch_size,
    )?;
    templates.hamming_threshold = parse_or(
        lookup,
        "MEMERADAR_IMAGE_HAMMING_THRESHOLD",
        templates.hamming_threshold,
    )?;

    cfg.cross_platform.min_platforms = parse_or(
        lookup,
        "MEMERADAR_CROSS_PLATFORM_MIN_PLATFORMS",
        cfg.cross_platform.min_platforms,
    )?;

    let lowkey = &mut cfg.lowkey;
    lowkey.enabled = parse_or(lookup, "MEMERADAR_LOWKEY_ENABLED", lowkey.enabled)?;
    lowkey.platform = parse_or(lookup, "MEMERADAR_LOWKEY_PLATFORM", lowkey.platform)?;
    lowkey.max_followers =
        parse_or(lookup, "MEMERADAR_LOWKEY_MAX_FOLLOWERS", lowkey.max_followers)?;
    lowkey.min_likes = parse_or(lookup, "MEMERADAR_LOWKEY_MIN_LIKES", lowkey.min_likes)?;
    lowkey.min_spike_factor = parse_or(
        lookup,
        "MEMERADAR_LOWKEY_MIN_SPIKE_FACTOR",
        lowkey.min_spike_factor,
    )?;
    lowkey.min_comment_intensity = parse_or(
        lookup,
        "MEMERADAR_LOWKEY_MIN_COMMENT_INTENSITY",
        lowkey.min_comment_intensity,
    )?;
    lowkey.history_video_count = parse_or(
        lookup,
        "MEMERADAR_LOWKEY_HISTORY_VIDEOS",
        lowkey.history_video_count,
    )?;
    lowkey.analysis_window_hours = parse_or(
        lookup,
        "MEMERADAR_LOWKEY_WINDOW_HOURS",
        lowkey.analysis_window_hours,
    )?;
    lowkey.max_videos_per_run =
        parse_or(lookup, "MEMERADAR_LOWKEY_MAX_VIDEOS", lowkey.max_videos_per_run)?;
    lowkey.comments_per_video = parse_or(
        lookup,
        "MEMERADAR_LOWKEY_COMMENTS_PER_VIDEO",
        lowkey.comments_per_video,
    )?;
    lowkey.watchlist_drop_days = parse_or(
        lookup,
        "MEMERADAR_WATCHLIST_DROP_DAYS",
        lowkey.watchlist_drop_days,
    )?;

    let weights = &mut lowkey.weights;
    weights.virality_ratio =
        parse_or(lookup, "MEMERADAR_WEIGHT_VIRALITY", weights.virality_ratio)?;
    weights.engagement_rate =
        parse_or(lookup, "MEMERADAR_WEIGHT_ENGAGEMENT", weights.engagement_rate)?;
    weights.comment_intensity = parse_or(
        lookup,
        "MEMERADAR_WEIGHT_COMMENT_INTENSITY",
        weights.comment_intensity,
    )?;
    weights.spike_factor = parse_or(lookup, "MEMERADAR_WEIGHT_SPIKE", weights.spike_factor)?;
    weights.repeated_phrases =
        parse_or(lookup, "MEMERADAR_WEIGHT_PHRASES", weights.repeated_phrases)?;

    Ok(cfg)
}

/// Parse `var` when present, otherwise return `default`.
fn parse_or<T, F>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MEMERADAR_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
