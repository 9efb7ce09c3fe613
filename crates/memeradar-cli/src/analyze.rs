//! The `analyze` command: one full detection cycle against Postgres.

use anyhow::Context;
use chrono::Utc;
use memeradar_analysis::{CycleReport, NoiseFilter, PgStore, Pipeline};
use memeradar_core::AppConfig;

/// Noise filter seeded from the configured YAML lists, or the built-in ones.
pub(crate) fn load_noise_filter(config: &AppConfig) -> anyhow::Result<NoiseFilter> {
    match &config.noise_path {
        Some(path) => {
            let lists = memeradar_core::load_noise_lists(path)
                .with_context(|| format!("failed to load noise lists from {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                stop_phrases = lists.stop_phrases.len(),
                evergreen_hashtags = lists.evergreen_hashtags.len(),
                "noise lists loaded"
            );
            Ok(NoiseFilter::new(&lists))
        }
        None => Ok(NoiseFilter::default()),
    }
}

/// Run one analysis cycle and print what it found.
///
/// # Errors
///
/// Returns an error if the noise lists cannot be loaded, the pipeline cannot
/// be built, or the cycle fails on a store error.
pub(crate) async fn run_analyze(
    pool: sqlx::PgPool,
    config: &AppConfig,
    json: bool,
) -> anyhow::Result<()> {
    let noise = load_noise_filter(config)?;
    let pipeline = Pipeline::new(&config.analysis, noise).context("failed to build pipeline")?;
    let store = PgStore::new(pool);

    let report = pipeline
        .run_cycle(&store, Utc::now())
        .await
        .context("analysis cycle failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &CycleReport) {
    println!("bucket {}", report.bucket.format("%Y-%m-%d %H:%M UTC"));
    println!("  term stats written:   {}", report.term_stats_written);
    println!(
        "  trends:               {} saved ({} before noise filter)",
        report.trends.len(),
        report.trends_detected
    );
    println!("  comment memes:        {}", report.comment_memes.len());
    println!(
        "  media hashed:         {} ({} unavailable, {} unhashable)",
        report.media_hashing.hashed, report.media_hashing.unavailable, report.media_hashing.unhashable
    );
    println!("  image templates:      {}", report.templates.len());
    println!(
        "  cross-platform terms: {} ({} candidates boosted)",
        report.cross_platform.len(),
        report.candidates_boosted
    );
    if let Some(lowkey) = &report.lowkey {
        println!(
            "  lowkey:               {} videos, {} hot, {} added to watchlist, {} dropped",
            lowkey.videos_analyzed,
            lowkey.hot_videos_found,
            lowkey.watchlist_additions,
            lowkey.watchlist_dropped
        );
    }

    if !report.trends.is_empty() {
        println!();
        println!("{:<32}{:<12}{:<11}{:<10}SCORE", "TERM", "PLATFORM", "TYPE", "ACCEL");
        for trend in &report.trends {
            println!(
                "{:<32}{:<12}{:<11}{:<10.2}{:.2}",
                trend.term,
                trend.platform,
                trend.term_type,
                trend.acceleration_score,
                trend.trend_score
            );
        }
    }

    if !report.comment_memes.is_empty() {
        println!();
        println!("{:<40}{:<8}{:<9}VIRALITY", "COMMENT", "POSTS", "AUTHORS");
        for meme in &report.comment_memes {
            println!(
                "{:<40}{:<8}{:<9}{:.1}",
                meme.normalized_text,
                meme.distinct_posts,
                meme.distinct_authors,
                meme.virality_score()
            );
        }
    }
}
