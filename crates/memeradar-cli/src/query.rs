//! Read-only query handlers.

use chrono::{Duration, Utc};
use memeradar_analysis::{ContentStore, LowkeyAnalyzer, PgStore};
use memeradar_core::{AppConfig, WatchlistStatus};

/// Show recent trend candidates, highest score first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_trends(pool: sqlx::PgPool, hours: u32, limit: usize) -> anyhow::Result<()> {
    let store = PgStore::new(pool);
    let since = Utc::now() - Duration::hours(i64::from(hours));
    let candidates = store.recent_trend_candidates(since, limit).await?;

    if candidates.is_empty() {
        println!("no trend candidates in the last {hours}h; run `analyze` first");
        return Ok(());
    }

    println!(
        "{:<32}{:<12}{:<18}{:<10}{:<10}PLATFORMS",
        "TERM", "PLATFORM", "DETECTED", "ACCEL", "SCORE"
    );
    for candidate in &candidates {
        let platforms = if candidate.cross_platform {
            candidate
                .platforms_seen
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        } else {
            "-".to_string()
        };
        println!(
            "{:<32}{:<12}{:<18}{:<10.2}{:<10.2}{}",
            candidate.term,
            candidate.platform,
            candidate.detected_at.format("%Y-%m-%d %H:%M"),
            candidate.acceleration_score,
            candidate.trend_score,
            platforms
        );
    }
    Ok(())
}

/// Show watchlist creators.
///
/// Without a status filter this lists the top active creators with their best
/// hot video; with one it lists the raw entries.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_watchlist(
    pool: sqlx::PgPool,
    config: &AppConfig,
    status: Option<WatchlistStatus>,
    limit: usize,
) -> anyhow::Result<()> {
    let store = PgStore::new(pool);

    if let Some(status) = status {
        let entries = store.list_watchlist(Some(status), limit).await?;
        if entries.is_empty() {
            println!("no {status} watchlist entries");
            return Ok(());
        }
        println!("{:<10}{:<10}{:<18}{:<8}BEST SEED", "CREATOR", "STATUS", "LAST QUALIFIED", "VIDEOS");
        for entry in &entries {
            println!(
                "{:<10}{:<10}{:<18}{:<8}{:.3}",
                entry.creator_id,
                entry.status,
                entry.last_qualified_at.format("%Y-%m-%d %H:%M"),
                entry.qualifying_video_count,
                entry.max_meme_seed_score
            );
        }
        return Ok(());
    }

    let top = LowkeyAnalyzer::new(&config.analysis)
        .top_creators(&store, limit)
        .await?;
    if top.is_empty() {
        println!("watchlist is empty; enable lowkey detection and run `analyze`");
        return Ok(());
    }

    println!("{:<24}{:<12}{:<8}{:<11}BEST VIDEO", "CREATOR", "FOLLOWERS", "VIDEOS", "BEST SEED");
    for creator in &top {
        let best = creator
            .hot_videos
            .first()
            .map(|v| format!("post {} ({} likes)", v.post_id, v.likes))
            .unwrap_or_default();
        println!(
            "{:<24}{:<12}{:<8}{:<11.3}{}",
            creator.creator.handle,
            creator.creator.follower_count,
            creator.entry.qualifying_video_count,
            creator.entry.max_meme_seed_score,
            best
        );
    }
    Ok(())
}

/// Show comment phrases repeated across hot videos.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_phrases(
    pool: sqlx::PgPool,
    min_videos: i64,
    limit: usize,
) -> anyhow::Result<()> {
    let store = PgStore::new(pool);
    let phrases = store.trending_comment_phrases(min_videos, limit).await?;

    if phrases.is_empty() {
        println!("no comment phrases seen on {min_videos}+ videos");
        return Ok(());
    }

    println!("{:<48}{:<8}{:<13}LAST SEEN", "PHRASE", "VIDEOS", "OCCURRENCES");
    for phrase in &phrases {
        println!(
            "{:<48}{:<8}{:<13}{}",
            phrase.phrase,
            phrase.video_count,
            phrase.total_occurrences,
            phrase.last_seen_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
