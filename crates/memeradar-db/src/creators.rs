use crate::DbError;
use chrono::{DateTime, Utc};
use memeradar_core::{Creator, CreatorStats, NewCreatorStats};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreatorRow {
    pub id: i64,
    pub handle: String,
    pub follower_count: i64,
    pub first_seen_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl From<CreatorRow> for Creator {
    fn from(row: CreatorRow) -> Self {
        Creator {
            id: row.id,
            handle: row.handle,
            follower_count: row.follower_count,
            first_seen_at: row.first_seen_at,
            last_updated_at: row.last_updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreatorStatsRow {
    pub id: i64,
    pub creator_id: i64,
    pub computed_at: DateTime<Utc>,
    pub videos_analyzed: i64,
    pub avg_views: f64,
    pub median_views: f64,
    pub avg_engagement_rate: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub avg_shares: f64,
}

impl From<CreatorStatsRow> for CreatorStats {
    fn from(row: CreatorStatsRow) -> Self {
        CreatorStats {
            id: row.id,
            creator_id: row.creator_id,
            computed_at: row.computed_at,
            videos_analyzed: row.videos_analyzed,
            avg_views: row.avg_views,
            median_views: row.median_views,
            avg_engagement_rate: row.avg_engagement_rate,
            avg_likes: row.avg_likes,
            avg_comments: row.avg_comments,
            avg_shares: row.avg_shares,
        }
    }
}

/// Fetch the creator with `handle`, creating it with an unknown (zero)
/// follower count on first sight.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn get_or_create_creator(
    pool: &PgPool,
    handle: &str,
    seen_at: DateTime<Utc>,
) -> Result<CreatorRow, DbError> {
    // The no-op update makes RETURNING yield the existing row on conflict.
    Ok(sqlx::query_as::<_, CreatorRow>(
        "INSERT INTO creators (handle, follower_count, first_seen_at, last_updated_at) \
         VALUES ($1, 0, $2, $2) \
         ON CONFLICT (handle) DO UPDATE SET handle = EXCLUDED.handle \
         RETURNING id, handle, follower_count, first_seen_at, last_updated_at",
    )
    .bind(handle)
    .bind(seen_at)
    .fetch_one(pool)
    .await?)
}

/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn get_creator(pool: &PgPool, creator_id: i64) -> Result<Option<CreatorRow>, DbError> {
    Ok(sqlx::query_as::<_, CreatorRow>(
        "SELECT id, handle, follower_count, first_seen_at, last_updated_at \
         FROM creators WHERE id = $1",
    )
    .bind(creator_id)
    .fetch_optional(pool)
    .await?)
}

/// The most recently computed statistics snapshot for a creator.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn get_latest_creator_stats(
    pool: &PgPool,
    creator_id: i64,
) -> Result<Option<CreatorStatsRow>, DbError> {
    Ok(sqlx::query_as::<_, CreatorStatsRow>(
        "SELECT id, creator_id, computed_at, videos_analyzed, avg_views, median_views, \
                avg_engagement_rate, avg_likes, avg_comments, avg_shares \
         FROM creator_stats \
         WHERE creator_id = $1 \
         ORDER BY computed_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(creator_id)
    .fetch_optional(pool)
    .await?)
}

/// Append a statistics snapshot. Older snapshots are kept.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn insert_creator_stats(
    pool: &PgPool,
    stats: &NewCreatorStats,
) -> Result<CreatorStatsRow, DbError> {
    Ok(sqlx::query_as::<_, CreatorStatsRow>(
        "INSERT INTO creator_stats \
           (creator_id, computed_at, videos_analyzed, avg_views, median_views, \
            avg_engagement_rate, avg_likes, avg_comments, avg_shares) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id, creator_id, computed_at, videos_analyzed, avg_views, median_views, \
                   avg_engagement_rate, avg_likes, avg_comments, avg_shares",
    )
    .bind(stats.creator_id)
    .bind(stats.computed_at)
    .bind(stats.videos_analyzed)
    .bind(stats.avg_views)
    .bind(stats.median_views)
    .bind(stats.avg_engagement_rate)
    .bind(stats.avg_likes)
    .bind(stats.avg_comments)
    .bind(stats.avg_shares)
    .fetch_one(pool)
    .await?)
}
