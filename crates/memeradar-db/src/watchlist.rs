use crate::DbError;
use chrono::{DateTime, Utc};
use memeradar_core::{CoreError, WatchlistEntry};
use sqlx::PgPool;

const WATCHLIST_COLUMNS: &str = "creator_id, status, first_qualified_at, last_qualified_at, \
     max_virality_ratio, max_spike_factor, max_meme_seed_score, qualifying_video_count";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WatchlistRow {
    pub creator_id: i64,
    pub status: String,
    pub first_qualified_at: DateTime<Utc>,
    pub last_qualified_at: DateTime<Utc>,
    pub max_virality_ratio: f64,
    pub max_spike_factor: f64,
    pub max_meme_seed_score: f64,
    pub qualifying_video_count: i64,
}

impl TryFrom<WatchlistRow> for WatchlistEntry {
    type Error = CoreError;

    fn try_from(row: WatchlistRow) -> Result<Self, Self::Error> {
        Ok(WatchlistEntry {
            creator_id: row.creator_id,
            status: row.status.parse()?,
            first_qualified_at: row.first_qualified_at,
            last_qualified_at: row.last_qualified_at,
            max_virality_ratio: row.max_virality_ratio,
            max_spike_factor: row.max_spike_factor,
            max_meme_seed_score: row.max_meme_seed_score,
            qualifying_video_count: row.qualifying_video_count,
        })
    }
}

/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn get_watchlist_entry(
    pool: &PgPool,
    creator_id: i64,
) -> Result<Option<WatchlistRow>, DbError> {
    let sql = format!("SELECT {WATCHLIST_COLUMNS} FROM watchlist WHERE creator_id = $1");
    Ok(sqlx::query_as::<_, WatchlistRow>(&sql)
        .bind(creator_id)
        .fetch_optional(pool)
        .await?)
}

/// Write the full state of a creator's entry, inserting it on first
/// qualification.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn save_watchlist_entry(pool: &PgPool, entry: &WatchlistEntry) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO watchlist \
           (creator_id, status, first_qualified_at, last_qualified_at, max_virality_ratio, \
            max_spike_factor, max_meme_seed_score, qualifying_video_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (creator_id) DO UPDATE SET \
           status = EXCLUDED.status, \
           last_qualified_at = EXCLUDED.last_qualified_at, \
           max_virality_ratio = EXCLUDED.max_virality_ratio, \
           max_spike_factor = EXCLUDED.max_spike_factor, \
           max_meme_seed_score = EXCLUDED.max_meme_seed_score, \
           qualifying_video_count = EXCLUDED.qualifying_video_count",
    )
    .bind(entry.creator_id)
    .bind(entry.status.as_str())
    .bind(entry.first_qualified_at)
    .bind(entry.last_qualified_at)
    .bind(entry.max_virality_ratio)
    .bind(entry.max_spike_factor)
    .bind(entry.max_meme_seed_score)
    .bind(entry.qualifying_video_count)
    .execute(pool)
    .await?;
    Ok(())
}

/// Move active entries not qualified since `cutoff` to `dropped`.
/// Returns the number of entries dropped.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn drop_stale_watchlist_entries(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE watchlist SET status = 'dropped' \
         WHERE status = 'active' AND last_qualified_at < $1",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Entries ordered by best meme-seed score, optionally filtered by status.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_watchlist(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<WatchlistRow>, DbError> {
    let sql = format!(
        "SELECT {WATCHLIST_COLUMNS} FROM watchlist \
         WHERE ($1::TEXT IS NULL OR status = $1) \
         ORDER BY max_meme_seed_score DESC, creator_id \
         LIMIT $2"
    );
    Ok(sqlx::query_as::<_, WatchlistRow>(&sql)
        .bind(status)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}
