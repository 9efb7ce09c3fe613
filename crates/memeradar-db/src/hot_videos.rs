use crate::DbError;
use chrono::{DateTime, Utc};
use memeradar_core::{HotVideo, NewHotVideo};
use sqlx::PgPool;

const HOT_VIDEO_COLUMNS: &str = "id, post_id, creator_id, detected_at, views, likes, comments, \
     shares, virality_ratio, engagement_rate, comment_intensity, spike_factor, likes_to_views, \
     shares_to_likes, discourse_signal, meme_seed_score";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HotVideoRow {
    pub id: i64,
    pub post_id: i64,
    pub creator_id: i64,
    pub detected_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub virality_ratio: f64,
    pub engagement_rate: f64,
    pub comment_intensity: f64,
    pub spike_factor: f64,
    pub likes_to_views: f64,
    pub shares_to_likes: f64,
    pub discourse_signal: bool,
    pub meme_seed_score: f64,
}

impl From<HotVideoRow> for HotVideo {
    fn from(row: HotVideoRow) -> Self {
        HotVideo {
            id: row.id,
            post_id: row.post_id,
            creator_id: row.creator_id,
            detected_at: row.detected_at,
            views: row.views,
            likes: row.likes,
            comments: row.comments,
            shares: row.shares,
            virality_ratio: row.virality_ratio,
            engagement_rate: row.engagement_rate,
            comment_intensity: row.comment_intensity,
            spike_factor: row.spike_factor,
            likes_to_views: row.likes_to_views,
            shares_to_likes: row.shares_to_likes,
            discourse_signal: row.discourse_signal,
            meme_seed_score: row.meme_seed_score,
        }
    }
}

/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn get_hot_video_for_post(
    pool: &PgPool,
    post_id: i64,
) -> Result<Option<HotVideoRow>, DbError> {
    let sql = format!("SELECT {HOT_VIDEO_COLUMNS} FROM hot_videos WHERE post_id = $1");
    Ok(sqlx::query_as::<_, HotVideoRow>(&sql)
        .bind(post_id)
        .fetch_optional(pool)
        .await?)
}

/// Insert a hot video once per post.
///
/// When a row for the post already exists it is returned untouched; metrics
/// are never re-scored.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn insert_hot_video(pool: &PgPool, video: &NewHotVideo) -> Result<HotVideoRow, DbError> {
    let sql = format!(
        "INSERT INTO hot_videos \
           (post_id, creator_id, detected_at, views, likes, comments, shares, \
            virality_ratio, engagement_rate, comment_intensity, spike_factor, \
            likes_to_views, shares_to_likes, discourse_signal, meme_seed_score) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         ON CONFLICT (post_id) DO NOTHING \
         RETURNING {HOT_VIDEO_COLUMNS}"
    );
    let inserted = sqlx::query_as::<_, HotVideoRow>(&sql)
        .bind(video.post_id)
        .bind(video.creator_id)
        .bind(video.detected_at)
        .bind(video.views)
        .bind(video.likes)
        .bind(video.comments)
        .bind(video.shares)
        .bind(video.virality_ratio)
        .bind(video.engagement_rate)
        .bind(video.comment_intensity)
        .bind(video.spike_factor)
        .bind(video.likes_to_views)
        .bind(video.shares_to_likes)
        .bind(video.discourse_signal)
        .bind(video.meme_seed_score)
        .fetch_optional(pool)
        .await?;

    match inserted {
        Some(row) => Ok(row),
        None => get_hot_video_for_post(pool, video.post_id)
            .await?
            .ok_or(DbError::NotFound),
    }
}

/// A creator's hot videos, best meme-seed score first.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_hot_videos_for_creator(
    pool: &PgPool,
    creator_id: i64,
    limit: i64,
) -> Result<Vec<HotVideoRow>, DbError> {
    let sql = format!(
        "SELECT {HOT_VIDEO_COLUMNS} FROM hot_videos \
         WHERE creator_id = $1 \
         ORDER BY meme_seed_score DESC, id \
         LIMIT $2"
    );
    Ok(sqlx::query_as::<_, HotVideoRow>(&sql)
        .bind(creator_id)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}
