//! Read access to acquisition-owned content: posts, comments, and media.
//!
//! The only write here is [`set_media_hash`]; everything else in these
//! tables belongs to the collectors.

use crate::DbError;
use chrono::{DateTime, Utc};
use memeradar_core::{Comment, CoreError, Media, Post};
use sqlx::PgPool;

const POST_SELECT: &str = "SELECT p.id, p.platform, p.external_id, p.author, p.created_at, \
            p.collected_at, p.text, p.permalink, p.likes, p.shares, p.comments_count, \
            p.engagement_score, p.upvote_ratio, p.subreddit, p.metadata, \
            COALESCE( \
                (SELECT ARRAY_AGG(h.tag ORDER BY h.tag) FROM post_hashtags h WHERE h.post_id = p.id), \
                '{}'::TEXT[] \
            ) AS hashtags \
     FROM posts p";

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, p.platform, p.permalink AS post_permalink, \
            c.author, c.collected_at, c.text, c.normalized_text, c.score \
     FROM comments c \
     JOIN posts p ON p.id = c.post_id";

const MEDIA_SELECT: &str = "SELECT m.id, m.post_id, p.platform, m.media_url, m.media_type, \
            m.image_hash, p.engagement_score AS post_engagement, \
            p.collected_at AS post_collected_at \
     FROM media m \
     JOIN posts p ON p.id = m.post_id";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub platform: String,
    pub external_id: String,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
    pub text: Option<String>,
    pub permalink: Option<String>,
    pub likes: i64,
    pub shares: i64,
    pub comments_count: i64,
    pub engagement_score: f64,
    pub upvote_ratio: Option<f64>,
    pub subreddit: Option<String>,
    pub metadata: serde_json::Value,
    pub hashtags: Vec<String>,
}

impl TryFrom<PostRow> for Post {
    type Error = CoreError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.id,
            platform: row.platform.parse()?,
            external_id: row.external_id,
            author: row.author,
            created_at: row.created_at,
            collected_at: row.collected_at,
            text: row.text,
            permalink: row.permalink,
            likes: row.likes,
            shares: row.shares,
            comments_count: row.comments_count,
            engagement_score: row.engagement_score,
            upvote_ratio: row.upvote_ratio,
            subreddit: row.subreddit,
            hashtags: row.hashtags,
            metadata: row.metadata,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub platform: String,
    pub post_permalink: Option<String>,
    pub author: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub text: Option<String>,
    pub normalized_text: Option<String>,
    pub score: i64,
}

impl TryFrom<CommentRow> for Comment {
    type Error = CoreError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: row.id,
            post_id: row.post_id,
            platform: row.platform.parse()?,
            post_permalink: row.post_permalink,
            author: row.author,
            collected_at: row.collected_at,
            text: row.text,
            normalized_text: row.normalized_text,
            score: row.score,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaRow {
    pub id: i64,
    pub post_id: i64,
    pub platform: String,
    pub media_url: String,
    pub media_type: String,
    pub image_hash: Option<String>,
    pub post_engagement: f64,
    pub post_collected_at: DateTime<Utc>,
}

impl TryFrom<MediaRow> for Media {
    type Error = CoreError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        Ok(Media {
            id: row.id,
            post_id: row.post_id,
            platform: row.platform.parse()?,
            media_url: row.media_url,
            media_type: row.media_type.parse()?,
            image_hash: row.image_hash,
            post_engagement: row.post_engagement,
            post_collected_at: row.post_collected_at,
        })
    }
}

/// Posts collected in `[start, end)`.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_posts_between(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<PostRow>, DbError> {
    let sql = format!(
        "{POST_SELECT} WHERE p.collected_at >= $1 AND p.collected_at < $2 ORDER BY p.id"
    );
    Ok(sqlx::query_as::<_, PostRow>(&sql)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?)
}

/// Most recently collected posts on a platform, newest first.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_recent_posts(
    pool: &PgPool,
    platform: &str,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<PostRow>, DbError> {
    let sql = format!(
        "{POST_SELECT} WHERE p.platform = $1 AND p.collected_at >= $2 \
         ORDER BY p.collected_at DESC, p.id DESC LIMIT $3"
    );
    Ok(sqlx::query_as::<_, PostRow>(&sql)
        .bind(platform)
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}

/// A creator's most recent posts on a platform, newest first.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_recent_posts_by_author(
    pool: &PgPool,
    platform: &str,
    author: &str,
    limit: i64,
) -> Result<Vec<PostRow>, DbError> {
    let sql = format!(
        "{POST_SELECT} WHERE p.platform = $1 AND p.author = $2 \
         ORDER BY p.collected_at DESC, p.id DESC LIMIT $3"
    );
    Ok(sqlx::query_as::<_, PostRow>(&sql)
        .bind(platform)
        .bind(author)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}

/// Permalinks of the highest-engagement posts carrying `tag` in `[start, end)`.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn top_hashtag_permalinks(
    pool: &PgPool,
    tag: &str,
    platform: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<String>, DbError> {
    Ok(sqlx::query_scalar::<_, String>(
        "SELECT p.permalink FROM posts p \
         JOIN post_hashtags h ON h.post_id = p.id \
         WHERE lower(ltrim(btrim(h.tag), '#')) = $1 AND p.platform = $2 \
           AND p.collected_at >= $3 AND p.collected_at < $4 \
           AND p.permalink IS NOT NULL \
         ORDER BY p.engagement_score DESC, p.id \
         LIMIT $5",
    )
    .bind(tag)
    .bind(platform)
    .bind(start)
    .bind(end)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

/// Parent-post permalinks of the highest-scoring comments whose normalized
/// text equals `normalized_text`, one entry per post.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn top_comment_permalinks(
    pool: &PgPool,
    normalized_text: &str,
    platform: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<String>, DbError> {
    Ok(sqlx::query_scalar::<_, String>(
        "SELECT permalink FROM ( \
             SELECT p.permalink, MAX(c.score) AS best \
             FROM comments c \
             JOIN posts p ON p.id = c.post_id \
             WHERE c.normalized_text = $1 AND p.platform = $2 \
               AND c.collected_at >= $3 AND c.collected_at < $4 \
               AND p.permalink IS NOT NULL \
             GROUP BY p.permalink \
         ) ranked \
         ORDER BY best DESC, permalink \
         LIMIT $5",
    )
    .bind(normalized_text)
    .bind(platform)
    .bind(start)
    .bind(end)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

/// Comments collected in `[start, end)`, joined with their post's platform.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_comments_between(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<CommentRow>, DbError> {
    let sql = format!(
        "{COMMENT_SELECT} WHERE c.collected_at >= $1 AND c.collected_at < $2 ORDER BY c.id"
    );
    Ok(sqlx::query_as::<_, CommentRow>(&sql)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?)
}

/// Highest-scoring comments on a post.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_top_comments_for_post(
    pool: &PgPool,
    post_id: i64,
    limit: i64,
) -> Result<Vec<CommentRow>, DbError> {
    let sql = format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.score DESC, c.id LIMIT $2");
    Ok(sqlx::query_as::<_, CommentRow>(&sql)
        .bind(post_id)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}

/// Hashed media whose post was collected at or after `since`.
///
/// Media marked unhashable (empty hash) is excluded.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_media_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<MediaRow>, DbError> {
    let sql = format!(
        "{MEDIA_SELECT} WHERE p.collected_at >= $1 \
           AND m.image_hash IS NOT NULL AND m.image_hash <> '' \
         ORDER BY m.id"
    );
    Ok(sqlx::query_as::<_, MediaRow>(&sql)
        .bind(since)
        .fetch_all(pool)
        .await?)
}

/// Still images and GIFs that have not been hashed yet, newest post first.
///
/// Failed downloads stay pending, so newer media are taken first.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_pending_media(pool: &PgPool, limit: i64) -> Result<Vec<MediaRow>, DbError> {
    let sql = format!(
        "{MEDIA_SELECT} WHERE m.image_hash IS NULL AND m.media_type IN ('image', 'gif') \
         ORDER BY p.collected_at DESC, m.id DESC LIMIT $1"
    );
    Ok(sqlx::query_as::<_, MediaRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}

/// Record the perceptual hash for a media row. An empty `hash` marks the
/// media as permanently unhashable.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no media row has `media_id`, or
/// `DbError` on database query failure.
pub async fn set_media_hash(pool: &PgPool, media_id: i64, hash: &str) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE media SET image_hash = $2 WHERE id = $1")
        .bind(media_id)
        .bind(hash)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
