use crate::DbError;
use chrono::{DateTime, Utc};
use memeradar_core::CommentPhrase;
use sqlx::PgPool;

const PHRASE_COLUMNS: &str = "phrase, first_seen_at, last_seen_at, video_count, \
     total_occurrences, total_likes, avg_likes, distinct_commenters";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentPhraseRow {
    pub phrase: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub video_count: i64,
    pub total_occurrences: i64,
    pub total_likes: i64,
    pub avg_likes: f64,
    pub distinct_commenters: i64,
}

impl From<CommentPhraseRow> for CommentPhrase {
    fn from(row: CommentPhraseRow) -> Self {
        CommentPhrase {
            phrase: row.phrase,
            first_seen_at: row.first_seen_at,
            last_seen_at: row.last_seen_at,
            video_count: row.video_count,
            total_occurrences: row.total_occurrences,
            total_likes: row.total_likes,
            avg_likes: row.avg_likes,
            distinct_commenters: row.distinct_commenters,
        }
    }
}

/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn get_comment_phrase(
    pool: &PgPool,
    phrase: &str,
) -> Result<Option<CommentPhraseRow>, DbError> {
    let sql = format!("SELECT {PHRASE_COLUMNS} FROM comment_phrases WHERE phrase = $1");
    Ok(sqlx::query_as::<_, CommentPhraseRow>(&sql)
        .bind(phrase)
        .fetch_optional(pool)
        .await?)
}

/// Write the full aggregate for a phrase, inserting it on first sight.
/// `first_seen_at` is never overwritten.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn save_comment_phrase(pool: &PgPool, phrase: &CommentPhrase) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO comment_phrases \
           (phrase, first_seen_at, last_seen_at, video_count, total_occurrences, \
            total_likes, avg_likes, distinct_commenters) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (phrase) DO UPDATE SET \
           last_seen_at = EXCLUDED.last_seen_at, \
           video_count = EXCLUDED.video_count, \
           total_occurrences = EXCLUDED.total_occurrences, \
           total_likes = EXCLUDED.total_likes, \
           avg_likes = EXCLUDED.avg_likes, \
           distinct_commenters = EXCLUDED.distinct_commenters",
    )
    .bind(&phrase.phrase)
    .bind(phrase.first_seen_at)
    .bind(phrase.last_seen_at)
    .bind(phrase.video_count)
    .bind(phrase.total_occurrences)
    .bind(phrase.total_likes)
    .bind(phrase.avg_likes)
    .bind(phrase.distinct_commenters)
    .execute(pool)
    .await?;
    Ok(())
}

/// Phrases seen on at least `min_videos` videos, most widespread first.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_trending_comment_phrases(
    pool: &PgPool,
    min_videos: i64,
    limit: i64,
) -> Result<Vec<CommentPhraseRow>, DbError> {
    let sql = format!(
        "SELECT {PHRASE_COLUMNS} FROM comment_phrases \
         WHERE video_count >= $1 \
         ORDER BY video_count DESC, total_occurrences DESC, phrase \
         LIMIT $2"
    );
    Ok(sqlx::query_as::<_, CommentPhraseRow>(&sql)
        .bind(min_videos)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}
