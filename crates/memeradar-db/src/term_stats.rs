use crate::DbError;
use chrono::{DateTime, Utc};
use memeradar_core::{CoreError, TermStat};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TermStatRow {
    pub id: i64,
    pub term: String,
    pub term_type: String,
    pub platform: String,
    pub time_bucket: DateTime<Utc>,
    pub count_posts: i64,
    pub count_comments: i64,
    pub sum_engagement: f64,
    pub distinct_authors: i64,
}

impl TryFrom<TermStatRow> for TermStat {
    type Error = CoreError;

    fn try_from(row: TermStatRow) -> Result<Self, Self::Error> {
        Ok(TermStat {
            term: row.term,
            term_type: row.term_type.parse()?,
            platform: row.platform.parse()?,
            bucket: row.time_bucket,
            count_posts: row.count_posts,
            count_comments: row.count_comments,
            sum_engagement: row.sum_engagement,
            distinct_authors: row.distinct_authors,
        })
    }
}

/// Insert or overwrite the statistic for `(term, term_type, platform, bucket)`.
///
/// Counts are replaced rather than added, so re-aggregating a bucket from the
/// same inputs leaves the row unchanged. Returns the row ID.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn upsert_term_stat(pool: &PgPool, stat: &TermStat) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO term_stats \
           (term, term_type, platform, time_bucket, count_posts, count_comments, \
            sum_engagement, distinct_authors) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (term, term_type, platform, time_bucket) DO UPDATE SET \
           count_posts = EXCLUDED.count_posts, \
           count_comments = EXCLUDED.count_comments, \
           sum_engagement = EXCLUDED.sum_engagement, \
           distinct_authors = EXCLUDED.distinct_authors \
         RETURNING id",
    )
    .bind(&stat.term)
    .bind(stat.term_type.as_str())
    .bind(stat.platform.as_str())
    .bind(stat.bucket)
    .bind(stat.count_posts)
    .bind(stat.count_comments)
    .bind(stat.sum_engagement)
    .bind(stat.distinct_authors)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// All statistics recorded for exactly `bucket`.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_term_stats_in_bucket(
    pool: &PgPool,
    bucket: DateTime<Utc>,
) -> Result<Vec<TermStatRow>, DbError> {
    Ok(sqlx::query_as::<_, TermStatRow>(
        "SELECT id, term, term_type, platform, time_bucket, count_posts, count_comments, \
                sum_engagement, distinct_authors \
         FROM term_stats \
         WHERE time_bucket = $1 \
         ORDER BY id",
    )
    .bind(bucket)
    .fetch_all(pool)
    .await?)
}

/// Statistics for one term series with buckets in `[from, until)`, oldest first.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_term_stat_history(
    pool: &PgPool,
    term: &str,
    term_type: &str,
    platform: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<TermStatRow>, DbError> {
    Ok(sqlx::query_as::<_, TermStatRow>(
        "SELECT id, term, term_type, platform, time_bucket, count_posts, count_comments, \
                sum_engagement, distinct_authors \
         FROM term_stats \
         WHERE term = $1 AND term_type = $2 AND platform = $3 \
           AND time_bucket >= $4 AND time_bucket < $5 \
         ORDER BY time_bucket",
    )
    .bind(term)
    .bind(term_type)
    .bind(platform)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?)
}

/// Statistics with buckets at or after `since`.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_term_stats_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<TermStatRow>, DbError> {
    Ok(sqlx::query_as::<_, TermStatRow>(
        "SELECT id, term, term_type, platform, time_bucket, count_posts, count_comments, \
                sum_engagement, distinct_authors \
         FROM term_stats \
         WHERE time_bucket >= $1 \
         ORDER BY term, term_type, platform, time_bucket",
    )
    .bind(since)
    .fetch_all(pool)
    .await?)
}
