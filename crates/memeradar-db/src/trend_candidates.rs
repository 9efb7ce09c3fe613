use crate::DbError;
use chrono::{DateTime, Utc};
use memeradar_core::{CoreError, NewTrendCandidate, Platform, TrendCandidate};
use sqlx::{types::Json, PgPool};

const CANDIDATE_COLUMNS: &str = "id, term, term_type, platform, detected_at, current_frequency, \
     baseline_frequency, acceleration_score, z_score, total_engagement, distinct_authors, \
     base_trend_score, trend_score, cross_platform, platforms_seen, example_refs";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendCandidateRow {
    pub id: i64,
    pub term: String,
    pub term_type: String,
    pub platform: String,
    pub detected_at: DateTime<Utc>,
    pub current_frequency: i64,
    pub baseline_frequency: f64,
    pub acceleration_score: f64,
    pub z_score: f64,
    pub total_engagement: f64,
    pub distinct_authors: i64,
    pub base_trend_score: f64,
    pub trend_score: f64,
    pub cross_platform: bool,
    /// Comma-joined platform names; empty until boosted.
    pub platforms_seen: String,
    pub example_refs: Json<Vec<String>>,
}

impl TryFrom<TrendCandidateRow> for TrendCandidate {
    type Error = CoreError;

    fn try_from(row: TrendCandidateRow) -> Result<Self, Self::Error> {
        let platforms_seen = row
            .platforms_seen
            .split(',')
            .filter(|p| !p.is_empty())
            .map(str::parse::<Platform>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TrendCandidate {
            id: row.id,
            term: row.term,
            term_type: row.term_type.parse()?,
            platform: row.platform.parse()?,
            detected_at: row.detected_at,
            current_frequency: row.current_frequency,
            baseline_frequency: row.baseline_frequency,
            acceleration_score: row.acceleration_score,
            z_score: row.z_score,
            total_engagement: row.total_engagement,
            distinct_authors: row.distinct_authors,
            base_trend_score: row.base_trend_score,
            trend_score: row.trend_score,
            cross_platform: row.cross_platform,
            platforms_seen,
            example_refs: row.example_refs.0,
        })
    }
}

/// Insert a freshly detected candidate. `base_trend_score` starts equal to
/// `trend_score`.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn insert_trend_candidate(
    pool: &PgPool,
    candidate: &NewTrendCandidate,
) -> Result<TrendCandidateRow, DbError> {
    let sql = format!(
        "INSERT INTO trend_candidates \
           (term, term_type, platform, detected_at, current_frequency, baseline_frequency, \
            acceleration_score, z_score, total_engagement, distinct_authors, \
            base_trend_score, trend_score, example_refs) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11, $12) \
         RETURNING {CANDIDATE_COLUMNS}"
    );
    Ok(sqlx::query_as::<_, TrendCandidateRow>(&sql)
        .bind(&candidate.term)
        .bind(candidate.term_type.as_str())
        .bind(candidate.platform.as_str())
        .bind(candidate.detected_at)
        .bind(candidate.current_frequency)
        .bind(candidate.baseline_frequency)
        .bind(candidate.acceleration_score)
        .bind(candidate.z_score)
        .bind(candidate.total_engagement)
        .bind(candidate.distinct_authors)
        .bind(candidate.trend_score)
        .bind(Json(&candidate.example_refs))
        .fetch_one(pool)
        .await?)
}

/// Candidates for a term across all platforms, optionally limited to those
/// detected at or after `since`.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_trend_candidates_for_term(
    pool: &PgPool,
    term: &str,
    term_type: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<TrendCandidateRow>, DbError> {
    let sql = format!(
        "SELECT {CANDIDATE_COLUMNS} FROM trend_candidates \
         WHERE term = $1 AND term_type = $2 \
           AND ($3::TIMESTAMPTZ IS NULL OR detected_at >= $3) \
         ORDER BY id"
    );
    Ok(sqlx::query_as::<_, TrendCandidateRow>(&sql)
        .bind(term)
        .bind(term_type)
        .bind(since)
        .fetch_all(pool)
        .await?)
}

/// Mark every candidate for a term as cross-platform and rescale its score.
///
/// `trend_score` is always derived from `base_trend_score`, so applying the
/// same multiplier twice leaves the score unchanged. Returns the number of
/// rows updated.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn apply_cross_platform_boost(
    pool: &PgPool,
    term: &str,
    term_type: &str,
    platforms_seen: &str,
    multiplier: f64,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE trend_candidates SET \
           cross_platform = TRUE, \
           platforms_seen = $3, \
           trend_score = base_trend_score * $4 \
         WHERE term = $1 AND term_type = $2",
    )
    .bind(term)
    .bind(term_type)
    .bind(platforms_seen)
    .bind(multiplier)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Candidates detected at or after `since`, highest score first.
///
/// # Errors
///
/// Returns `DbError` on database query failure.
pub async fn list_recent_trend_candidates(
    pool: &PgPool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<TrendCandidateRow>, DbError> {
    let sql = format!(
        "SELECT {CANDIDATE_COLUMNS} FROM trend_candidates \
         WHERE detected_at >= $1 \
         ORDER BY trend_score DESC, id \
         LIMIT $2"
    );
    Ok(sqlx::query_as::<_, TrendCandidateRow>(&sql)
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}
