use chrono::{DateTime, Utc};
use memeradar_core::{NewCreatorStats, Post};

use super::scorer::explicit_views;

/// Rolling snapshot over a creator's most recent posts.
///
/// Views are taken only from explicit platform counts; posts without one
/// contribute zero views and are left out of the engagement-rate mean.
/// Returns `None` when there are no posts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_creator_stats(
    creator_id: i64,
    posts: &[Post],
    computed_at: DateTime<Utc>,
) -> Option<NewCreatorStats> {
    if posts.is_empty() {
        return None;
    }

    let views: Vec<f64> = posts
        .iter()
        .map(|p| explicit_views(&p.metadata).unwrap_or(0) as f64)
        .collect();
    let engagement_rates: Vec<f64> = posts
        .iter()
        .zip(&views)
        .filter(|(_, v)| **v > 0.0)
        .map(|(p, v)| (p.likes + p.comments_count + p.shares) as f64 / v)
        .collect();

    Some(NewCreatorStats {
        creator_id,
        computed_at,
        videos_analyzed: i64::try_from(posts.len()).unwrap_or(i64::MAX),
        avg_views: mean(&views),
        median_views: median(&views),
        avg_engagement_rate: mean(&engagement_rates),
        avg_likes: mean_of(posts, |p| p.likes),
        avg_comments: mean_of(posts, |p| p.comments_count),
        avg_shares: mean_of(posts, |p| p.shares),
    })
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_of(posts: &[Post], field: impl Fn(&Post) -> i64) -> f64 {
    let values: Vec<f64> = posts.iter().map(|p| field(p) as f64).collect();
    mean(&values)
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use memeradar_core::Platform;
    use serde_json::{json, Value};

    fn post(likes: i64, comments: i64, shares: i64, metadata: Value) -> Post {
        Post {
            id: likes,
            platform: Platform::Tiktok,
            external_id: likes.to_string(),
            author: Some("creator".to_string()),
            created_at: None,
            collected_at: Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap(),
            text: None,
            permalink: None,
            likes,
            shares,
            comments_count: comments,
            engagement_score: 0.0,
            upvote_ratio: None,
            subreddit: None,
            hashtags: Vec::new(),
            metadata,
        }
    }

    #[test]
    fn empty_history_has_no_snapshot() {
        assert!(compute_creator_stats(1, &[], Utc::now()).is_none());
    }

    #[test]
    fn engagement_rate_ignores_posts_without_views() {
        let posts = vec![
            post(100, 10, 10, json!({"views": 1_000})),
            post(300, 30, 30, json!({"play_count": 3_000})),
            post(500, 0, 0, Value::Null),
        ];
        let stats = compute_creator_stats(9, &posts, Utc::now()).unwrap();

        assert_eq!(stats.videos_analyzed, 3);
        assert!((stats.avg_views - 4_000.0 / 3.0).abs() < 1e-9);
        assert!((stats.median_views - 1_000.0).abs() < f64::EPSILON);
        assert!((stats.avg_engagement_rate - 0.12).abs() < 1e-9);
        assert!((stats.avg_likes - 300.0).abs() < f64::EPSILON);
        assert!((stats.avg_comments - 40.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn median_of_even_count_averages_the_middle() {
        assert!((median(&[4.0, 1.0, 3.0, 2.0]) - 2.5).abs() < f64::EPSILON);
    }
}
