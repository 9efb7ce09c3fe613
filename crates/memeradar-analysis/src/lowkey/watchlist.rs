//! Watchlist transitions: none to active on first qualification, active to
//! dropped after a quiet period, dropped back to active on requalification.

use chrono::{DateTime, Duration, Utc};
use memeradar_core::{HotVideo, WatchlistEntry, WatchlistStatus};

/// The entry after `video` qualifies, and whether it is new.
#[must_use]
pub fn apply_qualification(
    existing: Option<WatchlistEntry>,
    video: &HotVideo,
    now: DateTime<Utc>,
) -> (WatchlistEntry, bool) {
    match existing {
        Some(mut entry) => {
            entry.last_qualified_at = now;
            entry.status = WatchlistStatus::Active;
            entry.qualifying_video_count += 1;
            entry.max_virality_ratio = entry.max_virality_ratio.max(video.virality_ratio);
            entry.max_spike_factor = entry.max_spike_factor.max(video.spike_factor);
            entry.max_meme_seed_score = entry.max_meme_seed_score.max(video.meme_seed_score);
            (entry, false)
        }
        None => (
            WatchlistEntry {
                creator_id: video.creator_id,
                status: WatchlistStatus::Active,
                first_qualified_at: now,
                last_qualified_at: now,
                max_virality_ratio: video.virality_ratio,
                max_spike_factor: video.spike_factor,
                max_meme_seed_score: video.meme_seed_score,
                qualifying_video_count: 1,
            },
            true,
        ),
    }
}

/// Active entries last qualified before this instant are dropped.
#[must_use]
pub fn stale_cutoff(now: DateTime<Utc>, drop_days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(drop_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).unwrap()
    }

    fn video(virality: f64, spike: f64, score: f64) -> HotVideo {
        HotVideo {
            id: 1,
            post_id: 1,
            creator_id: 42,
            detected_at: at(1),
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            virality_ratio: virality,
            engagement_rate: 0.0,
            comment_intensity: 0.0,
            spike_factor: spike,
            likes_to_views: 0.0,
            shares_to_likes: 0.0,
            discourse_signal: false,
            meme_seed_score: score,
        }
    }

    #[test]
    fn first_qualification_seeds_maxima() {
        let (entry, added) = apply_qualification(None, &video(45.0, 1.0, 0.3), at(1));
        assert!(added);
        assert_eq!(entry.creator_id, 42);
        assert_eq!(entry.status, WatchlistStatus::Active);
        assert_eq!(entry.qualifying_video_count, 1);
        assert!((entry.max_virality_ratio - 45.0).abs() < f64::EPSILON);
        assert_eq!(entry.first_qualified_at, entry.last_qualified_at);
    }

    #[test]
    fn requalification_reactivates_and_keeps_maxima() {
        let (mut entry, _) = apply_qualification(None, &video(45.0, 1.0, 0.3), at(1));
        entry.status = WatchlistStatus::Dropped;

        let (entry, added) = apply_qualification(Some(entry), &video(20.0, 6.0, 0.5), at(9));
        assert!(!added);
        assert_eq!(entry.status, WatchlistStatus::Active);
        assert_eq!(entry.qualifying_video_count, 2);
        assert_eq!(entry.first_qualified_at, at(1));
        assert_eq!(entry.last_qualified_at, at(9));
        assert!((entry.max_virality_ratio - 45.0).abs() < f64::EPSILON);
        assert!((entry.max_spike_factor - 6.0).abs() < f64::EPSILON);
        assert!((entry.max_meme_seed_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn cutoff_is_drop_days_before_now() {
        assert_eq!(stale_cutoff(at(31), 30), at(1));
    }
}
