use super::*;
use crate::store::MemoryStore;
use chrono::TimeZone;
use memeradar_core::{Comment, Platform, Post};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
}

fn enabled() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.lowkey.enabled = true;
    config
}

fn video(id: i64, platform: Platform, author: &str, likes: i64, comments: i64, shares: i64) -> Post {
    Post {
        id,
        platform,
        external_id: id.to_string(),
        author: Some(author.to_string()),
        created_at: Some(now() - Duration::hours(3)),
        collected_at: now() - Duration::hours(1),
        text: Some("pov: the cat understood the assignment".to_string()),
        permalink: Some(format!("https://www.tiktok.com/@{author}/video/{id}")),
        likes,
        shares,
        comments_count: comments,
        engagement_score: 0.0,
        upvote_ratio: None,
        subreddit: None,
        hashtags: Vec::new(),
        metadata: serde_json::Value::Null,
    }
}

fn comment(id: i64, post_id: i64, author: &str, text: &str) -> Comment {
    Comment {
        id,
        post_id,
        platform: Platform::Tiktok,
        post_permalink: None,
        author: Some(author.to_string()),
        collected_at: now() - Duration::minutes(30),
        text: Some(text.to_string()),
        normalized_text: None,
        score: 3,
    }
}

#[tokio::test]
async fn small_creator_breakout_becomes_hot_video() {
    let store = MemoryStore::new();
    store.set_follower_count("smallcreator", 50_000, now());
    store.add_post(video(1, Platform::Tiktok, "smallcreator", 150_000, 9_000, 3_000));
    let analyzer = LowkeyAnalyzer::new(&enabled());

    let summary = analyzer.run(&store, now()).await.unwrap();
    assert_eq!(summary.videos_analyzed, 1);
    assert_eq!(summary.hot_videos_found, 1);
    assert_eq!(summary.watchlist_additions, 1);
    assert_eq!(summary.creators_updated, 1);

    let hot = store.hot_videos();
    assert_eq!(hot.len(), 1);
    assert_eq!(hot[0].views, 2_250_000);
    assert!((hot[0].virality_ratio - 45.0).abs() < 1e-9);
    assert!((hot[0].spike_factor - 1.0).abs() < f64::EPSILON);

    let stats = store.creator_stats(hot[0].creator_id);
    assert_eq!(stats.len(), 1);
    assert!((stats[0].avg_likes - 150_000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn rerun_leaves_hot_video_and_watchlist_untouched() {
    let store = MemoryStore::new();
    store.set_follower_count("smallcreator", 50_000, now());
    store.add_post(video(1, Platform::Tiktok, "smallcreator", 150_000, 9_000, 3_000));
    let analyzer = LowkeyAnalyzer::new(&enabled());

    analyzer.run(&store, now()).await.unwrap();
    let first = store.hot_videos();
    let second_summary = analyzer
        .run(&store, now() + Duration::minutes(30))
        .await
        .unwrap();

    assert_eq!(store.hot_videos(), first);
    assert_eq!(second_summary.watchlist_additions, 0);
    let entry = store
        .watchlist_entry(first[0].creator_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.qualifying_video_count, 1);
}

#[tokio::test]
async fn existing_hot_video_is_not_rescored() {
    let store = MemoryStore::new();
    store.add_post(video(1, Platform::Tiktok, "newcreator", 150_000, 9_000, 3_000));
    let analyzer = LowkeyAnalyzer::new(&enabled());
    analyzer.run(&store, now()).await.unwrap();
    let before = store.hot_videos();

    // Later engagement changes do not alter the recorded video.
    let scorer = LowkeyScorer::new(enabled().lowkey);
    let creator = store.get_or_create_creator("newcreator", now()).await.unwrap();
    let bumped = video(1, Platform::Tiktok, "newcreator", 900_000, 9_000, 3_000);
    let metrics = scorer.qualify(&bumped, &creator, None).unwrap();
    let returned = store
        .insert_hot_video(&scorer.hot_video(&bumped, &creator, &metrics, now()))
        .await
        .unwrap();

    assert_eq!(returned, before[0]);
    assert_eq!(store.hot_videos(), before);
}

#[tokio::test]
async fn large_accounts_and_other_platforms_are_skipped() {
    let store = MemoryStore::new();
    store.set_follower_count("celebrity", 5_000_000, now());
    store.add_post(video(1, Platform::Tiktok, "celebrity", 2_000_000, 9_000, 3_000));
    store.add_post(video(2, Platform::Instagram, "smallcreator", 150_000, 9_000, 3_000));
    let analyzer = LowkeyAnalyzer::new(&enabled());

    let summary = analyzer.run(&store, now()).await.unwrap();
    assert_eq!(summary.videos_analyzed, 1);
    assert_eq!(summary.hot_videos_found, 0);
    assert!(store.hot_videos().is_empty());
}

#[tokio::test]
async fn stale_watchlist_entries_are_dropped() {
    let store = MemoryStore::new();
    let creator = store.get_or_create_creator("faded", now()).await.unwrap();
    store
        .save_watchlist_entry(&WatchlistEntry {
            creator_id: creator.id,
            status: WatchlistStatus::Active,
            first_qualified_at: now() - Duration::days(60),
            last_qualified_at: now() - Duration::days(40),
            max_virality_ratio: 20.0,
            max_spike_factor: 4.0,
            max_meme_seed_score: 0.4,
            qualifying_video_count: 2,
        })
        .await
        .unwrap();
    let analyzer = LowkeyAnalyzer::new(&enabled());

    let summary = analyzer.run(&store, now()).await.unwrap();
    assert_eq!(summary.watchlist_dropped, 1);
    let dropped = store
        .list_watchlist(Some(WatchlistStatus::Dropped), 10)
        .await
        .unwrap();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].creator_id, creator.id);
}

#[tokio::test]
async fn hot_video_comments_feed_phrase_tracking() {
    let store = MemoryStore::new();
    store.add_post(video(1, Platform::Tiktok, "smallcreator", 150_000, 9_000, 3_000));
    for (i, author) in ["a", "b", "c"].iter().enumerate() {
        let id = i64::try_from(i).unwrap() + 10;
        store.add_comment(comment(id, 1, author, "the way he looked back 😭"));
    }
    store.add_comment(comment(20, 1, "d", "cute"));
    let analyzer = LowkeyAnalyzer::new(&enabled());

    let summary = analyzer.run(&store, now()).await.unwrap();
    assert_eq!(summary.phrases_detected, 1);
    let phrase = store
        .comment_phrase("the way he looked back 😭")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(phrase.total_occurrences, 3);
    assert_eq!(phrase.distinct_commenters, 3);
}

#[tokio::test]
async fn top_creators_lists_best_videos() {
    let store = MemoryStore::new();
    store.set_follower_count("smallcreator", 50_000, now());
    store.add_post(video(1, Platform::Tiktok, "smallcreator", 150_000, 9_000, 3_000));
    store.add_post(video(2, Platform::Tiktok, "smallcreator", 400_000, 30_000, 9_000));
    let analyzer = LowkeyAnalyzer::new(&enabled());
    analyzer.run(&store, now()).await.unwrap();

    let top = analyzer.top_creators(&store, 10).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].creator.handle, "smallcreator");
    assert_eq!(top[0].entry.qualifying_video_count, 2);
    assert_eq!(top[0].hot_videos.len(), 2);
    assert!(top[0].hot_videos[0].meme_seed_score >= top[0].hot_videos[1].meme_seed_score);
}
