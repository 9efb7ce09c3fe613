//! Normalized content records produced by the acquisition layer.
//!
//! The engine treats these as read-only inputs. Platform-specific payloads
//! ride along in [`Post::metadata`] untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Tiktok,
    Instagram,
    Reddit,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Twitter,
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Reddit,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Reddit => "reddit",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" | "x" => Ok(Platform::Twitter),
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            "reddit" => Ok(Platform::Reddit),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}

/// A post, video, or submission. `(platform, external_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub platform: Platform,
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
    /// Reddit only.
    pub upvote_ratio: Option<f64>,
    /// Reddit only.
    pub subreddit: Option<String>,
    /// Tags as supplied; see [`crate::normalize_hashtag`] for the matching key.
    pub hashtags: Vec<String>,
    pub metadata: Value,
}

/// A comment on a [`Post`].
///
/// `platform` and `post_permalink` are denormalized from the parent post so
/// detectors can group without a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub platform: Platform,
    pub post_permalink: Option<String>,
    pub author: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub text: Option<String>,
    /// Matching key; see [`crate::normalize_comment_text`].
    pub normalized_text: Option<String>,
    pub score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Gif,
}

impl MediaType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Gif => "gif",
        }
    }
}

impl FromStr for MediaType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "gif" => Ok(MediaType::Gif),
            other => Err(CoreError::UnknownMediaType(other.to_string())),
        }
    }
}

/// A media attachment joined with the parent post fields detectors need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub post_id: i64,
    pub platform: Platform,
    pub media_url: String,
    pub media_type: MediaType,
    /// `None` until hashed. An empty string marks media that can never be
    /// hashed and is excluded from template grouping.
    pub image_hash: Option<String>,
    pub post_engagement: f64,
    pub post_collected_at: DateTime<Utc>,
}

impl Media {
    /// The usable perceptual hash, if any.
    #[must_use]
    pub fn usable_hash(&self) -> Option<&str> {
        self.image_hash.as_deref().filter(|h| !h.is_empty())
    }
}
