use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

const DEFAULT_STOP_PHRASES: &[&str] = &[
    "lol",
    "lmao",
    "omg",
    "same",
    "me too",
    "so true",
    "this is so true",
    "i love this",
    "love this",
    "this is amazing",
    "so cute",
    "thank you",
    "thanks for sharing",
    "first",
    "who else",
];

const DEFAULT_EVERGREEN_HASHTAGS: &[&str] = &[
    "fyp",
    "foryou",
    "foryoupage",
    "viral",
    "trending",
    "meme",
    "memes",
    "funny",
    "love",
    "instagood",
    "explore",
    "tiktok",
    "reels",
    "photooftheday",
];

/// Stop-phrase and evergreen-hashtag lists used to seed the noise filter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoiseLists {
    #[serde(default)]
    pub stop_phrases: Vec<String>,
    #[serde(default)]
    pub evergreen_hashtags: Vec<String>,
}

impl Default for NoiseLists {
    fn default() -> Self {
        Self {
            stop_phrases: DEFAULT_STOP_PHRASES.iter().map(ToString::to_string).collect(),
            evergreen_hashtags: DEFAULT_EVERGREEN_HASHTAGS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Load and validate noise lists from a YAML file.
///
/// Entries are trimmed and lowercased; hashtags lose a leading `#`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or contains
/// blank entries.
pub fn load_noise_lists(path: &Path) -> Result<NoiseLists, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::NoiseFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_noise_lists(&content)
}

fn parse_noise_lists(content: &str) -> Result<NoiseLists, ConfigError> {
    let raw: NoiseLists = serde_yaml::from_str(content).map_err(ConfigError::NoiseFileParse)?;

    let stop_phrases = raw
        .stop_phrases
        .iter()
        .map(|p| clean_entry(p, "stop phrase"))
        .collect::<Result<Vec<_>, _>>()?;
    let evergreen_hashtags = raw
        .evergreen_hashtags
        .iter()
        .map(|t| clean_entry(t.trim().trim_start_matches('#'), "evergreen hashtag"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NoiseLists {
        stop_phrases,
        evergreen_hashtags,
    })
}

fn clean_entry(raw: &str, kind: &str) -> Result<String, ConfigError> {
    let cleaned = raw.trim().to_lowercase();
    if cleaned.is_empty() {
        return Err(ConfigError::Validation(format!("{kind} must be non-empty")));
    }
    Ok(cleaned)
}
