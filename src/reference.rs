//! Video reference parsing.
//!
//! Turns free-text user input (URLs in several shapes, or a bare ID) into a
//! canonical [`VideoId`]. Pure and deterministic; no network access.

use crate::error::{Result, YouLearnError};
use regex::Regex;
use std::sync::OnceLock;

/// YouTube video IDs are always exactly 11 characters.
pub const VIDEO_ID_LEN: usize = 11;

/// Canonical identifier for one YouTube video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Parse free-text input into a canonical video ID.
    ///
    /// Applies the recognized reference shapes in order (watch URL,
    /// short-link, embed, shorts, bare ID) and takes the first match.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        for pattern in patterns() {
            if let Some(caps) = pattern.captures(input) {
                if let Some(m) = caps.get(1) {
                    return Ok(VideoId(m.as_str().to_string()));
                }
            }
        }
        Err(YouLearnError::InvalidReference(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered reference-shape matchers. Built once; the ID character class and
/// length are shared by every shape.
fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Canonical watch URL (also ?v= appearing later in the query)
            r"(?:youtube\.com/watch\?(?:[^#\s]*&)?v=)([a-zA-Z0-9_-]{11})",
            // Short link
            r"(?:youtu\.be/)([a-zA-Z0-9_-]{11})",
            // Embed / legacy /v/ URLs
            r"(?:youtube\.com/(?:embed|v)/)([a-zA-Z0-9_-]{11})",
            // Shorts
            r"(?:youtube\.com/shorts/)([a-zA-Z0-9_-]{11})",
            // Bare 11-character ID
            r"^([a-zA-Z0-9_-]{11})$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid reference pattern"))
        .collect()
    })
}
