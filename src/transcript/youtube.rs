//! YouTube caption service implementation.
//!
//! Scrapes the caption track list out of the watch page's embedded player
//! response and fetches the timedtext payload for a chosen track. Failures
//! are classified at this boundary: a page without caption tracks is
//! `NotAvailable`, network and rate problems are `Transient`.

use super::{CaptionTranscript, CaptionTrack, TranscriptService};
use crate::error::{Result, YouLearnError};
use crate::reference::VideoId;
use crate::transport::Transport;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

const CAPTION_TRACKS_MARKER: &str = "\"captionTracks\":";

/// Caption client over the YouTube watch page.
pub struct YoutubeCaptionClient {
    http: reqwest::Client,
}

impl YoutubeCaptionClient {
    /// Build a client carrying the given outbound identity.
    pub fn new(transport: &Transport, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: transport.http_client(request_timeout)?,
        })
    }

    /// Fetch the watch page and extract the caption track list.
    async fn caption_tracks(&self, id: &VideoId) -> Result<Vec<CaptionTrack>> {
        let response = self
            .http
            .get(id.watch_url())
            // Skip the cookie-consent interstitial served in some regions.
            .header("Cookie", "CONSENT=YES+1")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| YouLearnError::Transient(format!("watch page request: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(YouLearnError::Transient("rate limited by YouTube".into()));
        }
        if !response.status().is_success() {
            return Err(YouLearnError::Transient(format!(
                "watch page returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| YouLearnError::Transient(format!("watch page body: {}", e)))?;

        parse_caption_tracks(&body)
    }

    async fn fetch_payload(&self, track: &CaptionTrack) -> Result<CaptionTranscript> {
        debug!(language = ?track.language, "Fetching caption track");

        let response = self
            .http
            .get(&track.url)
            .send()
            .await
            .map_err(|e| YouLearnError::Transient(format!("timedtext request: {}", e)))?;

        if !response.status().is_success() {
            return Err(YouLearnError::Transient(format!(
                "timedtext returned {}",
                response.status()
            )));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| YouLearnError::Transient(format!("timedtext body: {}", e)))?;

        let text = parse_timedtext(&xml);
        if text.is_empty() {
            return Err(YouLearnError::NotAvailable("caption track is empty".into()));
        }

        Ok(CaptionTranscript {
            text,
            language: track.language.clone(),
        })
    }
}

#[async_trait]
impl TranscriptService for YoutubeCaptionClient {
    async fn fetch(&self, id: &VideoId, languages: &[String]) -> Result<CaptionTranscript> {
        let tracks = self.caption_tracks(id).await?;
        for wanted in languages {
            if let Some(track) = tracks.iter().find(|t| {
                t.language
                    .as_deref()
                    // "en-GB" satisfies a request for "en".
                    .is_some_and(|l| l == wanted || l.starts_with(&format!("{}-", wanted)))
            }) {
                return self.fetch_payload(track).await;
            }
        }
        Err(YouLearnError::NotAvailable(format!(
            "no captions in requested languages [{}]",
            languages.join(", ")
        )))
    }

    async fn fetch_any(&self, id: &VideoId) -> Result<CaptionTranscript> {
        let tracks = self.caption_tracks(id).await?;
        let track = tracks
            .first()
            .ok_or_else(|| YouLearnError::NotAvailable("no caption tracks".into()))?;
        self.fetch_payload(track).await
    }

    async fn list_tracks(&self, id: &VideoId) -> Result<Vec<CaptionTrack>> {
        self.caption_tracks(id).await
    }

    async fn fetch_track(&self, _id: &VideoId, track: &CaptionTrack) -> Result<CaptionTranscript> {
        self.fetch_payload(track).await
    }
}

/// Extract the `captionTracks` JSON array embedded in the watch page.
fn parse_caption_tracks(body: &str) -> Result<Vec<CaptionTrack>> {
    let start = match body.find(CAPTION_TRACKS_MARKER) {
        Some(pos) => pos + CAPTION_TRACKS_MARKER.len(),
        None => {
            return Err(YouLearnError::NotAvailable(
                "video has no caption tracks (transcripts disabled or absent)".into(),
            ))
        }
    };

    let array = extract_json_array(&body[start..]).ok_or_else(|| {
        YouLearnError::Transient("malformed captionTracks payload in watch page".into())
    })?;

    let values: Vec<serde_json::Value> = serde_json::from_str(array)
        .map_err(|e| YouLearnError::Transient(format!("captionTracks parse: {}", e)))?;

    let tracks: Vec<CaptionTrack> = values
        .iter()
        .filter_map(|v| {
            let url = v.get("baseUrl")?.as_str()?.to_string();
            Some(CaptionTrack {
                language: v
                    .get("languageCode")
                    .and_then(|l| l.as_str())
                    .map(|l| l.to_string()),
                url,
            })
        })
        .collect();

    if tracks.is_empty() {
        return Err(YouLearnError::NotAvailable("caption track list is empty".into()));
    }
    Ok(tracks)
}

/// Take the balanced `[...]` prefix of `input`, respecting JSON strings.
fn extract_json_array(input: &str) -> Option<&str> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Flatten a timedtext XML document into plain text, segments joined in
/// order with single spaces.
fn parse_timedtext(xml: &str) -> String {
    static TEXT_RE: OnceLock<Regex> = OnceLock::new();
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let text_re = TEXT_RE
        .get_or_init(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").expect("Invalid timedtext regex"));
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

    let segments: Vec<String> = text_re
        .captures_iter(xml)
        .map(|caps| {
            let inner = tag_re.replace_all(&caps[1], "");
            unescape_entities(inner.trim())
        })
        .filter(|s| !s.is_empty())
        .collect();

    segments.join(" ")
}

fn unescape_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
}
