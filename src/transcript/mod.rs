//! Transcript acquisition.
//!
//! Three strategies tried in order, short-circuiting on first success:
//!
//! 1. Fetch captions restricted to the preferred language list.
//! 2. Fetch captions with automatic language selection.
//! 3. Enumerate every available caption track and fetch the first one.
//!
//! `NotAvailable` moves the chain to the next strategy without retrying;
//! transient failures go through the retry/backoff engine first. When all
//! strategies are exhausted the chain returns `Ok(None)` so the caller can
//! fall through to audio acquisition.

mod youtube;

pub use youtube::YoutubeCaptionClient;

use crate::error::{Result, YouLearnError};
use crate::reference::VideoId;
use crate::retry::{retry_with_backoff, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptSource {
    /// Captions fetched in one of the preferred languages.
    PreferredCaptions,
    /// Captions fetched with automatic language selection.
    AutoCaptions,
    /// First track found by enumerating everything available.
    ListedCaptions,
    /// Produced by the speech-to-text fallback.
    SpeechToText,
}

/// A retrieved transcript with its provenance.
#[derive(Debug, Clone)]
pub struct TranscriptResult {
    pub text: String,
    pub source: TranscriptSource,
    pub language: Option<String>,
}

/// Caption text for one track, segments already joined in order.
#[derive(Debug, Clone)]
pub struct CaptionTranscript {
    pub text: String,
    pub language: Option<String>,
}

/// One fetchable caption track.
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    pub language: Option<String>,
    /// Service-specific locator for the track's payload.
    pub url: String,
}

/// Caption service seam. The production implementation talks to YouTube;
/// tests substitute scripted services.
#[async_trait]
pub trait TranscriptService: Send + Sync {
    /// Fetch a transcript restricted to `languages`, in preference order.
    async fn fetch(&self, id: &VideoId, languages: &[String]) -> Result<CaptionTranscript>;

    /// Fetch a transcript letting the service pick the language.
    async fn fetch_any(&self, id: &VideoId) -> Result<CaptionTranscript>;

    /// Enumerate all caption tracks available for `id`.
    async fn list_tracks(&self, id: &VideoId) -> Result<Vec<CaptionTrack>>;

    /// Fetch the payload of one enumerated track.
    async fn fetch_track(&self, id: &VideoId, track: &CaptionTrack) -> Result<CaptionTranscript>;
}

/// Ordered fallback chain over a [`TranscriptService`].
pub struct TranscriptChain {
    service: Arc<dyn TranscriptService>,
    preferred_languages: Vec<String>,
    retry: RetryPolicy,
}

impl TranscriptChain {
    pub fn new(
        service: Arc<dyn TranscriptService>,
        preferred_languages: Vec<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            service,
            preferred_languages,
            retry,
        }
    }

    /// Run the strategies in order. `Ok(None)` means every strategy reported
    /// the transcript as unavailable; that is the cue for audio acquisition,
    /// not an error.
    #[instrument(skip(self), fields(video_id = %id))]
    pub async fn fetch(&self, id: &VideoId) -> Result<Option<TranscriptResult>> {
        // Strategy 1: preferred languages.
        match retry_with_backoff(self.retry, "captions (preferred languages)", |_| {
            self.service.fetch(id, &self.preferred_languages)
        })
        .await
        {
            Ok(caption) => {
                info!("Captions found in preferred language");
                return Ok(Some(TranscriptResult {
                    text: caption.text,
                    source: TranscriptSource::PreferredCaptions,
                    language: caption.language,
                }));
            }
            Err(err) => log_strategy_miss("preferred languages", &err)?,
        }

        // Strategy 2: automatic language selection.
        match retry_with_backoff(self.retry, "captions (auto language)", |_| {
            self.service.fetch_any(id)
        })
        .await
        {
            Ok(caption) => {
                info!("Captions found via automatic language selection");
                return Ok(Some(TranscriptResult {
                    text: caption.text,
                    source: TranscriptSource::AutoCaptions,
                    language: caption.language,
                }));
            }
            Err(err) => log_strategy_miss("auto language", &err)?,
        }

        // Strategy 3: take the first track the service enumerates, with no
        // language preference.
        match retry_with_backoff(self.retry, "captions (track listing)", |_| async {
            let tracks = self.service.list_tracks(id).await?;
            let first = tracks
                .first()
                .ok_or_else(|| YouLearnError::NotAvailable("no caption tracks listed".into()))?;
            self.service.fetch_track(id, first).await
        })
        .await
        {
            Ok(caption) => {
                info!(language = ?caption.language, "Captions found via track listing");
                Ok(Some(TranscriptResult {
                    text: caption.text,
                    source: TranscriptSource::ListedCaptions,
                    language: caption.language,
                }))
            }
            Err(err) => {
                log_strategy_miss("track listing", &err)?;
                info!("All caption strategies exhausted; no transcript");
                Ok(None)
            }
        }
    }
}

/// Availability misses and persistent transient failures are logged and
/// skipped so the next strategy can run; anything else aborts the chain.
fn log_strategy_miss(strategy: &str, err: &YouLearnError) -> Result<()> {
    match err {
        YouLearnError::NotAvailable(_) | YouLearnError::Transient(_) | YouLearnError::Http(_) => {
            info!("No captions via {}: {}", strategy, err);
            Ok(())
        }
        YouLearnError::InvalidReference(s) => Err(YouLearnError::InvalidReference(s.clone())),
        YouLearnError::CredentialMissing(c) => Err(YouLearnError::CredentialMissing(c)),
        other => Err(YouLearnError::Transient(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        fetch: AtomicU32,
        fetch_any: AtomicU32,
        list: AtomicU32,
        fetch_track: AtomicU32,
    }

    /// Scripted service: each strategy either yields captions or a
    /// NotAvailable miss.
    struct ScriptedService {
        counters: Counters,
        preferred: Option<&'static str>,
        auto: Option<&'static str>,
        listed: Option<&'static str>,
    }

    impl ScriptedService {
        fn new(
            preferred: Option<&'static str>,
            auto: Option<&'static str>,
            listed: Option<&'static str>,
        ) -> Arc<Self> {
            Arc::new(Self {
                counters: Counters::default(),
                preferred,
                auto,
                listed,
            })
        }
    }

    fn ok(text: &str) -> Result<CaptionTranscript> {
        Ok(CaptionTranscript {
            text: text.to_string(),
            language: Some("en".to_string()),
        })
    }

    fn miss() -> Result<CaptionTranscript> {
        Err(YouLearnError::NotAvailable("captions disabled".into()))
    }

    #[async_trait]
    impl TranscriptService for ScriptedService {
        async fn fetch(&self, _id: &VideoId, _langs: &[String]) -> Result<CaptionTranscript> {
            self.counters.fetch.fetch_add(1, Ordering::SeqCst);
            self.preferred.map_or_else(miss, ok)
        }

        async fn fetch_any(&self, _id: &VideoId) -> Result<CaptionTranscript> {
            self.counters.fetch_any.fetch_add(1, Ordering::SeqCst);
            self.auto.map_or_else(miss, ok)
        }

        async fn list_tracks(&self, _id: &VideoId) -> Result<Vec<CaptionTrack>> {
            self.counters.list.fetch_add(1, Ordering::SeqCst);
            match self.listed {
                Some(_) => Ok(vec![CaptionTrack {
                    language: Some("de".to_string()),
                    url: "track-0".to_string(),
                }]),
                None => Err(YouLearnError::NotAvailable("transcripts disabled".into())),
            }
        }

        async fn fetch_track(
            &self,
            _id: &VideoId,
            _track: &CaptionTrack,
        ) -> Result<CaptionTranscript> {
            self.counters.fetch_track.fetch_add(1, Ordering::SeqCst);
            self.listed.map_or_else(miss, ok)
        }
    }

    fn chain(service: Arc<ScriptedService>) -> TranscriptChain {
        TranscriptChain::new(
            service,
            vec!["en".to_string(), "it".to_string()],
            RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
            },
        )
    }

    fn id() -> VideoId {
        VideoId::parse("abcdefghijk").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_strategy_short_circuits() {
        let service = ScriptedService::new(Some("hello"), Some("x"), Some("y"));
        let result = chain(service.clone()).fetch(&id()).await.unwrap().unwrap();
        assert_eq!(result.text, "hello");
        assert_eq!(result.source, TranscriptSource::PreferredCaptions);
        assert_eq!(service.counters.fetch.load(Ordering::SeqCst), 1);
        assert_eq!(service.counters.fetch_any.load(Ordering::SeqCst), 0);
        assert_eq!(service.counters.list.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_through_to_auto_language() {
        let service = ScriptedService::new(None, Some("auto text"), None);
        let result = chain(service.clone()).fetch(&id()).await.unwrap().unwrap();
        assert_eq!(result.source, TranscriptSource::AutoCaptions);
        // NotAvailable is never retried.
        assert_eq!(service.counters.fetch.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_strategy_takes_first_listed_track() {
        let service = ScriptedService::new(None, None, Some("listed text"));
        let result = chain(service.clone()).fetch(&id()).await.unwrap().unwrap();
        assert_eq!(result.source, TranscriptSource::ListedCaptions);
        assert_eq!(service.counters.fetch_track.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_none_not_error() {
        let service = ScriptedService::new(None, None, None);
        let result = chain(service.clone()).fetch(&id()).await.unwrap();
        assert!(result.is_none());
        assert_eq!(service.counters.fetch.load(Ordering::SeqCst), 1);
        assert_eq!(service.counters.fetch_any.load(Ordering::SeqCst), 1);
        assert_eq!(service.counters.list.load(Ordering::SeqCst), 1);
    }
}
