//! Speech-to-text fallback.
//!
//! Converts a downloaded [`AudioAsset`] into transcript text via the OpenAI
//! Whisper API. The asset is consumed by value and dropped on every exit
//! path, so the temporary file never outlives the transcription attempt.

use crate::audio::AudioAsset;
use crate::error::{Result, YouLearnError};
use crate::transcript::{TranscriptResult, TranscriptSource};
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, instrument};

/// Speech-to-text provider seam.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe the audio file at `path` and return plain text.
    async fn transcribe(&self, path: &Path) -> Result<String>;
}

/// Whisper API transcriber.
pub struct WhisperStt {
    api_key: Option<String>,
    model: String,
    language: Option<String>,
}

impl WhisperStt {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: "whisper-1".to_string(),
            language: None,
        }
    }

    /// Set an ISO-639-1 language hint passed along with the audio. Whisper
    /// detects the language on its own, but a hint improves accuracy and
    /// latency when the expected language is known.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

#[async_trait]
impl SpeechToText for WhisperStt {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn transcribe(&self, path: &Path) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(YouLearnError::CredentialMissing("OpenAI"))?;

        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));

        let file_bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let mut builder = CreateTranscriptionRequestArgs::default();
        builder
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model);
        if let Some(language) = &self.language {
            builder.language(language);
        }
        let request = builder
            .build()
            .map_err(|e| YouLearnError::Transcription(format!("request build: {}", e)))?;

        let response = client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| YouLearnError::Transcription(format!("Whisper API error: {}", e)))?;

        info!("Audio transcription complete");
        Ok(response.text)
    }
}

/// Transcribe and consume an audio asset.
///
/// The asset drops before this function returns, success or not, which
/// deletes the underlying file.
pub async fn transcribe_asset(
    stt: &dyn SpeechToText,
    asset: AudioAsset,
) -> Result<TranscriptResult> {
    let outcome = stt.transcribe(asset.path()).await;
    drop(asset);

    let text = outcome?;
    if text.trim().is_empty() {
        return Err(YouLearnError::Transcription(
            "speech-to-text returned empty text".into(),
        ));
    }

    Ok(TranscriptResult {
        text,
        source: TranscriptSource::SpeechToText,
        language: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AcquisitionConfig, AcquisitionEngine, AttemptContext, AudioDownloader};
    use crate::reference::VideoId;
    use std::sync::Arc;

    struct WritingDownloader;

    #[async_trait]
    impl AudioDownloader for WritingDownloader {
        async fn download(
            &self,
            _id: &VideoId,
            _ctx: &AttemptContext,
            dest: &Path,
        ) -> Result<()> {
            tokio::fs::write(dest, b"pretend-audio").await?;
            Ok(())
        }
    }

    struct FixedStt(Result<String>);

    #[async_trait]
    impl SpeechToText for FixedStt {
        async fn transcribe(&self, _path: &Path) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(YouLearnError::Transcription("provider down".into())),
            }
        }
    }

    async fn make_asset(temp: &Path) -> AudioAsset {
        let engine = AcquisitionEngine::new(
            Arc::new(WritingDownloader),
            AcquisitionConfig::new(temp.to_path_buf()),
        );
        engine
            .acquire(&VideoId::parse("abcdefghijk").unwrap())
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_asset_deleted_after_success() {
        let temp = tempfile::tempdir().unwrap();
        let asset = make_asset(temp.path()).await;
        let path = asset.path().to_path_buf();

        let stt = FixedStt(Ok("hello world".into()));
        let result = transcribe_asset(&stt, asset).await.unwrap();
        assert_eq!(result.text, "hello world");
        assert_eq!(result.source, TranscriptSource::SpeechToText);
        assert!(!path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_asset_deleted_after_provider_failure() {
        let temp = tempfile::tempdir().unwrap();
        let asset = make_asset(temp.path()).await;
        let path = asset.path().to_path_buf();

        let stt = FixedStt(Err(YouLearnError::Transcription("x".into())));
        let result = transcribe_asset(&stt, asset).await;
        assert!(matches!(result, Err(YouLearnError::Transcription(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_language_hint_defaults_off() {
        let stt = WhisperStt::new(Some("sk-test".into()));
        assert_eq!(stt.language(), None);

        let stt = stt.with_language(Some("en".into()));
        assert_eq!(stt.language(), Some("en"));
    }

    #[tokio::test]
    async fn test_missing_credential_is_reported() {
        let stt = WhisperStt::new(None);
        let result = stt.transcribe(Path::new("/tmp/nope.mp3")).await;
        assert!(matches!(
            result,
            Err(YouLearnError::CredentialMissing("OpenAI"))
        ));
    }
}
