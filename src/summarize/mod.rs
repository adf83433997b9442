//! Summarization dispatch.
//!
//! Routes transcript + title to one of a closed set of interchangeable AI
//! providers, each with its own credential, model, and endpoint. The
//! dispatcher never raises an unclassified error: a missing credential
//! yields [`SummaryOutcome::Unavailable`] without a network call, a slow
//! provider yields a `Timeout` distinct from a provider failure.

mod providers;

pub use providers::{DeepseekProvider, OpenAiProvider};

use crate::config::SummarySettings;
use crate::error::{Result, YouLearnError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

const SYSTEM_PROMPT: &str = "You are an expert at summarizing video content. \
    Create a comprehensive summary of the following video transcript.";

/// Closed provider set selectable by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryProvider {
    OpenAi,
    Deepseek,
}

impl std::str::FromStr for SummaryProvider {
    type Err = YouLearnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(SummaryProvider::OpenAi),
            "deepseek" => Ok(SummaryProvider::Deepseek),
            other => Err(YouLearnError::Config(format!(
                "Unknown summary provider: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SummaryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryProvider::OpenAi => write!(f, "openai"),
            SummaryProvider::Deepseek => write!(f, "deepseek"),
        }
    }
}

/// One AI completion capability.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable capability name for error messages.
    fn name(&self) -> &'static str;

    /// Whether a credential is configured. Checked before any network call.
    fn has_credential(&self) -> bool;

    /// Run one completion with the given prompts and sampling parameters.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;
}

/// Result of a summarization request. `Unavailable` is an answer, not an
/// error; the job that asked for it still completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Summary(String),
    Unavailable(String),
}

/// Dispatcher over the configured providers.
pub struct Summarizer {
    providers: HashMap<SummaryProvider, Arc<dyn CompletionProvider>>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(
        providers: HashMap<SummaryProvider, Arc<dyn CompletionProvider>>,
        settings: &SummarySettings,
    ) -> Self {
        Self {
            providers,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Summarize `transcript` with the selected provider.
    #[instrument(skip(self, transcript), fields(provider = %provider))]
    pub async fn summarize(
        &self,
        provider: SummaryProvider,
        title: &str,
        transcript: &str,
    ) -> Result<SummaryOutcome> {
        let backend = match self.providers.get(&provider) {
            Some(backend) => backend,
            None => {
                return Ok(SummaryOutcome::Unavailable(format!(
                    "Summary provider {} is not configured.",
                    provider
                )))
            }
        };

        if !backend.has_credential() {
            info!("No credential for {}; skipping summary", backend.name());
            return Ok(SummaryOutcome::Unavailable(
                YouLearnError::CredentialMissing(backend.name()).to_string(),
            ));
        }

        let user_prompt = format!(
            "Title: {}\n\nTranscript:\n{}\n\nPlease provide a detailed summary of this \
             video's content, highlighting the main points, key insights, and important details.",
            title, transcript
        );

        let completion = tokio::time::timeout(
            self.timeout,
            backend.complete(SYSTEM_PROMPT, &user_prompt, self.max_tokens, self.temperature),
        )
        .await;

        match completion {
            Ok(Ok(text)) => {
                info!("Summary generation complete");
                Ok(SummaryOutcome::Summary(text))
            }
            Ok(Err(err)) => Err(YouLearnError::Summarization(err.to_string())),
            Err(_) => Err(YouLearnError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubProvider {
        credential: bool,
        calls: AtomicU32,
        delay: Duration,
        response: Result<&'static str>,
    }

    impl StubProvider {
        fn ok(credential: bool) -> Arc<Self> {
            Arc::new(Self {
                credential,
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
                response: Ok("a summary"),
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                credential: true,
                calls: AtomicU32::new(0),
                delay,
                response: Ok("too late"),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for StubProvider {
        fn name(&self) -> &'static str {
            "Stub"
        }

        fn has_credential(&self) -> bool {
            self.credential
        }

        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match &self.response {
                Ok(text) => Ok(text.to_string()),
                Err(_) => Err(YouLearnError::Summarization("provider error".into())),
            }
        }
    }

    fn summarizer(provider: Arc<StubProvider>) -> Summarizer {
        let mut providers: HashMap<SummaryProvider, Arc<dyn CompletionProvider>> = HashMap::new();
        providers.insert(SummaryProvider::OpenAi, provider);
        Summarizer::new(providers, &SummarySettings::default())
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        let stub = StubProvider::ok(false);
        let outcome = summarizer(stub.clone())
            .summarize(SummaryProvider::OpenAi, "Title", "text")
            .await
            .unwrap();
        assert!(matches!(outcome, SummaryOutcome::Unavailable(_)));
        // Zero network calls.
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_unavailable() {
        let outcome = summarizer(StubProvider::ok(true))
            .summarize(SummaryProvider::Deepseek, "Title", "text")
            .await
            .unwrap();
        assert!(matches!(outcome, SummaryOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_successful_summary() {
        let stub = StubProvider::ok(true);
        let outcome = summarizer(stub.clone())
            .summarize(SummaryProvider::OpenAi, "Title", "text")
            .await
            .unwrap();
        assert_eq!(outcome, SummaryOutcome::Summary("a summary".into()));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_reports_timeout() {
        let stub = StubProvider::slow(Duration::from_secs(120));
        let result = summarizer(stub)
            .summarize(SummaryProvider::OpenAi, "Title", "text")
            .await;
        assert!(matches!(result, Err(YouLearnError::Timeout(60))));
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!(
            "OpenAI".parse::<SummaryProvider>().unwrap(),
            SummaryProvider::OpenAi
        );
        assert_eq!(
            "deepseek".parse::<SummaryProvider>().unwrap(),
            SummaryProvider::Deepseek
        );
        assert!("claude".parse::<SummaryProvider>().is_err());
    }
}
