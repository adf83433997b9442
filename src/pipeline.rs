//! Pipeline orchestration.
//!
//! Drives one [`Job`] through extract → transcript chain → (audio →
//! speech-to-text) → summarize, under the concurrency governor and the
//! per-job wall-clock budget. Slot permits and audio assets are RAII
//! guards, so cancellation at any suspension point releases slots and
//! deletes partial artifacts without cleanup code on every path.

use crate::audio::{AcquisitionConfig, AcquisitionEngine, YtDlpDownloader};
use crate::config::Settings;
use crate::error::{Result, YouLearnError};
use crate::governor::{ConcurrencyGovernor, GovernorLimits, SlotCategory};
use crate::job::{Action, Job, JobState};
use crate::retry::RetryPolicy;
use crate::stt::{transcribe_asset, SpeechToText, WhisperStt};
use crate::summarize::{
    CompletionProvider, DeepseekProvider, OpenAiProvider, SummaryOutcome, SummaryProvider,
    Summarizer,
};
use crate::title::{fallback_title, TitleResolver, YtDlpTitleResolver};
use crate::transcript::{TranscriptChain, TranscriptResult, YoutubeCaptionClient};
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// What a finished job hands back to the front end.
#[derive(Debug)]
pub struct JobOutcome {
    pub title: String,
    pub transcript: TranscriptResult,
    /// Present only when the job asked for a summary.
    pub summary: Option<SummaryOutcome>,
}

/// The assembled acquisition/summarization pipeline.
pub struct Pipeline {
    governor: Arc<ConcurrencyGovernor>,
    chain: TranscriptChain,
    audio: AcquisitionEngine,
    stt: Arc<dyn SpeechToText>,
    summarizer: Summarizer,
    titles: Arc<dyn TitleResolver>,
    job_timeout: Duration,
    acquire_timeout: Duration,
}

impl Pipeline {
    /// Assemble the production pipeline from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let proxy_url = settings.proxy.url();

        let captions = YoutubeCaptionClient::new(
            &Transport::with_proxy(proxy_url.clone()),
            Duration::from_secs(settings.transcript.request_timeout_secs),
        )?;
        let chain = TranscriptChain::new(
            Arc::new(captions),
            settings.transcript.preferred_languages.clone(),
            RetryPolicy {
                max_attempts: settings.retry.max_attempts,
                base_delay: Duration::from_secs(settings.retry.base_delay_secs),
            },
        );

        let audio = AcquisitionEngine::new(
            Arc::new(YtDlpDownloader::new()),
            AcquisitionConfig {
                max_attempts: settings.acquisition.max_attempts,
                base_delay: Duration::from_secs(settings.acquisition.base_delay_secs),
                rate_limit: settings.acquisition.rate_limit_bytes,
                proxy_url: proxy_url.clone(),
                temp_dir: settings.temp_dir(),
            },
        );

        let stt = Arc::new(
            WhisperStt::new(settings.credentials.openai_api_key.clone())
                .with_language(settings.transcript.preferred_languages.first().cloned()),
        );

        let mut providers: HashMap<SummaryProvider, Arc<dyn CompletionProvider>> = HashMap::new();
        providers.insert(
            SummaryProvider::OpenAi,
            Arc::new(OpenAiProvider::new(
                settings.credentials.openai_api_key.clone(),
                settings.summary.openai_model.clone(),
            )),
        );
        providers.insert(
            SummaryProvider::Deepseek,
            Arc::new(DeepseekProvider::new(
                settings.credentials.deepseek_api_key.clone(),
                settings.summary.deepseek_model.clone(),
            )),
        );
        let summarizer = Summarizer::new(providers, &settings.summary);

        let titles = Arc::new(YtDlpTitleResolver::new(Transport::with_proxy(proxy_url)));

        let governor = Arc::new(ConcurrencyGovernor::new(GovernorLimits {
            transcript_fetch: settings.concurrency.transcript_fetch,
            summary_generate: settings.concurrency.summary_generate,
            global: settings.concurrency.global,
        }));

        Ok(Self {
            governor,
            chain,
            audio,
            stt,
            summarizer,
            titles,
            job_timeout: settings.job_timeout(),
            acquire_timeout: settings.acquire_timeout(),
        })
    }

    /// Assemble a pipeline from pre-built components.
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        governor: Arc<ConcurrencyGovernor>,
        chain: TranscriptChain,
        audio: AcquisitionEngine,
        stt: Arc<dyn SpeechToText>,
        summarizer: Summarizer,
        titles: Arc<dyn TitleResolver>,
        job_timeout: Duration,
        acquire_timeout: Duration,
    ) -> Self {
        Self {
            governor,
            chain,
            audio,
            stt,
            summarizer,
            titles,
            job_timeout,
            acquire_timeout,
        }
    }

    pub fn governor(&self) -> &ConcurrencyGovernor {
        &self.governor
    }

    /// Run a job to completion under its wall-clock budget.
    ///
    /// On expiry the in-flight stage future is dropped, which releases any
    /// held slot and removes any partial audio asset; the caller sees a
    /// distinct `Timeout` outcome.
    #[instrument(skip(self, job), fields(job_id = %job.id, video_id = %job.video_id))]
    pub async fn run(&self, job: &mut Job) -> Result<JobOutcome> {
        let budget = self.job_timeout;
        match tokio::time::timeout(budget, self.run_stages(job)).await {
            Ok(Ok(outcome)) => {
                job.advance(JobState::Done);
                info!("Job complete");
                Ok(outcome)
            }
            Ok(Err(err)) => {
                job.fail();
                Err(err)
            }
            Err(_) => {
                job.fail();
                warn!("Job exceeded its {}s budget; cancelled", budget.as_secs());
                Err(YouLearnError::Timeout(budget.as_secs()))
            }
        }
    }

    async fn run_stages(&self, job: &mut Job) -> Result<JobOutcome> {
        let id = job.video_id.clone();

        job.advance(JobState::FetchingTranscript);
        let transcript = {
            let _slot = self
                .governor
                .acquire(SlotCategory::TranscriptFetch, self.acquire_timeout)
                .await?;
            self.chain.fetch(&id).await?
        };

        let title = match self.titles.resolve(&id).await {
            Ok(title) => title,
            Err(err) => {
                warn!("Title lookup failed ({}); using fallback", err);
                fallback_title(&id)
            }
        };

        let transcript = match transcript {
            Some(found) => found,
            None => {
                job.advance(JobState::FetchingAudio);
                let asset = self.audio.acquire(&id).await?;

                job.advance(JobState::Transcribing);
                transcribe_asset(self.stt.as_ref(), asset).await?
            }
        };

        let summary = match job.action {
            Action::Transcript => None,
            Action::Summary(provider) => {
                job.advance(JobState::Summarizing);
                let _slot = self
                    .governor
                    .acquire(SlotCategory::SummaryGenerate, self.acquire_timeout)
                    .await?;
                Some(
                    self.summarizer
                        .summarize(provider, &title, &transcript.text)
                        .await?,
                )
            }
        };

        Ok(JobOutcome {
            title,
            transcript,
            summary,
        })
    }
}
