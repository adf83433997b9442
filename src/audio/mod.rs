//! Audio acquisition with anti-blocking evasion.
//!
//! When no caption transcript exists, the pipeline downloads the video's
//! audio for speech-to-text. YouTube actively rejects automated downloads,
//! so every attempt runs under an [`AttemptContext`] carrying the evasion
//! state: rendition/format tier, network-stack preference, outbound
//! identity, and a transfer-rate ceiling. A `Blocked` classification
//! mutates the context substantially before the next attempt; other
//! failures leave it intact.

mod ytdlp;

pub use ytdlp::YtDlpDownloader;

use crate::error::{Result, YouLearnError};
use crate::reference::VideoId;
use crate::retry::backoff_delay;
use crate::transport::random_user_agent;
use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Rendition/format ladder, from preferred to most conservative. Blocks
/// walk one rung down; the bottom rung is the least likely to be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTier {
    /// Best available audio, post-processed to MP3.
    BestAudio,
    /// Legacy audio-only MP4 renditions (itags 140/18), no post-processing.
    LegacyM4a,
    /// Whatever the smallest audio rendition is.
    WorstAudio,
}

impl FormatTier {
    fn next(self) -> Self {
        match self {
            FormatTier::BestAudio => FormatTier::LegacyM4a,
            FormatTier::LegacyM4a | FormatTier::WorstAudio => FormatTier::WorstAudio,
        }
    }
}

/// Network-stack preference; some blocks key on the address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpPreference {
    Ipv4,
    Ipv6,
}

impl IpPreference {
    fn flipped(self) -> Self {
        match self {
            IpPreference::Ipv4 => IpPreference::Ipv6,
            IpPreference::Ipv6 => IpPreference::Ipv4,
        }
    }
}

/// Mutable per-download evasion state, owned by one engine invocation.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub format: FormatTier,
    pub ip: IpPreference,
    pub user_agent: &'static str,
    /// Transfer ceiling in bytes per second.
    pub rate_limit: u64,
    /// Alternate player clients to impersonate, set on the last tier.
    pub player_client: Option<&'static str>,
    pub proxy_url: Option<String>,
}

impl AttemptContext {
    pub fn initial(rate_limit: u64, proxy_url: Option<String>) -> Self {
        Self {
            format: FormatTier::BestAudio,
            ip: IpPreference::Ipv4,
            user_agent: random_user_agent(),
            rate_limit,
            player_client: None,
            proxy_url,
        }
    }

    /// Substantial mutation after an explicit block: drop a format tier,
    /// flip the address family, rotate the outbound identity. Identity
    /// rotation happens from the very first block; the block itself proves
    /// the current identity is burned.
    pub fn mutate_after_block(&mut self) {
        self.format = self.format.next();
        self.ip = self.ip.flipped();
        self.user_agent = random_user_agent();
        if self.format == FormatTier::WorstAudio {
            self.player_client = Some("web,tv");
        }
    }
}

/// A downloaded audio file, exclusively owned by its acquisition. The file
/// is removed when the asset drops, whichever way the job ends.
#[derive(Debug)]
pub struct AudioAsset {
    path: PathBuf,
}

impl AudioAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AudioAsset {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove audio asset {:?}: {}", self.path, e);
            }
        }
    }
}

/// Downloader seam over yt-dlp. Tests substitute scripted downloaders.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Download the audio for `id` into `dest` under the given context.
    async fn download(&self, id: &VideoId, ctx: &AttemptContext, dest: &Path) -> Result<()>;
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    pub max_attempts: u32,
    /// Base inter-attempt delay; doubles each attempt.
    pub base_delay: Duration,
    pub rate_limit: u64,
    pub proxy_url: Option<String>,
    pub temp_dir: PathBuf,
}

impl AcquisitionConfig {
    pub fn new(temp_dir: PathBuf) -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(3),
            rate_limit: 1_000_000,
            proxy_url: None,
            temp_dir,
        }
    }
}

/// Fallback audio acquisition: bounded attempts, context-mutating retries.
pub struct AcquisitionEngine {
    downloader: Arc<dyn AudioDownloader>,
    config: AcquisitionConfig,
}

impl AcquisitionEngine {
    pub fn new(downloader: Arc<dyn AudioDownloader>, config: AcquisitionConfig) -> Self {
        Self { downloader, config }
    }

    /// Obtain a non-empty local audio file for `id`, or fail with
    /// `AcquisitionExhausted` after the configured number of attempts.
    /// Partial artifacts never survive a failed return, nor cancellation of
    /// the acquire future mid-download.
    #[instrument(skip(self), fields(video_id = %id))]
    pub async fn acquire(&self, id: &VideoId) -> Result<AudioAsset> {
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        let dest = self.config.temp_dir.join(format!("{}.mp3", id));

        // The guard owns `dest` from the first attempt onward. Failure and
        // cancellation paths alike drop it, which removes whatever partial
        // file the downloader left behind; only success hands it to the
        // caller.
        let asset = AudioAsset { path: dest.clone() };

        let mut ctx =
            AttemptContext::initial(self.config.rate_limit, self.config.proxy_url.clone());
        let mut last_error = String::from("no attempts made");

        for attempt in 0..self.config.max_attempts {
            // Randomized pre-request delay; automated clients that fire
            // instantly are the first thing request filters look for.
            let pre_delay = {
                let mut rng = rand::thread_rng();
                Duration::from_secs_f64(rng.gen_range(1.0..3.0))
            };
            tokio::time::sleep(pre_delay).await;

            info!(
                attempt = attempt + 1,
                format = ?ctx.format,
                ip = ?ctx.ip,
                "Downloading audio"
            );

            let outcome = match self.downloader.download(id, &ctx, &dest).await {
                Ok(()) => verify_non_empty(&dest).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    info!("Audio downloaded to {:?}", dest);
                    return Ok(asset);
                }
                Err(YouLearnError::ToolNotFound(tool)) => {
                    return Err(YouLearnError::ToolNotFound(tool));
                }
                Err(err) => {
                    remove_partial(&dest).await;
                    last_error = err.to_string();
                    warn!(attempt = attempt + 1, "Download failed: {}", err);

                    if matches!(err, YouLearnError::Blocked(_)) {
                        ctx.mutate_after_block();
                        info!(
                            format = ?ctx.format,
                            ip = ?ctx.ip,
                            "Block detected; rotated evasion context"
                        );
                    }
                }
            }

            if attempt + 1 < self.config.max_attempts {
                let jitter = {
                    let mut rng = rand::thread_rng();
                    Duration::from_secs_f64(rng.gen_range(1.0..3.0))
                };
                let delay = backoff_delay(self.config.base_delay, attempt) + jitter;
                warn!("Retrying download in {:.1}s", delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }
        }

        Err(YouLearnError::AcquisitionExhausted {
            attempts: self.config.max_attempts,
            reason: last_error,
        })
    }
}

/// A zero-byte download is a failed download.
async fn verify_non_empty(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(YouLearnError::Transient("downloaded file is empty".into())),
        Err(_) => Err(YouLearnError::Transient(
            "downloaded file was not created".into(),
        )),
    }
}

async fn remove_partial(path: &Path) {
    let _ = tokio::fs::remove_file(path).await;
}
