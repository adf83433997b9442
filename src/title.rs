//! Video title lookup.

use crate::error::{Result, YouLearnError};
use crate::reference::VideoId;
use crate::transport::Transport;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::instrument;

/// Title lookup seam.
#[async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve(&self, id: &VideoId) -> Result<String>;
}

/// Title resolver driving `yt-dlp --dump-json`.
pub struct YtDlpTitleResolver {
    transport: Transport,
}

impl YtDlpTitleResolver {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TitleResolver for YtDlpTitleResolver {
    #[instrument(skip(self), fields(video_id = %id))]
    async fn resolve(&self, id: &VideoId) -> Result<String> {
        let mut cmd = Command::new("yt-dlp");
        cmd.args(["--dump-json", "--no-download", "--no-warnings"])
            .arg("--user-agent")
            .arg(self.transport.user_agent)
            .arg("--referer")
            .arg("https://www.youtube.com/");
        if let Some(proxy) = &self.transport.proxy_url {
            cmd.arg("--proxy").arg(proxy);
        }
        cmd.arg(id.watch_url());

        let result = cmd
            .kill_on_drop(true)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(YouLearnError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => return Err(YouLearnError::Lookup(format!("yt-dlp failed to run: {e}"))),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(YouLearnError::Lookup(format!(
                "metadata fetch failed: {}",
                stderr.trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| YouLearnError::Lookup(format!("metadata parse: {}", e)))?;

        json["title"]
            .as_str()
            .map(|t| t.to_string())
            .ok_or_else(|| YouLearnError::Lookup("metadata has no title".into()))
    }
}

/// Fallback title when lookup fails; jobs proceed without a real title.
pub fn fallback_title(id: &VideoId) -> String {
    format!("Video {}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_title() {
        let id = VideoId::parse("abcdefghijk").unwrap();
        assert_eq!(fallback_title(&id), "Video abcdefghijk");
    }
}
