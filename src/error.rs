//! Error types for youlearn.

use thiserror::Error;

/// Library-level error type for youlearn operations.
///
/// Every stage boundary reclassifies lower-level failures into one of these
/// variants; nothing else crosses component boundaries.
#[derive(Error, Debug)]
pub enum YouLearnError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input did not match any recognized video reference shape.
    #[error("Invalid video reference: {0}")]
    InvalidReference(String),

    /// Captions are disabled or absent for this video. Non-retryable;
    /// callers fall through to the next acquisition stage.
    #[error("No transcript available: {0}")]
    NotAvailable(String),

    /// Network or rate problem worth retrying with backoff.
    #[error("Transient error: {0}")]
    Transient(String),

    /// The platform explicitly rejected automated access (403, bot check).
    #[error("Automated access blocked: {0}")]
    Blocked(String),

    /// All audio download attempts failed.
    #[error(
        "Audio acquisition exhausted after {attempts} attempts: {reason}. \
         Configure a proxy or retry later."
    )]
    AcquisitionExhausted { attempts: u32, reason: String },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Title lookup failed: {0}")]
    Lookup(String),

    /// A governed operation could not obtain a slot before its wait expired.
    #[error("Too many concurrent {0} operations, try again later")]
    Denied(&'static str),

    /// The job exceeded its wall-clock budget.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// A capability was requested whose credential is not configured.
    #[error("{0} API key not configured. Set the corresponding environment variable.")]
    CredentialMissing(&'static str),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl YouLearnError {
    /// Whether the retry engine should attempt this operation again.
    ///
    /// Only transient network/rate failures qualify; classification errors
    /// like `NotAvailable` or `InvalidReference` never improve on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, YouLearnError::Transient(_) | YouLearnError::Http(_))
    }

    /// Map an error to the short message shown to end users.
    pub fn user_message(&self) -> String {
        let text = self.to_string();
        let lowered = text.to_lowercase();
        // Provider errors carry quota/rate hints only in their message text.
        if lowered.contains("quota") || lowered.contains("rate limit") {
            return "API quota or rate limit reached. Try again later.".to_string();
        }
        match self {
            YouLearnError::InvalidReference(_) => {
                "That doesn't look like a valid YouTube link or video ID.".to_string()
            }
            YouLearnError::NotAvailable(_) => {
                "No transcript is available for this video.".to_string()
            }
            YouLearnError::AcquisitionExhausted { .. } => text,
            YouLearnError::CredentialMissing(_) => text,
            YouLearnError::Timeout(_) => {
                "The request took too long and was cancelled.".to_string()
            }
            YouLearnError::Denied(_) => text,
            _ => "Something went wrong while processing the video. Please retry.".to_string(),
        }
    }
}

/// Result type alias for youlearn operations.
pub type Result<T> = std::result::Result<T, YouLearnError>;
