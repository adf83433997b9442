//! YouLearn - YouTube transcripts and AI summaries
//!
//! A resilient pipeline that turns a YouTube video reference into a
//! transcript and, optionally, an AI-generated summary.
//!
//! # Overview
//!
//! YouLearn allows you to:
//! - Resolve any common YouTube URL shape (or a bare ID) to a video
//! - Retrieve captions through an ordered chain of fallback strategies
//! - Fall back to audio download plus speech-to-text when no captions exist
//! - Evade download blocking by rotating format, address family, and identity
//! - Summarize transcripts with interchangeable AI providers
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `reference` - Video reference parsing
//! - `retry` - Retry/backoff engine
//! - `governor` - Concurrency slot bookkeeping
//! - `transcript` - Caption retrieval strategy chain
//! - `audio` - Audio acquisition with anti-blocking evasion
//! - `stt` - Speech-to-text fallback
//! - `summarize` - AI summarization dispatch
//! - `job` - Per-request job state
//! - `pipeline` - End-to-end orchestration
//!
//! # Example
//!
//! ```rust,no_run
//! use youlearn::config::Settings;
//! use youlearn::job::{Action, Job};
//! use youlearn::pipeline::Pipeline;
//! use youlearn::reference::VideoId;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::from_settings(&settings)?;
//!
//!     let id = VideoId::parse("https://youtu.be/dQw4w9WgXcQ")?;
//!     let mut job = Job::new(id, Action::Transcript, None);
//!     let outcome = pipeline.run(&mut job).await?;
//!     println!("{}", outcome.transcript.text);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod frontend;
pub mod governor;
pub mod job;
pub mod pipeline;
pub mod reference;
pub mod retry;
pub mod stt;
pub mod summarize;
pub mod title;
pub mod transcript;
pub mod transport;

pub use error::{Result, YouLearnError};
