//! Concurrency governor.
//!
//! Named, capacity-bounded slot categories protecting external services.
//! `transcript-fetch` and `summary-generate` have independent caps, and a
//! `global` ceiling bounds the total number of heavy operations in flight
//! across both. Acquisition is timeout-bounded and returns [`SlotPermit`],
//! an RAII guard that releases exactly once on every exit path, including
//! cancellation.

use crate::error::{Result, YouLearnError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Governed operation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCategory {
    TranscriptFetch,
    SummaryGenerate,
}

impl SlotCategory {
    pub fn name(&self) -> &'static str {
        match self {
            SlotCategory::TranscriptFetch => "transcript-fetch",
            SlotCategory::SummaryGenerate => "summary-generate",
        }
    }
}

/// Capacity configuration for the governor.
#[derive(Debug, Clone, Copy)]
pub struct GovernorLimits {
    pub transcript_fetch: usize,
    pub summary_generate: usize,
    pub global: usize,
}

impl Default for GovernorLimits {
    fn default() -> Self {
        Self {
            transcript_fetch: 5,
            summary_generate: 3,
            global: 5,
        }
    }
}

/// Slot bookkeeping for governed concurrent operations.
pub struct ConcurrencyGovernor {
    transcript_fetch: Arc<Semaphore>,
    summary_generate: Arc<Semaphore>,
    global: Arc<Semaphore>,
}

/// Proof of an acquired slot. Holds one category permit and one global
/// permit; both return to their pools when the guard drops.
pub struct SlotPermit {
    _category: OwnedSemaphorePermit,
    _global: OwnedSemaphorePermit,
}

impl ConcurrencyGovernor {
    pub fn new(limits: GovernorLimits) -> Self {
        Self {
            transcript_fetch: Arc::new(Semaphore::new(limits.transcript_fetch)),
            summary_generate: Arc::new(Semaphore::new(limits.summary_generate)),
            global: Arc::new(Semaphore::new(limits.global)),
        }
    }

    fn category_semaphore(&self, category: SlotCategory) -> Arc<Semaphore> {
        match category {
            SlotCategory::TranscriptFetch => self.transcript_fetch.clone(),
            SlotCategory::SummaryGenerate => self.summary_generate.clone(),
        }
    }

    /// Wait up to `wait` for a slot in `category` plus a global slot.
    ///
    /// Returns `Denied` when the wait expires instead of blocking forever.
    /// The category permit is taken before the global one, in a fixed order,
    /// so concurrent acquirers cannot deadlock against each other.
    pub async fn acquire(&self, category: SlotCategory, wait: Duration) -> Result<SlotPermit> {
        let category_sem = self.category_semaphore(category);
        let global_sem = self.global.clone();

        let both = async move {
            let cat = category_sem.acquire_owned().await?;
            let global = global_sem.acquire_owned().await?;
            Ok::<_, tokio::sync::AcquireError>(SlotPermit {
                _category: cat,
                _global: global,
            })
        };

        match tokio::time::timeout(wait, both).await {
            Ok(Ok(permit)) => Ok(permit),
            // A closed semaphore means the governor is shutting down; report
            // it the same way as an unavailable slot.
            Ok(Err(_)) | Err(_) => Err(YouLearnError::Denied(category.name())),
        }
    }

    /// Free slots currently available in `category`. Used to verify that
    /// slot counts return to baseline after jobs finish or are cancelled.
    pub fn available(&self, category: SlotCategory) -> usize {
        self.category_semaphore(category).available_permits()
    }

    /// Free slots in the global pool.
    pub fn available_global(&self) -> usize {
        self.global.available_permits()
    }
}
