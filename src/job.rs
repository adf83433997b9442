//! Per-request job state.
//!
//! One [`Job`] tracks a single user request through the pipeline. State
//! moves forward only; a retry re-enters the stage it is already in rather
//! than moving back.

use crate::reference::VideoId;
use crate::summarize::SummaryProvider;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Transcript,
    Summary(SummaryProvider),
}

/// Pipeline stages a job moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    FetchingTranscript,
    FetchingAudio,
    Transcribing,
    Summarizing,
    Done,
    Failed,
}

impl JobState {
    /// Position in the forward-only ordering.
    fn rank(self) -> u8 {
        match self {
            JobState::Pending => 0,
            JobState::FetchingTranscript => 1,
            JobState::FetchingAudio => 2,
            JobState::Transcribing => 3,
            JobState::Summarizing => 4,
            JobState::Done => 5,
            JobState::Failed => 6,
        }
    }
}

/// One user-triggered request.
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub video_id: VideoId,
    pub action: Action,
    /// Front-end caller identity, when known.
    pub owner: Option<i64>,
    pub created_at: DateTime<Utc>,
    state: JobState,
    history: Vec<JobState>,
}

impl Job {
    pub fn new(video_id: VideoId, action: Action, owner: Option<i64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id,
            action,
            owner,
            created_at: Utc::now(),
            state: JobState::Pending,
            history: vec![JobState::Pending],
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Every state the job has passed through, in order.
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    /// Move forward to `next`. Re-entering the current state (a retry) is
    /// allowed; moving backwards is a programming error.
    pub fn advance(&mut self, next: JobState) {
        debug_assert!(
            next.rank() >= self.state.rank(),
            "job state may not regress: {:?} -> {:?}",
            self.state,
            next
        );
        if next != self.state {
            self.state = next;
            self.history.push(next);
        }
    }

    pub fn fail(&mut self) {
        self.state = JobState::Failed;
        self.history.push(JobState::Failed);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Done | JobState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(
            VideoId::parse("abcdefghijk").unwrap(),
            Action::Transcript,
            Some(42),
        )
    }

    #[test]
    fn test_states_move_forward_and_record_history() {
        let mut job = job();
        assert_eq!(job.state(), JobState::Pending);

        job.advance(JobState::FetchingTranscript);
        job.advance(JobState::FetchingAudio);
        job.advance(JobState::Done);

        assert!(job.is_terminal());
        assert_eq!(
            job.history(),
            &[
                JobState::Pending,
                JobState::FetchingTranscript,
                JobState::FetchingAudio,
                JobState::Done,
            ]
        );
    }

    #[test]
    fn test_reentering_same_state_is_not_duplicated() {
        let mut job = job();
        job.advance(JobState::FetchingTranscript);
        job.advance(JobState::FetchingTranscript);
        assert_eq!(
            job.history(),
            &[JobState::Pending, JobState::FetchingTranscript]
        );
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut job = job();
        job.advance(JobState::FetchingAudio);
        job.fail();
        assert!(job.is_terminal());
        assert_eq!(job.state(), JobState::Failed);
    }
}
