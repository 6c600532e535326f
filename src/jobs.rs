//! Asynchronous provider jobs: regeneration modes and bounded polling.
//!
//! Image providers often answer a request with a job id and make the caller
//! poll for the result. [`JobTracker`] is the state machine for one such job:
//!
//! ```text
//! Submitted ──► Polling { attempt: 1 } ──► … ──► Polling { attempt: N }
//!                    │                                  │
//!                    ├──► Completed                     ├──► Completed | Failed
//!                    └──► Failed                        └──► TimedOut (budget spent)
//! ```
//!
//! A check that errors (network blip, non-OK status) is not terminal: it
//! uses up one attempt and polling carries on. Only an explicit failure from
//! the provider or an exhausted budget ends the job early.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// How far a regenerated page may drift from its current image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RegenerationMode {
    /// Light touch-up of the existing image.
    Refine,
    /// Noticeable rework that keeps the composition.
    Revise,
    /// Brand-new image from the prompt alone.
    #[default]
    Regenerate,
}

impl RegenerationMode {
    /// Denoising strength passed to image-to-image generation.
    pub fn strength(self) -> f32 {
        match self {
            RegenerationMode::Refine => 0.25,
            RegenerationMode::Revise => 0.5,
            RegenerationMode::Regenerate => 1.0,
        }
    }

    /// Whether the current image is used as the starting point.
    pub fn transforms_existing(self) -> bool {
        self != RegenerationMode::Regenerate
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegenerationMode::Refine => "refine",
            RegenerationMode::Revise => "revise",
            RegenerationMode::Regenerate => "regenerate",
        }
    }
}

impl fmt::Display for RegenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound on how long a job is waited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_millis(2000),
        }
    }
}

impl PollPolicy {
    /// Worst-case wait before giving up, `None` if it overflows a `Duration`.
    pub fn budget(&self) -> Option<Duration> {
        self.interval.checked_mul(self.max_attempts)
    }
}

/// What a provider reports for a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus<T> {
    /// Queued or running.
    Pending,
    Completed(T),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Polling { attempt: u32 },
    Completed,
    Failed { reason: String },
    TimedOut,
}

#[derive(Error, Debug, PartialEq)]
pub enum JobError {
    #[error("Job {job} failed: {reason}")]
    Failed { job: String, reason: String },
    #[error("Job {job} timed out after {attempts} attempts")]
    TimedOut { job: String, attempts: u32 },
}

/// State machine for one submitted job.
#[derive(Debug, Clone)]
pub struct JobTracker {
    policy: PollPolicy,
    state: JobState,
}

impl JobTracker {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            state: JobState::Submitted,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            JobState::Completed | JobState::Failed { .. } | JobState::TimedOut
        )
    }

    /// Start the next poll attempt.
    ///
    /// Returns the attempt number, or `None` once the job is terminal. Asking
    /// past the last allowed attempt moves the job to `TimedOut`.
    pub fn next_attempt(&mut self) -> Option<u32> {
        let next = match self.state {
            JobState::Submitted => 1,
            JobState::Polling { attempt } => attempt + 1,
            _ => return None,
        };
        if next > self.policy.max_attempts {
            self.state = JobState::TimedOut;
            return None;
        }
        self.state = JobState::Polling { attempt: next };
        Some(next)
    }

    pub fn complete(&mut self) {
        if !self.is_terminal() {
            self.state = JobState::Completed;
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.is_terminal() {
            self.state = JobState::Failed {
                reason: reason.into(),
            };
        }
    }
}

/// Poll `check` until the job completes, fails, or the policy runs out.
///
/// `sleep` is called with the policy interval before every check; pass
/// `std::thread::sleep` in production and a no-op in tests.
pub fn poll_until_complete<T, E: fmt::Display>(
    job: &str,
    policy: PollPolicy,
    mut check: impl FnMut(u32) -> Result<JobStatus<T>, E>,
    mut sleep: impl FnMut(Duration),
) -> Result<T, JobError> {
    let mut tracker = JobTracker::new(policy);
    while let Some(attempt) = tracker.next_attempt() {
        sleep(policy.interval);
        match check(attempt) {
            Ok(JobStatus::Completed(output)) => {
                tracker.complete();
                debug!(job, attempt, "job completed");
                return Ok(output);
            }
            Ok(JobStatus::Failed(reason)) => {
                tracker.fail(reason.clone());
                return Err(JobError::Failed {
                    job: job.to_string(),
                    reason,
                });
            }
            Ok(JobStatus::Pending) => debug!(job, attempt, "job pending"),
            Err(e) => warn!(job, attempt, error = %e, "job status check failed"),
        }
    }
    warn!(
        job,
        attempts = policy.max_attempts,
        budget = ?policy.budget(),
        "job timed out"
    );
    Err(JobError::TimedOut {
        job: job.to_string(),
        attempts: policy.max_attempts,
    })
}
