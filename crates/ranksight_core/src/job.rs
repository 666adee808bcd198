use crate::status::JobKind;

/// Local handle for one tracked job. Allocated by the client, never reused;
/// re-running a job allocates a fresh ref so stale failure payloads cannot
/// reappear on the new run.
pub type JobRef = u64;

/// Error payload reported by the backend, either at trigger time or in a
/// terminal-failure status read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub message: String,
    /// For validation failures the backend may propose a corrected input.
    pub suggested_alternative: Option<String>,
}

/// Where a terminal failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// Local validation rejected the input; no network call was made.
    InputRejected,
    /// The backend refused to start the job, or the trigger call could not
    /// be delivered.
    TriggerRejected,
    /// A status read reported a terminal failure.
    ServerReported,
    /// The attempt budget ran out without a terminal status. The job may
    /// still complete server-side; this only means "stop asking".
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub origin: FailureOrigin,
    pub message: String,
    pub suggested_alternative: Option<String>,
}

pub const SOFT_TIMEOUT_MESSAGE: &str =
    "This is taking longer than expected. The job may still complete in the background.";

impl JobFailure {
    pub fn input_rejected(message: impl Into<String>) -> Self {
        Self {
            origin: FailureOrigin::InputRejected,
            message: message.into(),
            suggested_alternative: None,
        }
    }

    pub fn trigger_rejected(message: impl Into<String>, alternative: Option<String>) -> Self {
        Self {
            origin: FailureOrigin::TriggerRejected,
            message: message.into(),
            suggested_alternative: alternative,
        }
    }

    pub fn server_reported(error: RemoteError) -> Self {
        Self {
            origin: FailureOrigin::ServerReported,
            message: error.message,
            suggested_alternative: error.suggested_alternative,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            origin: FailureOrigin::TimedOut,
            message: SOFT_TIMEOUT_MESSAGE.to_string(),
            suggested_alternative: None,
        }
    }
}

/// Per-job state stream shape exposed to the presentation layer.
///
/// `Succeeded` and `Failed` are absorbing: once reached, no further
/// transition occurs for the same [`JobRef`].
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// No work scheduled (also the post-cancellation state).
    Idle,
    /// Trigger accepted locally; no status read observed yet.
    Pending,
    /// Polling in progress; `attempts` counts resolved status reads.
    Active { attempts: u32 },
    /// Terminal success with the job-type-specific result payload.
    Succeeded { result: serde_json::Value },
    /// Terminal failure, server-reported or client-decided.
    Failed { failure: JobFailure },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded { .. } | JobState::Failed { .. })
    }

    /// True while the job still expects trigger or poll results.
    pub fn is_live(&self) -> bool {
        matches!(self, JobState::Pending | JobState::Active { .. })
    }
}

/// Book-keeping record for one job, mutated only through `update()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedJob {
    pub kind: JobKind,
    /// Backend-issued id, present once the trigger call settled successfully.
    pub remote_id: Option<String>,
    pub state: JobState,
}

impl TrackedJob {
    pub(crate) fn new(kind: JobKind) -> Self {
        Self {
            kind,
            remote_id: None,
            state: JobState::Idle,
        }
    }
}

/// Outcome of the trigger write, as observed by the IO layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The backend accepted the job and issued an id to poll.
    Accepted { remote_id: String },
    /// The backend refused to start the job (quota, credits, validation).
    Rejected {
        message: String,
        suggested_alternative: Option<String>,
    },
    /// The trigger call could not be delivered after retries.
    TransportFailed { message: String },
}
