use std::time::Duration;

use crate::cache::SuggestionChange;
use crate::job::JobRef;
use crate::status::JobKind;
use crate::suggestion::SetKey;
use crate::JobInput;

/// IO the update loop wants performed. Effects are executed by the engine
/// layer; the pure core never touches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the trigger write for a newly allocated job.
    IssueTrigger { job: JobRef, input: JobInput },
    /// Begin polling the job's status endpoint.
    StartPolling {
        job: JobRef,
        kind: JobKind,
        remote_id: String,
        policy: PollPolicy,
    },
    /// Stop scheduling status reads for the job.
    StopPolling { job: JobRef },
    /// Read the suggestion set for a key from the backend.
    FetchSuggestions { key: SetKey },
    /// Send one suggestion mutation to the backend.
    IssueSuggestionWrite { key: SetKey, change: SuggestionChange },
}

/// Scheduling parameters for one polling loop.
///
/// Intervals are fixed per job kind rather than backed off: these are
/// short-lived jobs where backoff would only delay user-visible completion.
/// `max_attempts` bounds resolved reads, after which the client stops
/// asking (a soft timeout, not a job failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn for_kind(kind: JobKind) -> Self {
        match kind {
            JobKind::TopicalAuthority | JobKind::CompetitorAnalysis | JobKind::Freshness => Self {
                interval: Duration::from_secs(3),
                max_attempts: 20,
            },
            JobKind::Publication => Self {
                interval: Duration::from_secs(5),
                max_attempts: 24,
            },
        }
    }
}
