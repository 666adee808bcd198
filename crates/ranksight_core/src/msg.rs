use crate::cache::WriteSettlement;
use crate::job::{JobRef, RemoteError, TriggerOutcome};
use crate::suggestion::{SetKey, SuggestionId, SuggestionSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked to run a job.
    TriggerRequested { input: crate::JobInput },
    /// The trigger write settled.
    TriggerSettled { job: JobRef, outcome: TriggerOutcome },
    /// A status read resolved; `attempt` numbers resolved reads from 1.
    StatusObserved {
        job: JobRef,
        attempt: u32,
        status: String,
        result: Option<serde_json::Value>,
        error: Option<RemoteError>,
    },
    /// The poller gave up without observing a terminal status.
    PollExhausted { job: JobRef, attempts: u32 },
    /// User dismissed a job; polling stops, server-side work continues.
    CancelRequested { job: JobRef },
    /// User wants the suggestion set for a key.
    SuggestionsRequested { key: SetKey },
    /// An authoritative suggestion set arrived from the backend.
    SuggestionsLoaded { key: SetKey, set: SuggestionSet },
    /// A suggestion read failed.
    SuggestionsLoadFailed { key: SetKey, message: String },
    /// User toggled a single suggestion's applied flag.
    SuggestionToggled {
        key: SetKey,
        id: SuggestionId,
        applied: bool,
    },
    /// User applied every suggestion in the loaded set.
    ApplyAllRequested { key: SetKey },
    /// The in-flight suggestion write for a key settled.
    WriteSettled {
        key: SetKey,
        settlement: WriteSettlement,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
