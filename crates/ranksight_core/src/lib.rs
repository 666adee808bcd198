//! RankSight core: pure state machine for job polling and optimistic
//! suggestion reconciliation. No IO happens here; the engine layer executes
//! the effects `update()` returns.
mod cache;
mod effect;
mod input;
mod job;
mod msg;
mod state;
mod status;
mod suggestion;
mod update;
mod view_model;

pub use cache::{
    CacheSummary, MutationDispatch, SettleAction, SuggestionCache, SuggestionChange,
    WriteSettlement,
};
pub use effect::{Effect, PollPolicy};
pub use input::{InputError, JobInput};
pub use job::{
    FailureOrigin, JobFailure, JobRef, JobState, RemoteError, TrackedJob, TriggerOutcome,
    SOFT_TIMEOUT_MESSAGE,
};
pub use msg::Msg;
pub use state::{ClientState, StateEvent};
pub use status::{normalize_status, JobKind, Phase};
pub use suggestion::{
    document_fingerprint, locate_anchor, normalize_link_for_dedupe, ExistingLink, MatchType,
    SetKey, Suggestion, SuggestionId, SuggestionSet,
};
pub use update::update;
pub use view_model::{ClientViewModel, JobPhaseView, JobRowView};
