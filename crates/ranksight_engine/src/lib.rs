//! RankSight engine: IO layer for job triggering, status polling and
//! suggestion reads/writes. Commands go in over a channel, events come back
//! out; all sequencing policy lives with the caller.
mod config;
mod engine;
mod fetch;
mod poller;
mod types;

pub use config::{ConfigError, EngineConfig, FetchSettings};
pub use engine::EngineHandle;
pub use fetch::{trigger_with_retry, ApiFetcher, ReqwestFetcher};
pub use poller::{poll_job, ChannelPollSink, PollPolicy, PollSink, TerminalPredicate};
pub use types::{
    EngineEvent, FailureKind, FetchError, JobEndpoint, JobId, LinkDto, RemoteErrorBody,
    StatusResponse, SuggestionDto, SuggestionListsDto, SuggestionQuery, SuggestionWriteRequest,
    SuggestionWriteResponse, SuggestionsResponse, TriggerOutcome, TriggerResponse,
};
