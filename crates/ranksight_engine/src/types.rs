use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlation id for one job as seen by the engine. The client layer owns
/// allocation; the engine only echoes it back in events.
pub type JobId = u64;

/// Backend job families the engine knows endpoints for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEndpoint {
    TopicalAuthority,
    CompetitorAnalysis,
    Freshness,
    Publication,
}

impl JobEndpoint {
    pub(crate) fn trigger_path(&self) -> &'static str {
        match self {
            JobEndpoint::TopicalAuthority => "api/topical-authority/runs",
            JobEndpoint::CompetitorAnalysis => "api/competitor-analysis/runs",
            JobEndpoint::Freshness => "api/content-freshness/runs",
            JobEndpoint::Publication => "api/publication-status/runs",
        }
    }

    pub(crate) fn status_path(&self, remote_id: &str) -> String {
        format!("{}/{}", self.trigger_path(), remote_id)
    }
}

/// Response to a trigger call. A 2xx body carrying `error` is a rejection
/// (quota, credits, server-side validation), not a transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub suggested_alternative: Option<String>,
}

/// Error payload embedded in a terminal-failure status read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteErrorBody {
    pub message: String,
    #[serde(default)]
    pub suggested_alternative: Option<String>,
}

/// One status read. `status` is the job family's raw vocabulary; collapsing
/// it to a semantic phase is the caller's business.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RemoteErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SuggestionDto {
    pub id: String,
    pub anchor_text: String,
    pub url: String,
    #[serde(default)]
    pub reason: String,
    pub position: usize,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default)]
    pub is_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkDto {
    #[serde(default)]
    pub anchor_text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SuggestionListsDto {
    #[serde(default)]
    pub internal: Vec<SuggestionDto>,
    #[serde(default)]
    pub external: Vec<SuggestionDto>,
    #[serde(default)]
    pub existing: Vec<LinkDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: SuggestionListsDto,
    #[serde(default)]
    pub cached: bool,
}

/// Address of one suggestion set; `include_external` selects a different
/// backend computation, so it is part of the address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuggestionQuery {
    pub blog_id: String,
    pub article_id: String,
    pub include_external: bool,
}

/// Body of a suggestion mutation write. Absent fields are omitted on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SuggestionWriteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_applied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_all: Option<bool>,
}

/// Response to a suggestion write; the canonical set is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SuggestionWriteResponse {
    #[serde(default)]
    pub suggestions: Option<SuggestionListsDto>,
    #[serde(default)]
    pub cached: bool,
}

/// Trigger call outcome once the body has been interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Accepted {
        job_id: String,
    },
    Rejected {
        message: String,
        suggested_alternative: Option<String>,
    },
}

/// Everything the engine reports back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TriggerSettled {
        job: JobId,
        result: Result<TriggerOutcome, FetchError>,
    },
    /// A status read resolved; `attempt` counts resolved reads from 1.
    PollRead {
        job: JobId,
        attempt: u32,
        response: StatusResponse,
    },
    /// The attempt budget ran out without a terminal read.
    PollExhausted {
        job: JobId,
        attempts: u32,
    },
    SuggestionsFetched {
        query: SuggestionQuery,
        result: Result<SuggestionsResponse, FetchError>,
    },
    WriteSettled {
        query: SuggestionQuery,
        result: Result<SuggestionWriteResponse, FetchError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl FailureKind {
    /// Transient failures are worth retrying on a trigger and are silently
    /// tolerated mid-poll; everything else is a hard failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::Timeout | FailureKind::Network)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "undecodable response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
