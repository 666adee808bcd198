use std::sync::Arc;

use client_logging::{client_info, client_warn};
use ranksight_core::{
    normalize_status, update, ClientState, ClientViewModel, Effect, ExistingLink, JobInput,
    JobKind, JobRef, JobState, MatchType, Msg, Phase, RemoteError, SetKey, StateEvent, Suggestion,
    SuggestionChange, SuggestionSet, WriteSettlement,
};
use ranksight_engine::{
    ConfigError, EngineConfig, EngineEvent, EngineHandle, JobEndpoint, StatusResponse,
    SuggestionDto, SuggestionListsDto, SuggestionQuery, SuggestionWriteRequest, TerminalPredicate,
};

/// Public façade combining the pure update loop with the IO engine.
///
/// Single-threaded and cooperative: the host calls the intent methods from
/// its own event loop and drives [`Orchestrator::pump`] on a tick to feed
/// engine completions back through `update()`. Dropping the orchestrator
/// drops the engine handle, which ends the engine's command loop; no
/// polling loop outlives its owner.
pub struct Orchestrator {
    state: ClientState,
    engine: EngineHandle,
    poll_policy_override: Option<ranksight_core::PollPolicy>,
}

impl Orchestrator {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_engine(EngineHandle::new(config)?))
    }

    /// Builds the façade over an existing engine handle; tests use this to
    /// inject scripted fetchers.
    pub fn with_engine(engine: EngineHandle) -> Self {
        Self {
            state: ClientState::new(),
            engine,
            poll_policy_override: None,
        }
    }

    /// Replaces the per-kind poll policy, for hosts (and tests) that need a
    /// different cadence than the defaults.
    pub fn with_poll_policy(mut self, policy: ranksight_core::PollPolicy) -> Self {
        self.poll_policy_override = Some(policy);
        self
    }

    /// Starts a job. Validation failures surface as an immediately-failed
    /// job without a network call; everything else settles via [`pump`].
    ///
    /// [`pump`]: Orchestrator::pump
    pub fn trigger(&mut self, input: JobInput) -> JobRef {
        self.dispatch(Msg::TriggerRequested { input });
        self.state.last_allocated().expect("trigger allocates a job")
    }

    /// Stops polling for a job. Advisory: server-side work continues and an
    /// in-flight read may still settle, but its result is discarded.
    pub fn cancel(&mut self, job: JobRef) {
        self.dispatch(Msg::CancelRequested { job });
    }

    pub fn request_suggestions(&mut self, key: SetKey) {
        self.dispatch(Msg::SuggestionsRequested { key });
    }

    pub fn toggle_suggestion(&mut self, key: SetKey, id: impl Into<String>, applied: bool) {
        self.dispatch(Msg::SuggestionToggled {
            key,
            id: id.into(),
            applied,
        });
    }

    pub fn apply_all(&mut self, key: SetKey) {
        self.dispatch(Msg::ApplyAllRequested { key });
    }

    /// Drains engine events into the update loop. Returns true when any
    /// event was processed, so hosts can coalesce redraws.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.engine.try_recv() {
            let msg = translate_event(event);
            self.dispatch(msg);
            changed = true;
        }
        changed
    }

    pub fn view(&self) -> ClientViewModel {
        self.state.view()
    }

    pub fn job_state(&self, job: JobRef) -> Option<&JobState> {
        self.state.job(job).map(|tracked| &tracked.state)
    }

    pub fn suggestions(&self, key: &SetKey) -> Option<&SuggestionSet> {
        self.state.suggestions(key)
    }

    pub fn take_events(&mut self) -> Vec<StateEvent> {
        self.state.take_events()
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::IssueTrigger { job, input } => {
                    client_info!("trigger job={} kind={}", job, input.kind().label());
                    self.engine
                        .trigger(job, job_endpoint(input.kind()), trigger_body(&input));
                }
                Effect::StartPolling {
                    job,
                    kind,
                    remote_id,
                    policy,
                } => {
                    let policy = self.poll_policy_override.unwrap_or(policy);
                    self.engine.start_poll(
                        job,
                        job_endpoint(kind),
                        remote_id,
                        engine_policy(policy),
                        terminal_predicate(kind),
                    );
                }
                Effect::StopPolling { job } => self.engine.cancel_poll(job),
                Effect::FetchSuggestions { key } => {
                    self.engine.fetch_suggestions(suggestion_query(&key));
                }
                Effect::IssueSuggestionWrite { key, change } => {
                    self.engine
                        .write_suggestion(suggestion_query(&key), write_request(&change));
                }
            }
        }
    }
}

fn translate_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::TriggerSettled { job, result } => {
            let outcome = match result {
                Ok(ranksight_engine::TriggerOutcome::Accepted { job_id }) => {
                    ranksight_core::TriggerOutcome::Accepted { remote_id: job_id }
                }
                Ok(ranksight_engine::TriggerOutcome::Rejected {
                    message,
                    suggested_alternative,
                }) => ranksight_core::TriggerOutcome::Rejected {
                    message,
                    suggested_alternative,
                },
                Err(err) => {
                    client_warn!("job {} trigger failed ({}): {}", job, err.kind, err.message);
                    ranksight_core::TriggerOutcome::TransportFailed {
                        message: err.message,
                    }
                }
            };
            Msg::TriggerSettled { job, outcome }
        }
        EngineEvent::PollRead {
            job,
            attempt,
            response,
        } => Msg::StatusObserved {
            job,
            attempt,
            status: response.status,
            result: response.result,
            error: response.error.map(|body| RemoteError {
                message: body.message,
                suggested_alternative: body.suggested_alternative,
            }),
        },
        EngineEvent::PollExhausted { job, attempts } => Msg::PollExhausted { job, attempts },
        EngineEvent::SuggestionsFetched { query, result } => match result {
            Ok(response) => Msg::SuggestionsLoaded {
                key: set_key(query),
                set: suggestion_set_from(response.suggestions, response.cached),
            },
            Err(err) => {
                client_warn!("suggestion fetch failed ({}): {}", err.kind, err.message);
                Msg::SuggestionsLoadFailed {
                    key: set_key(query),
                    message: err.message,
                }
            }
        },
        EngineEvent::WriteSettled { query, result } => {
            let settlement = match result {
                Ok(response) => WriteSettlement::Confirmed(
                    response
                        .suggestions
                        .map(|lists| suggestion_set_from(lists, response.cached)),
                ),
                Err(err) => {
                    client_warn!("suggestion write failed ({}): {}", err.kind, err.message);
                    WriteSettlement::Failed
                }
            };
            Msg::WriteSettled {
                key: set_key(query),
                settlement,
            }
        }
    }
}

fn job_endpoint(kind: JobKind) -> JobEndpoint {
    match kind {
        JobKind::TopicalAuthority => JobEndpoint::TopicalAuthority,
        JobKind::CompetitorAnalysis => JobEndpoint::CompetitorAnalysis,
        JobKind::Freshness => JobEndpoint::Freshness,
        JobKind::Publication => JobEndpoint::Publication,
    }
}

fn engine_policy(policy: ranksight_core::PollPolicy) -> ranksight_engine::PollPolicy {
    ranksight_engine::PollPolicy {
        interval: policy.interval,
        max_attempts: policy.max_attempts,
    }
}

fn terminal_predicate(kind: JobKind) -> TerminalPredicate {
    Arc::new(move |response: &StatusResponse| {
        !matches!(normalize_status(kind, &response.status), Phase::InFlight)
    })
}

fn trigger_body(input: &JobInput) -> serde_json::Value {
    match input {
        JobInput::TopicalAuthority { topic } => serde_json::json!({ "topic": topic }),
        JobInput::CompetitorAnalysis { competitor_url } => {
            serde_json::json!({ "competitor_url": competitor_url })
        }
        JobInput::Freshness { article_id } | JobInput::Publication { article_id } => {
            serde_json::json!({ "article_id": article_id })
        }
    }
}

fn suggestion_query(key: &SetKey) -> SuggestionQuery {
    SuggestionQuery {
        blog_id: key.blog_id.clone(),
        article_id: key.article_id.clone(),
        include_external: key.include_external,
    }
}

fn set_key(query: SuggestionQuery) -> SetKey {
    SetKey {
        blog_id: query.blog_id,
        article_id: query.article_id,
        include_external: query.include_external,
    }
}

fn write_request(change: &SuggestionChange) -> SuggestionWriteRequest {
    match change {
        SuggestionChange::Toggle { id, applied } => SuggestionWriteRequest {
            id: Some(id.clone()),
            is_applied: Some(*applied),
            apply_all: None,
        },
        SuggestionChange::ApplyAll => SuggestionWriteRequest {
            apply_all: Some(true),
            ..SuggestionWriteRequest::default()
        },
    }
}

fn suggestion_set_from(lists: SuggestionListsDto, cached: bool) -> SuggestionSet {
    SuggestionSet {
        internal: lists.internal.into_iter().map(suggestion_from).collect(),
        external: lists.external.into_iter().map(suggestion_from).collect(),
        existing: lists
            .existing
            .into_iter()
            .map(|link| ExistingLink {
                anchor_text: link.anchor_text,
                url: link.url,
            })
            .collect(),
        cached,
        document_fingerprint: None,
    }
}

fn suggestion_from(dto: SuggestionDto) -> Suggestion {
    Suggestion {
        id: dto.id,
        anchor_text: dto.anchor_text,
        url: dto.url,
        reason: dto.reason,
        position: dto.position,
        match_type: match dto.match_type.as_deref() {
            Some("case_insensitive") => MatchType::CaseInsensitive,
            _ => MatchType::Exact,
        },
        is_applied: dto.is_applied,
    }
}
