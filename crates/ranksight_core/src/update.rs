use crate::cache::{MutationDispatch, SettleAction, SuggestionChange};
use crate::effect::{Effect, PollPolicy};
use crate::job::{JobFailure, JobState, TriggerOutcome};
use crate::state::StateEvent;
use crate::status::{normalize_status, Phase};
use crate::{ClientState, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// All ordering invariants live here or in the types it drives: terminal
/// job states are absorbing, cancelled jobs discard late results, and
/// suggestion writes for one key are serialized through the cache.
pub fn update(mut state: ClientState, msg: Msg) -> (ClientState, Vec<Effect>) {
    let effects = match msg {
        Msg::TriggerRequested { input } => {
            let kind = input.kind();
            let job = state.allocate_job(kind);
            match input.validate() {
                Err(err) => {
                    // Rejected locally; the backend is never contacted.
                    state.transition(
                        job,
                        JobState::Failed {
                            failure: JobFailure::input_rejected(err.to_string()),
                        },
                    );
                    Vec::new()
                }
                Ok(()) => {
                    state.transition(job, JobState::Pending);
                    vec![Effect::IssueTrigger { job, input }]
                }
            }
        }
        Msg::TriggerSettled { job, outcome } => {
            // A trigger that settles after cancellation (or any terminal
            // transition) is discarded.
            let Some(tracked) = state.job(job) else {
                return (state, Vec::new());
            };
            if !matches!(tracked.state, JobState::Pending) {
                return (state, Vec::new());
            }
            let kind = tracked.kind;
            match outcome {
                TriggerOutcome::Accepted { remote_id } => {
                    state.set_remote_id(job, remote_id.clone());
                    vec![Effect::StartPolling {
                        job,
                        kind,
                        remote_id,
                        policy: PollPolicy::for_kind(kind),
                    }]
                }
                TriggerOutcome::Rejected {
                    message,
                    suggested_alternative,
                } => {
                    // The only path to `failed` without a single poll.
                    state.transition(
                        job,
                        JobState::Failed {
                            failure: JobFailure::trigger_rejected(message, suggested_alternative),
                        },
                    );
                    Vec::new()
                }
                TriggerOutcome::TransportFailed { message } => {
                    state.transition(
                        job,
                        JobState::Failed {
                            failure: JobFailure::trigger_rejected(message, None),
                        },
                    );
                    Vec::new()
                }
            }
        }
        Msg::StatusObserved {
            job,
            attempt,
            status,
            result,
            error,
        } => {
            let Some(tracked) = state.job(job) else {
                return (state, Vec::new());
            };
            if !tracked.state.is_live() {
                return (state, Vec::new());
            }
            let kind = tracked.kind;
            match normalize_status(kind, &status) {
                Phase::InFlight => {
                    state.transition(job, JobState::Active { attempts: attempt });
                }
                Phase::Succeeded => {
                    state.transition(
                        job,
                        JobState::Succeeded {
                            result: result.unwrap_or(serde_json::Value::Null),
                        },
                    );
                }
                Phase::Failed => {
                    let failure = match error {
                        Some(remote) => JobFailure::server_reported(remote),
                        None => JobFailure::server_reported(crate::RemoteError {
                            message: format!("The {} job failed.", kind.label()),
                            suggested_alternative: None,
                        }),
                    };
                    state.transition(job, JobState::Failed { failure });
                }
            }
            Vec::new()
        }
        Msg::PollExhausted { job, attempts: _ } => {
            let live = state.job(job).is_some_and(|tracked| tracked.state.is_live());
            if live {
                state.transition(
                    job,
                    JobState::Failed {
                        failure: JobFailure::timed_out(),
                    },
                );
            }
            Vec::new()
        }
        Msg::CancelRequested { job } => {
            let Some(tracked) = state.job(job) else {
                return (state, Vec::new());
            };
            if tracked.state.is_terminal() {
                return (state, Vec::new());
            }
            state.transition(job, JobState::Idle);
            vec![Effect::StopPolling { job }]
        }
        Msg::SuggestionsRequested { key } => {
            if state.suggestions(&key).is_some() {
                Vec::new()
            } else {
                vec![Effect::FetchSuggestions { key }]
            }
        }
        Msg::SuggestionsLoaded { key, set } => {
            state.cache_mut().store_authoritative(key.clone(), set);
            state.push_event(StateEvent::SuggestionsUpdated { key });
            Vec::new()
        }
        Msg::SuggestionsLoadFailed { key, message: _ } => {
            state.cache_mut().invalidate(&key);
            state.push_event(StateEvent::SuggestionsUpdated { key });
            Vec::new()
        }
        Msg::SuggestionToggled { key, id, applied } => {
            dispatch_mutation(&mut state, key, SuggestionChange::Toggle { id, applied })
        }
        Msg::ApplyAllRequested { key } => {
            dispatch_mutation(&mut state, key, SuggestionChange::ApplyAll)
        }
        Msg::WriteSettled { key, settlement } => {
            let action = state.cache_mut().settle_write(&key, settlement);
            // Settlement always notifies observers, success or failure, so
            // every component showing this key reconciles on next read.
            state.push_event(StateEvent::SuggestionsUpdated { key: key.clone() });
            match action {
                SettleAction::StartWrite(change) => {
                    vec![Effect::IssueSuggestionWrite { key, change }]
                }
                SettleAction::None => Vec::new(),
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn dispatch_mutation(
    state: &mut ClientState,
    key: crate::SetKey,
    change: SuggestionChange,
) -> Vec<Effect> {
    match state.cache_mut().mutate(&key, change) {
        MutationDispatch::StartWrite(change) => {
            vec![Effect::IssueSuggestionWrite { key, change }]
        }
        MutationDispatch::Queued | MutationDispatch::NoEntry => Vec::new(),
    }
}
