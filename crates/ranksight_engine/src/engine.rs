use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;

use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, EngineConfig, FetchSettings};
use crate::fetch::{trigger_with_retry, ApiFetcher, ReqwestFetcher};
use crate::poller::{poll_job, ChannelPollSink, PollPolicy, TerminalPredicate};
use crate::types::{
    EngineEvent, JobEndpoint, JobId, SuggestionQuery, SuggestionWriteRequest, TriggerOutcome,
    TriggerResponse,
};

enum EngineCommand {
    Trigger {
        job: JobId,
        endpoint: JobEndpoint,
        body: serde_json::Value,
    },
    StartPoll {
        job: JobId,
        endpoint: JobEndpoint,
        remote_id: String,
        policy: PollPolicy,
        is_terminal: TerminalPredicate,
    },
    CancelPoll {
        job: JobId,
    },
    FetchSuggestions {
        query: SuggestionQuery,
    },
    WriteSuggestion {
        query: SuggestionQuery,
        request: SuggestionWriteRequest,
    },
}

/// Owns the IO side of the client: a tokio runtime on a background thread,
/// fed commands over a channel, reporting [`EngineEvent`]s back. Commands
/// for different jobs and suggestion keys run concurrently; sequencing
/// within one job or key is the caller's business.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let fetcher = Arc::new(ReqwestFetcher::new(&config)?);
        Ok(Self::with_fetcher(fetcher, config.fetch))
    }

    /// Builds a handle over an arbitrary fetcher; tests inject scripted
    /// fetchers through this.
    pub fn with_fetcher(fetcher: Arc<dyn ApiFetcher>, settings: FetchSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let mut pollers: HashMap<JobId, CancellationToken> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                pollers.retain(|_, token| !token.is_cancelled());
                handle_command(&runtime, &fetcher, &settings, &event_tx, &mut pollers, command);
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn trigger(&self, job: JobId, endpoint: JobEndpoint, body: serde_json::Value) {
        let _ = self.cmd_tx.send(EngineCommand::Trigger {
            job,
            endpoint,
            body,
        });
    }

    pub fn start_poll(
        &self,
        job: JobId,
        endpoint: JobEndpoint,
        remote_id: impl Into<String>,
        policy: PollPolicy,
        is_terminal: TerminalPredicate,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::StartPoll {
            job,
            endpoint,
            remote_id: remote_id.into(),
            policy,
            is_terminal,
        });
    }

    pub fn cancel_poll(&self, job: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::CancelPoll { job });
    }

    pub fn fetch_suggestions(&self, query: SuggestionQuery) {
        let _ = self.cmd_tx.send(EngineCommand::FetchSuggestions { query });
    }

    pub fn write_suggestion(&self, query: SuggestionQuery, request: SuggestionWriteRequest) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::WriteSuggestion { query, request });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    fetcher: &Arc<dyn ApiFetcher>,
    settings: &FetchSettings,
    event_tx: &mpsc::Sender<EngineEvent>,
    pollers: &mut HashMap<JobId, CancellationToken>,
    command: EngineCommand,
) {
    match command {
        EngineCommand::Trigger { job, endpoint, body } => {
            let fetcher = fetcher.clone();
            let settings = settings.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = trigger_with_retry(fetcher.as_ref(), endpoint, &body, &settings)
                    .await
                    .map(interpret_trigger);
                let _ = event_tx.send(EngineEvent::TriggerSettled { job, result });
            });
        }
        EngineCommand::StartPoll {
            job,
            endpoint,
            remote_id,
            policy,
            is_terminal,
        } => {
            let token = CancellationToken::new();
            pollers.insert(job, token.clone());
            let fetcher = fetcher.clone();
            let sink = ChannelPollSink::new(event_tx.clone());
            runtime.spawn(async move {
                poll_job(
                    fetcher, job, endpoint, remote_id, is_terminal, policy, token, &sink,
                )
                .await;
            });
        }
        EngineCommand::CancelPoll { job } => {
            if let Some(token) = pollers.remove(&job) {
                token.cancel();
            }
        }
        EngineCommand::FetchSuggestions { query } => {
            let fetcher = fetcher.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = fetcher.fetch_suggestions(&query).await;
                let _ = event_tx.send(EngineEvent::SuggestionsFetched { query, result });
            });
        }
        EngineCommand::WriteSuggestion { query, request } => {
            let fetcher = fetcher.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = fetcher.write_suggestion(&query, &request).await;
                let _ = event_tx.send(EngineEvent::WriteSettled { query, result });
            });
        }
    }
}

fn interpret_trigger(response: TriggerResponse) -> TriggerOutcome {
    match response.job_id {
        Some(job_id) => TriggerOutcome::Accepted { job_id },
        None => TriggerOutcome::Rejected {
            message: response
                .error
                .unwrap_or_else(|| "job was not accepted".to_string()),
            suggested_alternative: response.suggested_alternative,
        },
    }
}
