use std::pin::pin;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{select, Either};
use tokio_util::sync::CancellationToken;

use client_logging::client_warn;

use crate::fetch::ApiFetcher;
use crate::types::{EngineEvent, JobEndpoint, JobId, StatusResponse};

/// Scheduling parameters for one poll loop. The interval is fixed per job
/// family; `max_attempts` bounds resolved reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Decides, from one resolved read, whether polling is done.
pub type TerminalPredicate = Arc<dyn Fn(&StatusResponse) -> bool + Send + Sync>;

/// Receives poll events as they happen.
pub trait PollSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelPollSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelPollSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl PollSink for ChannelPollSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Polls a job's status endpoint until the predicate reports a terminal
/// read, the attempt budget runs out, or the token is cancelled.
///
/// Reads are strictly sequential: the next read is only scheduled after the
/// previous one resolved, so a slow response can never race a newer one.
/// Transient read failures are logged and do not count against the budget;
/// only resolved reads without a terminal status do. Cancellation never
/// schedules another read, but an already in-flight read is left to settle
/// and its result is delivered once if terminal, discarded otherwise.
pub async fn poll_job(
    fetcher: Arc<dyn ApiFetcher>,
    job: JobId,
    endpoint: JobEndpoint,
    remote_id: String,
    is_terminal: TerminalPredicate,
    policy: PollPolicy,
    cancel: CancellationToken,
    sink: &dyn PollSink,
) {
    let mut attempts = 0u32;
    loop {
        if cancel.is_cancelled() {
            return;
        }

        match fetcher.job_status(endpoint, &remote_id).await {
            Ok(response) => {
                attempts += 1;
                let terminal = is_terminal(&response);
                if cancel.is_cancelled() {
                    if terminal {
                        sink.emit(EngineEvent::PollRead {
                            job,
                            attempt: attempts,
                            response,
                        });
                    }
                    return;
                }
                sink.emit(EngineEvent::PollRead {
                    job,
                    attempt: attempts,
                    response,
                });
                if terminal {
                    return;
                }
                if attempts >= policy.max_attempts {
                    sink.emit(EngineEvent::PollExhausted { job, attempts });
                    return;
                }
            }
            Err(err) => {
                // Expected brief hiccup; the interval itself is the retry.
                client_warn!(
                    "job {} status read failed ({}): {}",
                    job,
                    err.kind,
                    err.message
                );
                if cancel.is_cancelled() {
                    return;
                }
            }
        }

        let cancelled = pin!(cancel.cancelled());
        let tick = pin!(tokio::time::sleep(policy.interval));
        if let Either::Left(_) = select(cancelled, tick).await {
            return;
        }
    }
}
