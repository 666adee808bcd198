use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ranksight_engine::{
    ApiFetcher, EngineEvent, EngineHandle, FailureKind, FetchError, FetchSettings, JobEndpoint,
    PollPolicy, StatusResponse, SuggestionQuery, SuggestionWriteRequest, SuggestionWriteResponse,
    SuggestionsResponse, TriggerOutcome, TriggerResponse,
};

/// In-memory backend for handle-level tests: triggers always accept,
/// status reads follow a script.
struct FakeBackend {
    statuses: Mutex<VecDeque<StatusResponse>>,
    status_reads: AtomicU32,
}

impl FakeBackend {
    fn new(statuses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(
                statuses
                    .into_iter()
                    .map(|raw| StatusResponse {
                        status: raw.to_string(),
                        result: None,
                        error: None,
                    })
                    .collect(),
            ),
            status_reads: AtomicU32::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ApiFetcher for FakeBackend {
    async fn trigger_job(
        &self,
        _endpoint: JobEndpoint,
        _body: &serde_json::Value,
    ) -> Result<TriggerResponse, FetchError> {
        Ok(TriggerResponse {
            job_id: Some("remote-1".to_string()),
            error: None,
            suggested_alternative: None,
        })
    }

    async fn job_status(
        &self,
        _endpoint: JobEndpoint,
        _remote_id: &str,
    ) -> Result<StatusResponse, FetchError> {
        self.status_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| StatusResponse {
                status: "pending".to_string(),
                result: None,
                error: None,
            }))
    }

    async fn fetch_suggestions(
        &self,
        _query: &SuggestionQuery,
    ) -> Result<SuggestionsResponse, FetchError> {
        Err(FetchError {
            kind: FailureKind::Network,
            message: "not wired in this test".to_string(),
        })
    }

    async fn write_suggestion(
        &self,
        _query: &SuggestionQuery,
        _request: &SuggestionWriteRequest,
    ) -> Result<SuggestionWriteResponse, FetchError> {
        Err(FetchError {
            kind: FailureKind::Network,
            message: "not wired in this test".to_string(),
        })
    }
}

fn wait_for(handle: &EngineHandle, timeout: Duration) -> Option<EngineEvent> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(event) = handle.try_recv() {
            return Some(event);
        }
        thread::sleep(Duration::from_millis(5));
    }
    None
}

#[test]
fn trigger_then_poll_flows_through_the_handle() {
    let backend = FakeBackend::new(vec!["pending", "completed"]);
    let handle = EngineHandle::with_fetcher(backend.clone(), FetchSettings::default());

    handle.trigger(
        7,
        JobEndpoint::TopicalAuthority,
        serde_json::json!({"topic": "SaaS Marketing"}),
    );
    let settled = wait_for(&handle, Duration::from_secs(2)).expect("trigger event");
    let EngineEvent::TriggerSettled { job: 7, result } = settled else {
        panic!("unexpected event {settled:?}");
    };
    let TriggerOutcome::Accepted { job_id } = result.expect("accepted") else {
        panic!("expected acceptance");
    };
    assert_eq!(job_id, "remote-1");

    handle.start_poll(
        7,
        JobEndpoint::TopicalAuthority,
        job_id,
        PollPolicy {
            interval: Duration::from_millis(5),
            max_attempts: 20,
        },
        Arc::new(|response: &StatusResponse| response.status == "completed"),
    );

    let first = wait_for(&handle, Duration::from_secs(2)).expect("first read");
    assert!(matches!(first, EngineEvent::PollRead { attempt: 1, .. }));
    let second = wait_for(&handle, Duration::from_secs(2)).expect("second read");
    let EngineEvent::PollRead {
        attempt: 2,
        response,
        ..
    } = second
    else {
        panic!("unexpected event {second:?}");
    };
    assert_eq!(response.status, "completed");

    // Terminal read stops the loop; no more reads are issued.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(backend.status_reads.load(Ordering::SeqCst), 2);
}

#[test]
fn cancel_poll_stops_future_reads() {
    let backend = FakeBackend::new(Vec::new());
    let handle = EngineHandle::with_fetcher(backend.clone(), FetchSettings::default());

    handle.start_poll(
        3,
        JobEndpoint::Publication,
        "remote-3",
        PollPolicy {
            interval: Duration::from_millis(10),
            max_attempts: 1000,
        },
        Arc::new(|response: &StatusResponse| response.status == "success"),
    );
    wait_for(&handle, Duration::from_secs(2)).expect("polling started");

    handle.cancel_poll(3);
    // Allow a possibly in-flight read to settle, then expect silence.
    thread::sleep(Duration::from_millis(50));
    let reads_after_cancel = backend.status_reads.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(backend.status_reads.load(Ordering::SeqCst), reads_after_cancel);
}
