use crate::cache::CacheSummary;
use crate::job::{JobRef, JobState, TrackedJob};
use crate::status::JobKind;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientViewModel {
    /// One row per tracked job, in ascending `JobRef` order.
    pub jobs: Vec<JobRowView>,
    pub suggestion_sets: Vec<CacheSummary>,
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhaseView {
    Idle,
    Pending,
    Active,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job: JobRef,
    pub kind: JobKind,
    pub phase: JobPhaseView,
    pub attempts: u32,
    pub failure_message: Option<String>,
    pub suggested_alternative: Option<String>,
}

impl JobRowView {
    pub(crate) fn new(job: JobRef, tracked: &TrackedJob) -> Self {
        let (phase, attempts, failure_message, suggested_alternative) = match &tracked.state {
            JobState::Idle => (JobPhaseView::Idle, 0, None, None),
            JobState::Pending => (JobPhaseView::Pending, 0, None, None),
            JobState::Active { attempts } => (JobPhaseView::Active, *attempts, None, None),
            JobState::Succeeded { .. } => (JobPhaseView::Succeeded, 0, None, None),
            JobState::Failed { failure } => (
                JobPhaseView::Failed,
                0,
                Some(failure.message.clone()),
                failure.suggested_alternative.clone(),
            ),
        };
        Self {
            job,
            kind: tracked.kind,
            phase,
            attempts,
            failure_message,
            suggested_alternative,
        }
    }
}
