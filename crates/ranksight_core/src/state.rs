use std::collections::BTreeMap;

use crate::cache::SuggestionCache;
use crate::job::{JobRef, JobState, TrackedJob};
use crate::status::JobKind;
use crate::suggestion::{SetKey, SuggestionSet};
use crate::view_model::{ClientViewModel, JobRowView};

/// One entry in the consumable transition log. The presentation layer reads
/// these in order; a terminal `Job` entry is the last one a ref ever gets.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// A job transitioned; carries the state it transitioned into.
    Job { job: JobRef, state: JobState },
    /// The suggestion entry for a key changed or was invalidated; observers
    /// must re-read it.
    SuggestionsUpdated { key: SetKey },
}

/// Whole client state, mutated exclusively through `update()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientState {
    jobs: BTreeMap<JobRef, TrackedJob>,
    next_job_ref: JobRef,
    cache: SuggestionCache,
    events: Vec<StateEvent>,
    dirty: bool,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self, job: JobRef) -> Option<&TrackedJob> {
        self.jobs.get(&job)
    }

    /// The ref handed out by the most recent allocation, if any.
    pub fn last_allocated(&self) -> Option<JobRef> {
        (self.next_job_ref > 0).then_some(self.next_job_ref)
    }

    /// The suggestion set for `key`, unless unloaded or invalidated.
    pub fn suggestions(&self, key: &SetKey) -> Option<&SuggestionSet> {
        self.cache.fresh(key)
    }

    pub fn cache(&self) -> &SuggestionCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut SuggestionCache {
        self.dirty = true;
        &mut self.cache
    }

    pub(crate) fn allocate_job(&mut self, kind: JobKind) -> JobRef {
        self.next_job_ref += 1;
        self.jobs.insert(self.next_job_ref, TrackedJob::new(kind));
        self.dirty = true;
        self.next_job_ref
    }

    pub(crate) fn set_remote_id(&mut self, job: JobRef, remote_id: String) {
        if let Some(tracked) = self.jobs.get_mut(&job) {
            tracked.remote_id.get_or_insert(remote_id);
        }
    }

    /// Moves a job into `state` and logs the transition. Terminal states are
    /// absorbing: a transition away from one is silently dropped, which is
    /// what makes late poll results harmless.
    pub(crate) fn transition(&mut self, job: JobRef, state: JobState) -> bool {
        let Some(tracked) = self.jobs.get_mut(&job) else {
            return false;
        };
        if tracked.state.is_terminal() {
            return false;
        }
        tracked.state = state.clone();
        self.events.push(StateEvent::Job { job, state });
        self.dirty = true;
        true
    }

    pub(crate) fn push_event(&mut self, event: StateEvent) {
        self.events.push(event);
        self.dirty = true;
    }

    /// Drains the transition log accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<StateEvent> {
        std::mem::take(&mut self.events)
    }

    /// Returns whether anything changed since the last call, and resets the
    /// flag. Hosts use this to coalesce redraws across bursts of events.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> ClientViewModel {
        ClientViewModel {
            jobs: self.jobs.iter().map(|(job, tracked)| JobRowView::new(*job, tracked)).collect(),
            suggestion_sets: self.cache.summaries(),
            dirty: self.dirty,
        }
    }
}
