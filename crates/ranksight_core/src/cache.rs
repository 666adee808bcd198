use std::collections::{HashMap, VecDeque};

use crate::suggestion::{SetKey, SuggestionId, SuggestionSet};

/// A local mutation applied optimistically ahead of server confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionChange {
    Toggle { id: SuggestionId, applied: bool },
    ApplyAll,
}

/// What the cache decided when a mutation was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationDispatch {
    /// No write is in flight for this key; send this one now.
    StartWrite(SuggestionChange),
    /// A write is already in flight; the change was applied locally and
    /// queued behind it.
    Queued,
    /// Nothing is loaded for this key; the mutation was ignored.
    NoEntry,
}

/// How the in-flight write for a key settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteSettlement {
    /// The backend confirmed the write, optionally returning the canonical
    /// set which replaces the cached entry wholesale.
    Confirmed(Option<SuggestionSet>),
    /// The write failed; the optimistic state can no longer be trusted.
    Failed,
}

/// Next step after a settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleAction {
    None,
    /// A queued mutation became the new in-flight write; send it now.
    StartWrite(SuggestionChange),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry {
    set: SuggestionSet,
    /// Set when the optimistic state diverged from the server in an unknown
    /// way; a stale entry is never served and the next read refetches.
    stale: bool,
    in_flight: Option<SuggestionChange>,
    queued: VecDeque<SuggestionChange>,
}

impl CacheEntry {
    fn new(set: SuggestionSet) -> Self {
        Self {
            set,
            stale: false,
            in_flight: None,
            queued: VecDeque::new(),
        }
    }

    fn apply(&mut self, change: &SuggestionChange) {
        match change {
            SuggestionChange::Toggle { id, applied } => {
                self.set.toggle(id, *applied);
            }
            SuggestionChange::ApplyAll => {
                self.set.apply_all();
            }
        }
    }

    /// Queue coalescing: a newer toggle of the same id supersedes the
    /// queued one, and apply-all supersedes every queued toggle.
    fn enqueue(&mut self, change: SuggestionChange) {
        match &change {
            SuggestionChange::Toggle { id, .. } => {
                self.queued.retain(
                    |queued| !matches!(queued, SuggestionChange::Toggle { id: qid, .. } if qid == id),
                );
            }
            SuggestionChange::ApplyAll => self.queued.clear(),
        }
        self.queued.push_back(change);
    }
}

/// Last known-good suggestion set per key, plus the pending-mutation
/// book-keeping that serializes writes.
///
/// Entries for different keys never interact; for one key at most one write
/// is in flight at a time and later mutations queue behind it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestionCache {
    entries: HashMap<SetKey, CacheEntry>,
}

/// Per-entry summary for view models and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    pub key: SetKey,
    pub cached: bool,
    pub stale: bool,
    pub write_pending: bool,
    pub applied: usize,
    pub total: usize,
}

impl SuggestionCache {
    /// The entry for `key`, unless nothing is loaded or the optimistic
    /// state was invalidated (stale entries force a refetch).
    pub fn fresh(&self, key: &SetKey) -> Option<&SuggestionSet> {
        self.entries
            .get(key)
            .filter(|entry| !entry.stale)
            .map(|entry| &entry.set)
    }

    pub fn is_stale(&self, key: &SetKey) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.stale)
    }

    pub fn has_write_in_flight(&self, key: &SetKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    /// Stores a server response as the new authoritative set for `key`.
    pub fn store_authoritative(&mut self, key: SetKey, set: SuggestionSet) {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.set = set;
                entry.stale = false;
            }
            None => {
                self.entries.insert(key, CacheEntry::new(set));
            }
        }
    }

    /// Marks the entry for `key` stale so the next read refetches.
    pub fn invalidate(&mut self, key: &SetKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stale = true;
        }
    }

    /// Applies `change` to the local set immediately and decides whether its
    /// backend write starts now or queues behind the in-flight one.
    pub fn mutate(&mut self, key: &SetKey, change: SuggestionChange) -> MutationDispatch {
        let Some(entry) = self.entries.get_mut(key) else {
            return MutationDispatch::NoEntry;
        };

        entry.apply(&change);
        if entry.in_flight.is_none() {
            entry.in_flight = Some(change.clone());
            MutationDispatch::StartWrite(change)
        } else {
            entry.enqueue(change);
            MutationDispatch::Queued
        }
    }

    /// Settles the in-flight write for `key`.
    ///
    /// On confirmation with a canonical set the cached entry is replaced
    /// wholesale (the server is the source of truth; no field-level diff).
    /// On failure the entry is invalidated and queued mutations are dropped:
    /// replaying guesses against an unknown server state risks
    /// double-application.
    pub fn settle_write(&mut self, key: &SetKey, settlement: WriteSettlement) -> SettleAction {
        let Some(entry) = self.entries.get_mut(key) else {
            return SettleAction::None;
        };
        if entry.in_flight.take().is_none() {
            return SettleAction::None;
        }

        match settlement {
            WriteSettlement::Confirmed(canonical) => {
                if let Some(set) = canonical {
                    entry.set = set;
                    entry.stale = false;
                }
                match entry.queued.pop_front() {
                    Some(next) => {
                        // The queued change becomes a fresh optimistic
                        // application on top of the replaced set.
                        entry.apply(&next);
                        entry.in_flight = Some(next.clone());
                        SettleAction::StartWrite(next)
                    }
                    None => SettleAction::None,
                }
            }
            WriteSettlement::Failed => {
                entry.stale = true;
                entry.queued.clear();
                SettleAction::None
            }
        }
    }

    /// Entry summaries ordered by key for deterministic rendering.
    pub fn summaries(&self) -> Vec<CacheSummary> {
        let mut rows: Vec<CacheSummary> = self
            .entries
            .iter()
            .map(|(key, entry)| CacheSummary {
                key: key.clone(),
                cached: entry.set.cached,
                stale: entry.stale,
                write_pending: entry.in_flight.is_some() || !entry.queued.is_empty(),
                applied: entry.set.applied_count(),
                total: entry.set.len(),
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }
}
