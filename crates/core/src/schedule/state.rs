//! Authoritative + optimistic schedule layers

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use sprintsync_domain::{
    EntryState, MemberId, OptimisticEntry, ScheduleCell, ScheduleEntry, ScheduleKey,
};

/// What a remote merge did, per key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Keys whose authoritative entry was inserted or replaced
    pub applied: Vec<ScheduleKey>,
    /// Keys held back because an unresolved local edit shadows them
    pub deferred: Vec<ScheduleKey>,
    /// Keys skipped because the local authoritative entry is newer
    pub stale: Vec<ScheduleKey>,
}

impl MergeReport {
    /// Members whose effective schedule may have changed
    pub fn affected_members(&self) -> BTreeSet<MemberId> {
        self.applied.iter().map(|key| key.member_id).collect()
    }

    /// `true` when the merge touched no key at all
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.deferred.is_empty() && self.stale.is_empty()
    }
}

/// Immutable view of the schedule handed to readers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleSnapshot {
    /// State version this snapshot was taken at; strictly increasing
    pub version: u64,
    /// Last known server values
    pub authoritative: BTreeMap<ScheduleKey, ScheduleEntry>,
    /// Unresolved local edits, Pending or Failed
    pub optimistic: BTreeMap<ScheduleKey, OptimisticEntry>,
}

impl ScheduleSnapshot {
    /// Effective value of one cell: the optimistic entry if present, else the
    /// authoritative one.
    pub fn cell(&self, key: &ScheduleKey) -> Option<ScheduleCell> {
        effective_cell(&self.authoritative, &self.optimistic, key)
    }

    /// Every non-empty cell in key order
    pub fn cells(&self) -> Vec<ScheduleCell> {
        let keys: BTreeSet<&ScheduleKey> =
            self.authoritative.keys().chain(self.optimistic.keys()).collect();
        keys.into_iter().filter_map(|key| self.cell(key)).collect()
    }

    /// Effective entries grouped by member
    pub fn entries_by_member(&self) -> BTreeMap<MemberId, Vec<ScheduleEntry>> {
        let mut grouped: BTreeMap<MemberId, Vec<ScheduleEntry>> = BTreeMap::new();
        for cell in self.cells() {
            grouped.entry(cell.entry.member_id).or_default().push(cell.entry);
        }
        grouped
    }

    /// Effective entries of one member in date order
    pub fn entries_for_member(&self, member_id: MemberId) -> Vec<ScheduleEntry> {
        self.cells()
            .into_iter()
            .filter(|cell| cell.entry.member_id == member_id)
            .map(|cell| cell.entry)
            .collect()
    }

    /// Keys whose last commit failed and await a retry
    pub fn failed_keys(&self) -> Vec<ScheduleKey> {
        self.optimistic.iter().filter(|(_, o)| o.failed).map(|(key, _)| *key).collect()
    }

    /// Number of edits still waiting on a commit
    pub fn pending_count(&self) -> usize {
        self.optimistic.values().filter(|o| o.pending).count()
    }
}

fn effective_cell(
    authoritative: &BTreeMap<ScheduleKey, ScheduleEntry>,
    optimistic: &BTreeMap<ScheduleKey, OptimisticEntry>,
    key: &ScheduleKey,
) -> Option<ScheduleCell> {
    if let Some(local) = optimistic.get(key) {
        return Some(ScheduleCell { entry: local.entry.clone(), state: local.state() });
    }
    authoritative
        .get(key)
        .map(|entry| ScheduleCell { entry: entry.clone(), state: EntryState::Committed })
}

/// `true` unless both entries carry timestamps and `incoming` is older.
fn incoming_wins(incoming: &ScheduleEntry, existing: &ScheduleEntry) -> bool {
    let stamp = |entry: &ScheduleEntry| entry.updated_at.or(entry.created_at);
    match (stamp(incoming), stamp(existing)) {
        (Some(new), Some(old)) => new >= old,
        _ => true,
    }
}

/// The schedule model. Owned by exactly one writer.
///
/// Per-key lifecycle: Committed (authoritative only) → Pending (optimistic
/// entry written) → Committed on success, or Failed with the local value
/// retained. Every edit gets a fresh revision; commit outcomes carry the
/// revision they were issued for and are ignored once a newer edit exists.
///
/// Remote rows that arrive for a shadowed key are held, newest first, and
/// folded into the authoritative layer once the local edit commits.
#[derive(Debug, Default)]
pub struct ScheduleState {
    authoritative: BTreeMap<ScheduleKey, ScheduleEntry>,
    optimistic: BTreeMap<ScheduleKey, OptimisticEntry>,
    held: BTreeMap<ScheduleKey, ScheduleEntry>,
    next_revision: u64,
    version: u64,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) {
        self.version += 1;
    }

    fn next_revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    /// Write a local edit into the optimistic layer; returns its revision.
    pub fn apply_optimistic(&mut self, entry: ScheduleEntry, edited_at: DateTime<Utc>) -> u64 {
        let revision = self.next_revision();
        let key = entry.key();
        self.optimistic.insert(key, OptimisticEntry::pending(entry, edited_at, revision));
        self.bump();
        revision
    }

    /// The optimistic entry a commit for `key` should send, if one is pending.
    pub fn pending_commit(&self, key: &ScheduleKey) -> Option<&OptimisticEntry> {
        self.optimistic.get(key).filter(|o| o.pending && !o.failed)
    }

    /// Drop the optimistic entry if `revision` is still current.
    ///
    /// A remote row held back while the edit was unresolved is folded into
    /// the authoritative layer last-write-wins; otherwise the next
    /// reconciliation delivers the committed value.
    pub fn commit_succeeded(&mut self, key: &ScheduleKey, revision: u64) -> bool {
        let current = self.optimistic.get(key).is_some_and(|o| o.revision == revision);
        if !current {
            return false;
        }
        self.optimistic.remove(key);
        if let Some(row) = self.held.remove(key) {
            let wins = self.authoritative.get(key).map_or(true, |existing| incoming_wins(&row, existing));
            if wins {
                self.authoritative.insert(*key, row);
            }
        }
        self.bump();
        true
    }

    /// Mark the entry failed if `revision` is still current.
    pub fn commit_failed(&mut self, key: &ScheduleKey, revision: u64, error: impl Into<String>) -> bool {
        let Some(local) = self.optimistic.get_mut(key).filter(|o| o.revision == revision) else {
            return false;
        };
        local.pending = false;
        local.failed = true;
        local.last_error = Some(error.into());
        self.bump();
        true
    }

    /// Move a failed entry back to Pending under a new revision.
    pub fn mark_retry(&mut self, key: &ScheduleKey) -> Option<u64> {
        if !self.optimistic.get(key).is_some_and(|o| o.failed) {
            return None;
        }
        let revision = self.next_revision();
        let local = self.optimistic.get_mut(key)?;
        local.failed = false;
        local.pending = true;
        local.last_error = None;
        local.revision = revision;
        self.bump();
        Some(revision)
    }

    pub fn failed_keys(&self) -> Vec<ScheduleKey> {
        self.optimistic.iter().filter(|(_, o)| o.failed).map(|(key, _)| *key).collect()
    }

    /// Remote row waiting behind an unresolved local edit
    pub fn held(&self, key: &ScheduleKey) -> Option<&ScheduleEntry> {
        self.held.get(key)
    }

    /// A key is shadowed while a Pending or Failed local edit exists for it.
    pub fn is_shadowed(&self, key: &ScheduleKey) -> bool {
        self.optimistic.contains_key(key)
    }

    /// Merge remote entries last-write-wins.
    ///
    /// Shadowed keys keep their local value; the incoming row is held until
    /// the edit commits.
    pub fn merge_remote(&mut self, entries: Vec<ScheduleEntry>) -> MergeReport {
        let mut report = MergeReport::default();

        for incoming in entries {
            let key = incoming.key();
            if self.is_shadowed(&key) {
                let newer = self.held.get(&key).map_or(true, |held| incoming_wins(&incoming, held));
                if newer {
                    self.held.insert(key, incoming);
                }
                report.deferred.push(key);
                continue;
            }
            match self.authoritative.get(&key) {
                Some(existing) if !incoming_wins(&incoming, existing) => report.stale.push(key),
                Some(existing) if *existing == incoming => {}
                _ => {
                    self.authoritative.insert(key, incoming);
                    report.applied.push(key);
                }
            }
        }

        if !report.applied.is_empty() {
            self.bump();
        }
        report
    }

    /// Replace the whole authoritative layer after a full reload.
    ///
    /// Optimistic entries are kept and keep shadowing their keys. Every key
    /// that appeared, changed or disappeared is reported as applied.
    pub fn replace_authoritative(&mut self, entries: Vec<ScheduleEntry>) -> MergeReport {
        let incoming: BTreeMap<ScheduleKey, ScheduleEntry> =
            entries.into_iter().map(|entry| (entry.key(), entry)).collect();

        let mut report = MergeReport::default();
        let keys: BTreeSet<ScheduleKey> =
            self.authoritative.keys().chain(incoming.keys()).copied().collect();
        for key in keys {
            if self.authoritative.get(&key) != incoming.get(&key) {
                if self.is_shadowed(&key) {
                    report.deferred.push(key);
                } else {
                    report.applied.push(key);
                }
            }
        }

        self.authoritative = incoming;
        self.held.clear();
        self.bump();
        report
    }

    /// Optimistic value if present, else the authoritative one
    pub fn effective(&self, key: &ScheduleKey) -> Option<ScheduleCell> {
        effective_cell(&self.authoritative, &self.optimistic, key)
    }

    /// Local edit for `key`, if unresolved
    pub fn optimistic(&self, key: &ScheduleKey) -> Option<&OptimisticEntry> {
        self.optimistic.get(key)
    }

    /// Bumped on every visible change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Copy of both layers for readers
    pub fn snapshot(&self) -> ScheduleSnapshot {
        ScheduleSnapshot {
            version: self.version,
            authoritative: self.authoritative.clone(),
            optimistic: self.optimistic.clone(),
        }
    }
}
