use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Snapshot, TechnicianId};

/// Entries retained per technician before the oldest are evicted.
pub const DEFAULT_HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryEntryId(pub String);

impl HistoryEntryId {
    fn for_technician(technician_id: &TechnicianId, sequence: u64) -> Self {
        Self(format!("{technician_id}-{sequence:06}"))
    }
}

/// Audit record of one committed assessment change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    /// Position in the technician's ledger, counted from 1 and never reused.
    #[serde(default)]
    pub sequence: u64,
    pub technician_id: TechnicianId,
    pub recorded_at: DateTime<Utc>,
    pub actor: String,
    pub rules_version: String,
    pub previous: Snapshot,
    pub current: Snapshot,
    pub changes: Vec<String>,
}

impl HistoryEntry {
    /// `sequence` comes from [`HistoryLedger::next_sequence`], so ids stay unique per
    /// technician for as long as the ledger itself is persisted.
    pub fn new(
        sequence: u64,
        actor: impl Into<String>,
        rules_version: impl Into<String>,
        previous: Snapshot,
        current: Snapshot,
        changes: Vec<String>,
    ) -> Self {
        let technician_id = current.record.technician_id.clone();
        Self {
            id: HistoryEntryId::for_technician(&technician_id, sequence),
            sequence,
            technician_id,
            recorded_at: Utc::now(),
            actor: actor.into(),
            rules_version: rules_version.into(),
            previous,
            current,
            changes,
        }
    }

    pub fn level_changed(&self) -> bool {
        self.previous.score.level != self.current.score.level
    }
}

/// Bounded, most-recent-first audit log for one technician.
///
/// Entries can only be appended; corrections are new entries.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLedger {
    cap: usize,
    entries: VecDeque<HistoryEntry>,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }
}

impl HistoryLedger {
    /// A cap of zero is raised to one so the latest change is always kept.
    pub fn with_cap(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            entries: VecDeque::with_capacity(cap),
        }
    }

    /// Rebuild a ledger from persisted entries given most-recent-first.
    pub fn from_entries(cap: usize, entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let mut ledger = Self::with_cap(cap);
        ledger.entries.extend(entries.into_iter().take(ledger.cap));
        ledger
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.cap);
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Sequence for the next entry. The newest entry survives eviction, so numbering
    /// continues across reloads.
    pub fn next_sequence(&self) -> u64 {
        self.latest()
            .map(|entry| entry.sequence.saturating_add(1))
            .unwrap_or(1)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}
