use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::changes::detect_changes;
use super::domain::{AssessmentRecord, FieldEdit, Snapshot, TechnicianId};
use super::ledger::{HistoryEntry, HistoryLedger};
use super::rules::RuleTable;
use super::scoring::{compute_score, ScoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Draft equals the last committed snapshot.
    Clean,
    /// Draft carries edits that have not been committed.
    Dirty,
}

/// Result of committing a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// First snapshot for the technician. Nothing to compare against, so no history entry.
    Initial(Snapshot),
    /// Draft matched the committed snapshot.
    Unchanged,
    Recorded(HistoryEntry),
}

impl CommitOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            CommitOutcome::Initial(_) => "initial",
            CommitOutcome::Unchanged => "unchanged",
            CommitOutcome::Recorded(_) => "recorded",
        }
    }

    pub fn entry(&self) -> Option<&HistoryEntry> {
        match self {
            CommitOutcome::Recorded(entry) => Some(entry),
            _ => None,
        }
    }
}

/// Editable assessment for one technician.
///
/// Every edit re-scores the draft for live display. Committing diffs the draft against the
/// last committed snapshot and appends to the technician's ledger when something changed.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    technician_id: TechnicianId,
    rules: Arc<RuleTable>,
    draft: AssessmentRecord,
    live: ScoreResult,
    committed: Option<Snapshot>,
    state: SessionState,
    version: u64,
}

impl AssessmentSession {
    pub fn open(
        technician_id: TechnicianId,
        rules: Arc<RuleTable>,
        committed: Option<AssessmentRecord>,
    ) -> Self {
        let committed = committed.map(|mut record| {
            record.technician_id = technician_id.clone();
            let score = compute_score(&record, &rules);
            Snapshot { record, score }
        });

        let (draft, state) = match &committed {
            Some(snapshot) => (snapshot.record.clone(), SessionState::Clean),
            None => (
                AssessmentRecord::empty(technician_id.clone()),
                SessionState::Dirty,
            ),
        };
        let live = compute_score(&draft, &rules);

        Self {
            technician_id,
            rules,
            draft,
            live,
            committed,
            state,
            version: 0,
        }
    }

    /// Attach the storage version the committed snapshot was loaded at.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn technician_id(&self) -> &TechnicianId {
        &self.technician_id
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn draft(&self) -> &AssessmentRecord {
        &self.draft
    }

    /// Live score of the current draft.
    pub fn score(&self) -> &ScoreResult {
        &self.live
    }

    pub fn committed(&self) -> Option<&Snapshot> {
        self.committed.as_ref()
    }

    pub fn edit(&mut self, edit: FieldEdit) -> &ScoreResult {
        self.draft.apply(edit);
        self.rescore()
    }

    /// Swap in a whole record, keeping the session's technician id.
    pub fn replace_draft(&mut self, mut record: AssessmentRecord) -> &ScoreResult {
        record.technician_id = self.technician_id.clone();
        self.draft = record;
        self.rescore()
    }

    pub fn commit(&mut self, ledger: &mut HistoryLedger, actor: &str) -> CommitOutcome {
        let current = Snapshot {
            record: self.draft.clone(),
            score: self.live.clone(),
        };

        let outcome = match self.committed.take() {
            None => {
                debug!(technician = %self.technician_id, "first assessment snapshot stored");
                CommitOutcome::Initial(current.clone())
            }
            Some(previous) => {
                let changes = detect_changes(&previous, &current, &self.rules);
                if changes.is_empty() {
                    debug!(technician = %self.technician_id, "commit without changes");
                    CommitOutcome::Unchanged
                } else {
                    let entry = HistoryEntry::new(
                        ledger.next_sequence(),
                        actor,
                        self.rules.version.clone(),
                        previous,
                        current.clone(),
                        changes,
                    );
                    ledger.append(entry.clone());
                    CommitOutcome::Recorded(entry)
                }
            }
        };

        self.committed = Some(current);
        self.state = SessionState::Clean;
        if !matches!(outcome, CommitOutcome::Unchanged) {
            self.version += 1;
        }
        outcome
    }

    /// Drop pending edits. Without a committed snapshot the draft resets to empty and stays
    /// dirty, since there is still nothing stored.
    pub fn cancel(&mut self) {
        match &self.committed {
            Some(snapshot) => {
                self.draft = snapshot.record.clone();
                self.live = snapshot.score.clone();
                self.state = SessionState::Clean;
            }
            None => {
                self.draft = AssessmentRecord::empty(self.technician_id.clone());
                self.live = compute_score(&self.draft, &self.rules);
                self.state = SessionState::Dirty;
            }
        }
    }

    fn rescore(&mut self) -> &ScoreResult {
        self.live = compute_score(&self.draft, &self.rules);
        self.state = SessionState::Dirty;
        &self.live
    }
}
