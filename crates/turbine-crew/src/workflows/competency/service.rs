use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{AssessmentRecord, TechnicianId};
use super::ledger::{HistoryEntry, HistoryLedger, DEFAULT_HISTORY_CAP};
use super::report::{roster_summary, RosterSummary};
use super::repository::{CompetencyRepository, RepositoryError, TechnicianAssessment};
use super::rules::RuleTable;
use super::scoring::{compute_score, ScoreResult};
use super::session::{AssessmentSession, CommitOutcome};

/// Technicians read for a roster summary unless the host picks another limit.
pub const DEFAULT_ROSTER_LIMIT: usize = 10_000;

/// Service composing the rule table, scoring engine, and technician-scoped storage.
pub struct CompetencyService<R> {
    repository: Arc<R>,
    rules: Arc<RuleTable>,
    history_cap: usize,
    roster_limit: usize,
}

impl<R> CompetencyService<R>
where
    R: CompetencyRepository + 'static,
{
    pub fn new(repository: Arc<R>, rules: RuleTable) -> Self {
        Self::with_history_cap(repository, rules, DEFAULT_HISTORY_CAP)
    }

    pub fn with_history_cap(repository: Arc<R>, rules: RuleTable, history_cap: usize) -> Self {
        Self {
            repository,
            rules: Arc::new(rules),
            history_cap,
            roster_limit: DEFAULT_ROSTER_LIMIT,
        }
    }

    pub fn with_roster_limit(mut self, limit: usize) -> Self {
        self.roster_limit = limit;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Score a record without touching storage, for live feedback while editing.
    pub fn preview(&self, record: &AssessmentRecord) -> ScoreResult {
        compute_score(record, &self.rules)
    }

    /// Open an editing session seeded from the technician's committed record, if any.
    pub fn open_session(
        &self,
        technician_id: &TechnicianId,
    ) -> Result<AssessmentSession, CompetencyServiceError> {
        let stored = self.repository.fetch(technician_id)?;
        let session = match stored {
            Some(assessment) => AssessmentSession::open(
                technician_id.clone(),
                self.rules.clone(),
                Some(assessment.committed),
            )
            .with_version(assessment.version),
            None => AssessmentSession::open(technician_id.clone(), self.rules.clone(), None),
        };
        Ok(session)
    }

    /// Commit a session as one read-modify-write against storage.
    ///
    /// The session is only advanced once storage accepted the write, so a conflicting commit
    /// leaves it dirty and ready to retry after reloading.
    pub fn commit_session(
        &self,
        session: &mut AssessmentSession,
        actor: &str,
    ) -> Result<CommitOutcome, CompetencyServiceError> {
        let technician_id = session.technician_id().clone();
        let stored = self.repository.fetch(&technician_id)?;
        let actual_version = stored.as_ref().map(|found| found.version).unwrap_or(0);

        if actual_version != session.version() {
            warn!(
                technician = %technician_id,
                expected = session.version(),
                actual = actual_version,
                "assessment changed since session was opened"
            );
            return Err(RepositoryError::VersionConflict {
                expected: session.version(),
                actual: actual_version,
            }
            .into());
        }

        let mut history = stored
            .map(|found| found.history)
            .unwrap_or_else(|| HistoryLedger::with_cap(self.history_cap));

        let mut staged = session.clone();
        let outcome = staged.commit(&mut history, actor);

        if matches!(outcome, CommitOutcome::Unchanged) {
            *session = staged;
            return Ok(outcome);
        }

        self.repository.store(
            TechnicianAssessment {
                technician_id: technician_id.clone(),
                committed: staged.draft().clone(),
                version: staged.version(),
                history,
            },
            actual_version,
        )?;

        match &outcome {
            CommitOutcome::Recorded(entry) => info!(
                technician = %technician_id,
                entry = %entry.id.0,
                changes = entry.changes.len(),
                level = entry.current.score.level,
                "assessment change recorded"
            ),
            _ => info!(
                technician = %technician_id,
                level = staged.score().level,
                "initial assessment stored"
            ),
        }

        *session = staged;
        Ok(outcome)
    }

    /// Commit a complete record in one call, as the HTTP surface does.
    ///
    /// `expected_version` lets a client assert the version it last read.
    pub fn submit(
        &self,
        technician_id: &TechnicianId,
        record: AssessmentRecord,
        actor: &str,
        expected_version: Option<u64>,
    ) -> Result<(CommitOutcome, AssessmentView), CompetencyServiceError> {
        let mut session = self.open_session(technician_id)?;

        if let Some(expected) = expected_version {
            if expected != session.version() {
                return Err(RepositoryError::VersionConflict {
                    expected,
                    actual: session.version(),
                }
                .into());
            }
        }

        session.replace_draft(record);
        let outcome = self.commit_session(&mut session, actor)?;

        let view = AssessmentView {
            technician_id: technician_id.clone(),
            record: session.draft().clone(),
            score: session.score().clone(),
            version: session.version(),
        };
        Ok((outcome, view))
    }

    pub fn current(
        &self,
        technician_id: &TechnicianId,
    ) -> Result<AssessmentView, CompetencyServiceError> {
        let assessment = self
            .repository
            .fetch(technician_id)?
            .ok_or(RepositoryError::NotFound)?;

        Ok(AssessmentView {
            technician_id: assessment.technician_id,
            score: compute_score(&assessment.committed, &self.rules),
            record: assessment.committed,
            version: assessment.version,
        })
    }

    /// Ledger entries, most recent first. Technicians without a record have no history.
    pub fn history(
        &self,
        technician_id: &TechnicianId,
    ) -> Result<Vec<HistoryEntry>, CompetencyServiceError> {
        let entries = self
            .repository
            .fetch(technician_id)?
            .map(|assessment| assessment.history.list())
            .unwrap_or_default();
        Ok(entries)
    }

    pub fn roster(&self) -> Result<RosterSummary, CompetencyServiceError> {
        // One extra row tells a full roster apart from a cut-off one.
        let mut assessments = self
            .repository
            .list(self.roster_limit.saturating_add(1))?;
        let truncated = assessments.len() > self.roster_limit;
        if truncated {
            assessments.truncate(self.roster_limit);
            warn!(
                limit = self.roster_limit,
                "roster summary truncated at the configured limit"
            );
        }

        let mut summary = roster_summary(&assessments, &self.rules);
        summary.truncated = truncated;
        Ok(summary)
    }
}

/// Committed record with its freshly derived score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentView {
    pub technician_id: TechnicianId,
    pub record: AssessmentRecord,
    pub score: ScoreResult,
    pub version: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum CompetencyServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
