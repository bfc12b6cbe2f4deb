use super::domain::{AssessmentRecord, TechnicianId};
use super::ledger::HistoryLedger;

/// Persisted competency state for one technician: committed record, its storage version,
/// and the technician's audit ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicianAssessment {
    pub technician_id: TechnicianId,
    pub committed: AssessmentRecord,
    pub version: u64,
    pub history: HistoryLedger,
}

/// Technician-scoped storage supplied by the host.
///
/// `store` must compare `expected_version` against the stored version and write in one
/// atomic step. Zero means no record may exist yet.
pub trait CompetencyRepository: Send + Sync {
    fn fetch(&self, id: &TechnicianId) -> Result<Option<TechnicianAssessment>, RepositoryError>;
    fn store(
        &self,
        assessment: TechnicianAssessment,
        expected_version: u64,
    ) -> Result<(), RepositoryError>;
    fn list(&self, limit: usize) -> Result<Vec<TechnicianAssessment>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("assessment version conflict (expected {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("assessment not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
