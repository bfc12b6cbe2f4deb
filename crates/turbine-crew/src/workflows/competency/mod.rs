//! Technician competency assessment: point-based scoring, change detection, and the
//! per-technician audit ledger.
//!
//! The engine pieces (`rules`, `scoring`, `changes`, `ledger`, `session`) are synchronous and
//! total. Storage is reached only through [`CompetencyRepository`], which the host provides.

pub mod changes;
pub mod domain;
pub mod import;
pub mod ledger;
pub mod report;
pub mod repository;
pub mod router;
pub mod rules;
pub mod scoring;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use changes::detect_changes;
pub use domain::{AssessmentRecord, FieldEdit, Snapshot, TechnicianId};
pub use import::{LegacyAssessmentImporter, LegacyImport, LegacyImportError, ParityMismatch};
pub use ledger::{HistoryEntry, HistoryEntryId, HistoryLedger, DEFAULT_HISTORY_CAP};
pub use report::{export_history_csv, roster_summary, LevelCount, RosterSummary};
pub use repository::{CompetencyRepository, RepositoryError, TechnicianAssessment};
pub use router::{competency_router, CommitRequest, CommitResponse};
pub use rules::{BandRule, LevelBand, RuleCategory, RuleTable, RuleTableError, TierRule};
pub use scoring::{compute_score, ScoreBreakdown, ScoreResult};
pub use service::{
    AssessmentView, CompetencyService, CompetencyServiceError, DEFAULT_ROSTER_LIMIT,
};
pub use session::{AssessmentSession, CommitOutcome, SessionState};
