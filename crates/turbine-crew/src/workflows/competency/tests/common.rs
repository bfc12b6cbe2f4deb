use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::competency::domain::{AssessmentRecord, Snapshot, TechnicianId};
use crate::workflows::competency::ledger::HistoryEntry;
use crate::workflows::competency::repository::{
    CompetencyRepository, RepositoryError, TechnicianAssessment,
};
use crate::workflows::competency::rules::RuleTable;
use crate::workflows::competency::scoring::compute_score;
use crate::workflows::competency::{competency_router, CompetencyService};

pub(super) fn rules() -> RuleTable {
    RuleTable::standard()
}

pub(super) fn technician() -> TechnicianId {
    TechnicianId("tech-0042".to_string())
}

pub(super) fn keys(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Senior technician, top experience bands, electrical apprenticeship, subjective 1: 101 points.
pub(super) fn senior_record() -> AssessmentRecord {
    AssessmentRecord {
        technician_id: technician(),
        certification_tier: Some("senior_technician".to_string()),
        internal_experience: Some("internal_gt_5y".to_string()),
        external_experience: Some("external_gt_5y".to_string()),
        education: keys(&["electrical"]),
        extra_courses: BTreeSet::new(),
        subjective_score: 1,
    }
}

pub(super) fn snapshot(record: AssessmentRecord) -> Snapshot {
    let score = compute_score(&record, &rules());
    Snapshot { record, score }
}

pub(super) fn numbered_entry(number: usize) -> HistoryEntry {
    let previous = snapshot(senior_record());
    let mut next_record = senior_record();
    next_record.subjective_score = 2;
    HistoryEntry::new(
        number as u64,
        "auditor",
        "standard-2024.1",
        previous,
        snapshot(next_record),
        vec![format!("entry {number}")],
    )
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<TechnicianId, TechnicianAssessment>>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, id: &TechnicianId) -> Option<TechnicianAssessment> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl CompetencyRepository for MemoryRepository {
    fn fetch(&self, id: &TechnicianId) -> Result<Option<TechnicianAssessment>, RepositoryError> {
        Ok(self.stored(id))
    }

    fn store(
        &self,
        assessment: TechnicianAssessment,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let actual = guard
            .get(&assessment.technician_id)
            .map(|found| found.version)
            .unwrap_or(0);
        if actual != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                actual,
            });
        }
        guard.insert(assessment.technician_id.clone(), assessment);
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<TechnicianAssessment>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().take(limit).cloned().collect())
    }
}

pub(super) struct UnavailableRepository;

impl CompetencyRepository for UnavailableRepository {
    fn fetch(&self, _id: &TechnicianId) -> Result<Option<TechnicianAssessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn store(
        &self,
        _assessment: TechnicianAssessment,
        _expected_version: u64,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _limit: usize) -> Result<Vec<TechnicianAssessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (CompetencyService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = CompetencyService::new(repository.clone(), rules());
    (service, repository)
}

pub(super) fn router_with_service(service: CompetencyService<MemoryRepository>) -> axum::Router {
    competency_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
