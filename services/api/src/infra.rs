use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use turbine_crew::workflows::competency::{
    CompetencyRepository, RepositoryError, TechnicianAssessment, TechnicianId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local assessment storage. Versions are checked and written under one lock.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCompetencyRepository {
    records: Arc<Mutex<HashMap<TechnicianId, TechnicianAssessment>>>,
}

impl CompetencyRepository for InMemoryCompetencyRepository {
    fn fetch(&self, id: &TechnicianId) -> Result<Option<TechnicianAssessment>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn store(
        &self,
        assessment: TechnicianAssessment,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let actual = guard
            .get(&assessment.technician_id)
            .map(|existing| existing.version)
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
        let mut assessments: Vec<_> = guard.values().cloned().collect();
        assessments.sort_by(|a, b| a.technician_id.cmp(&b.technician_id));
        assessments.truncate(limit);
        Ok(assessments)
    }
}
