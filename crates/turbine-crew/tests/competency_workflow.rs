//! End-to-end scenarios for the competency engine driven through the public facade: live
//! scoring while editing, commit-and-audit, and the bounded history ledger.

mod common {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::{Arc, Mutex};

    use turbine_crew::workflows::competency::{
        AssessmentRecord, CompetencyRepository, CompetencyService, RepositoryError, RuleTable,
        TechnicianAssessment, TechnicianId,
    };

    #[derive(Default)]
    pub(super) struct SharedRepository {
        records: Mutex<HashMap<TechnicianId, TechnicianAssessment>>,
    }

    impl CompetencyRepository for SharedRepository {
        fn fetch(
            &self,
            id: &TechnicianId,
        ) -> Result<Option<TechnicianAssessment>, RepositoryError> {
            Ok(self
                .records
                .lock()
                .expect("repository mutex poisoned")
                .get(id)
                .cloned())
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

    pub(super) fn service() -> CompetencyService<SharedRepository> {
        CompetencyService::new(Arc::new(SharedRepository::default()), RuleTable::standard())
    }

    pub(super) fn technician() -> TechnicianId {
        TechnicianId::from("WTG-TECH-17")
    }

    pub(super) fn senior_record() -> AssessmentRecord {
        AssessmentRecord {
            technician_id: technician(),
            certification_tier: Some("senior_technician".to_string()),
            internal_experience: Some("internal_gt_5y".to_string()),
            external_experience: Some("external_gt_5y".to_string()),
            education: BTreeSet::from(["electrical".to_string()]),
            extra_courses: BTreeSet::new(),
            subjective_score: 1,
        }
    }
}

use common::*;
use turbine_crew::workflows::competency::{
    export_history_csv, CommitOutcome, FieldEdit, SessionState,
};

#[test]
fn editing_session_scores_live_and_audits_on_commit() {
    let service = service();
    let mut session = service.open_session(&technician()).expect("session opens");
    assert_eq!(session.state(), SessionState::Dirty);

    session.edit(FieldEdit::CertificationTier(Some(
        "senior_technician".to_string(),
    )));
    session.edit(FieldEdit::InternalExperience(Some(
        "internal_gt_5y".to_string(),
    )));
    session.edit(FieldEdit::ExternalExperience(Some(
        "external_gt_5y".to_string(),
    )));
    let score = session.edit(FieldEdit::AddEducation("electrical".to_string()));
    assert_eq!(score.total_points, 100);
    let score = session.edit(FieldEdit::SubjectiveScore(1));
    assert_eq!(score.total_points, 101);
    assert_eq!(score.level, 5);

    let outcome = service
        .commit_session(&mut session, "crew-planner")
        .expect("first commit");
    assert!(matches!(outcome, CommitOutcome::Initial(_)));
    assert!(service.history(&technician()).expect("history").is_empty());

    session.edit(FieldEdit::SubjectiveScore(2));
    let outcome = service
        .commit_session(&mut session, "crew-planner")
        .expect("second commit");
    let entry = outcome.entry().expect("entry recorded");
    assert_eq!(
        entry.changes,
        vec!["Subjective Score: 1 → 2", "Total Points: 101 → 102"]
    );
    assert!(!entry.level_changed());

    let unchanged = service
        .commit_session(&mut session, "crew-planner")
        .expect("no-op commit");
    assert_eq!(unchanged, CommitOutcome::Unchanged);
    assert_eq!(service.history(&technician()).expect("history").len(), 1);
}

#[test]
fn ledger_keeps_the_fifty_most_recent_changes() {
    let service = service();
    service
        .submit(&technician(), senior_record(), "crew-planner", None)
        .expect("initial");

    for round in 1..=51 {
        let mut record = senior_record();
        record.subjective_score = if round % 2 == 0 { 1 } else { 2 };
        service
            .submit(&technician(), record, "crew-planner", None)
            .expect("change committed");
    }

    let history = service.history(&technician()).expect("history");
    assert_eq!(history.len(), 50);
    // Round 51 set the score to 2, round 50 back to 1.
    assert_eq!(history[0].current.record.subjective_score, 2);
    assert_eq!(history[1].current.record.subjective_score, 1);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].recorded_at >= pair[1].recorded_at));
}

#[test]
fn history_exports_as_csv() {
    let service = service();
    service
        .submit(&technician(), senior_record(), "crew-planner", None)
        .expect("initial");
    let mut record = senior_record();
    record.certification_tier = Some("technician".to_string());
    service
        .submit(&technician(), record, "crew-planner", None)
        .expect("downgrade");

    let history = service.history(&technician()).expect("history");
    let mut buffer = Vec::new();
    export_history_csv(&history, &mut buffer).expect("csv export");
    let text = String::from_utf8(buffer).expect("utf8");

    assert!(text.starts_with("Entry ID,Technician ID,Recorded At,Actor,Rules Version"));
    assert!(text.contains("WTG-TECH-17"));
    assert!(text.contains(",101,86,5,4,"));
}
