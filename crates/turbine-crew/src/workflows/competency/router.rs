use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{AssessmentRecord, TechnicianId};
use super::ledger::HistoryEntry;
use super::report::export_history_csv;
use super::repository::{CompetencyRepository, RepositoryError};
use super::scoring::ScoreResult;
use super::service::{CompetencyService, CompetencyServiceError};

/// Request body for committing a technician's assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRequest {
    pub record: AssessmentRecord,
    pub actor: String,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitResponse {
    pub outcome: &'static str,
    pub version: u64,
    pub score: ScoreResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<HistoryEntry>,
}

/// Router builder exposing scoring, commit, and history endpoints.
pub fn competency_router<R>(service: Arc<CompetencyService<R>>) -> Router
where
    R: CompetencyRepository + 'static,
{
    Router::new()
        .route("/api/v1/competency/rules", get(rules_handler::<R>))
        .route("/api/v1/competency/score", post(score_handler::<R>))
        .route("/api/v1/competency/roster", get(roster_handler::<R>))
        .route(
            "/api/v1/technicians/:technician_id/assessment",
            get(current_handler::<R>).put(commit_handler::<R>),
        )
        .route(
            "/api/v1/technicians/:technician_id/assessment/history",
            get(history_handler::<R>),
        )
        .route(
            "/api/v1/technicians/:technician_id/assessment/history.csv",
            get(history_csv_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn rules_handler<R>(State(service): State<Arc<CompetencyService<R>>>) -> Response
where
    R: CompetencyRepository + 'static,
{
    (StatusCode::OK, axum::Json(service.rules().clone())).into_response()
}

pub(crate) async fn score_handler<R>(
    State(service): State<Arc<CompetencyService<R>>>,
    axum::Json(record): axum::Json<AssessmentRecord>,
) -> Response
where
    R: CompetencyRepository + 'static,
{
    let score = service.preview(&record);
    (StatusCode::OK, axum::Json(score)).into_response()
}

pub(crate) async fn roster_handler<R>(State(service): State<Arc<CompetencyService<R>>>) -> Response
where
    R: CompetencyRepository + 'static,
{
    match service.roster() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn current_handler<R>(
    State(service): State<Arc<CompetencyService<R>>>,
    Path(technician_id): Path<String>,
) -> Response
where
    R: CompetencyRepository + 'static,
{
    let id = TechnicianId(technician_id);
    match service.current(&id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn commit_handler<R>(
    State(service): State<Arc<CompetencyService<R>>>,
    Path(technician_id): Path<String>,
    axum::Json(request): axum::Json<CommitRequest>,
) -> Response
where
    R: CompetencyRepository + 'static,
{
    let id = TechnicianId(technician_id);
    let CommitRequest {
        record,
        actor,
        expected_version,
    } = request;

    if actor.trim().is_empty() {
        let payload = json!({ "error": "actor is required" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    match service.submit(&id, record, &actor, expected_version) {
        Ok((outcome, view)) => {
            let response = CommitResponse {
                outcome: outcome.label(),
                version: view.version,
                score: view.score,
                entry: outcome.entry().cloned(),
            };
            (StatusCode::OK, axum::Json(response)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<R>(
    State(service): State<Arc<CompetencyService<R>>>,
    Path(technician_id): Path<String>,
) -> Response
where
    R: CompetencyRepository + 'static,
{
    let id = TechnicianId(technician_id);
    match service.history(&id) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_csv_handler<R>(
    State(service): State<Arc<CompetencyService<R>>>,
    Path(technician_id): Path<String>,
) -> Response
where
    R: CompetencyRepository + 'static,
{
    let id = TechnicianId(technician_id);
    let entries = match service.history(&id) {
        Ok(entries) => entries,
        Err(error) => return error_response(error),
    };

    let mut buffer = Vec::new();
    if let Err(error) = export_history_csv(&entries, &mut buffer) {
        let payload = json!({ "error": error.to_string() });
        return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        buffer,
    )
        .into_response()
}

fn error_response(error: CompetencyServiceError) -> Response {
    let status = match &error {
        CompetencyServiceError::Repository(RepositoryError::VersionConflict { .. }) => {
            StatusCode::CONFLICT
        }
        CompetencyServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CompetencyServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
