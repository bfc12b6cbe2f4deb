use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::competency::router::{commit_handler, CommitRequest};
use crate::workflows::competency::CompetencyService;

fn put_assessment(id: &str, body: serde_json::Value) -> Request<Body> {
    Request::put(format!("/api/v1/technicians/{id}/assessment"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn score_route_returns_live_preview() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/competency/score")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&senior_record()).unwrap()))
                .unwrap(),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total_points"], 101);
    assert_eq!(body["level"], 5);
    assert_eq!(body["subtotals"]["experience"], 60);
}

#[tokio::test]
async fn commit_route_reports_outcome_and_history_entry() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let first = router
        .clone()
        .oneshot(put_assessment(
            "tech-0042",
            json!({ "record": senior_record(), "actor": "planner" }),
        ))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = read_json_body(first).await;
    assert_eq!(first_body["outcome"], "initial");
    assert_eq!(first_body["version"], 1);
    assert!(first_body.get("entry").is_none());

    let mut updated = senior_record();
    updated.subjective_score = 2;
    let second = router
        .clone()
        .oneshot(put_assessment(
            "tech-0042",
            json!({ "record": updated, "actor": "planner", "expected_version": 1 }),
        ))
        .await
        .expect("response");
    let second_body = read_json_body(second).await;
    assert_eq!(second_body["outcome"], "recorded");
    assert_eq!(second_body["entry"]["changes"][1], "Total Points: 101 → 102");

    let history = router
        .oneshot(
            Request::get("/api/v1/technicians/tech-0042/assessment/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");
    let history_body = read_json_body(history).await;
    assert_eq!(history_body.as_array().map(|entries| entries.len()), Some(1));
    assert_eq!(history_body[0]["actor"], "planner");
}

#[tokio::test]
async fn commit_route_returns_conflict_for_stale_version() {
    let (service, _) = build_service();
    service
        .submit(&technician(), senior_record(), "planner", None)
        .expect("seeded");
    let router = router_with_service(service);

    let response = router
        .oneshot(put_assessment(
            "tech-0042",
            json!({ "record": senior_record(), "actor": "planner", "expected_version": 0 }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn commit_handler_requires_an_actor() {
    let (service, _) = build_service();

    let response = commit_handler::<MemoryRepository>(
        State(Arc::new(service)),
        Path("tech-0042".to_string()),
        axum::Json(CommitRequest {
            record: senior_record(),
            actor: "  ".to_string(),
            expected_version: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn current_route_returns_not_found_before_first_commit() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/technicians/tech-0001/assessment")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_csv_route_exports_entries() {
    let (service, _) = build_service();
    service
        .submit(&technician(), senior_record(), "planner", None)
        .expect("seeded");
    let mut updated = senior_record();
    updated.extra_courses = keys(&["hv_switching"]);
    service
        .submit(&technician(), updated, "planner", None)
        .expect("updated");
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/technicians/tech-0042/assessment/history.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    let mut lines = text.lines();
    assert!(lines
        .next()
        .is_some_and(|header| header.starts_with("Entry ID,Technician ID")));
    let row = lines.next().expect("one entry row");
    assert!(row.contains("Extra Course Added: High-voltage switching; Total Points: 101 → 111"));
}

#[tokio::test]
async fn rules_and_roster_routes_respond() {
    let repository = Arc::new(MemoryRepository::default());
    let service = CompetencyService::new(repository, rules());
    let router = router_with_service(service);

    let rules_response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/competency/rules")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");
    let rules_body = read_json_body(rules_response).await;
    assert_eq!(rules_body["version"], "standard-2024.1");
    assert_eq!(rules_body["levels"].as_array().map(|levels| levels.len()), Some(5));

    let roster_response = router
        .oneshot(
            Request::get("/api/v1/competency/roster")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");
    let roster_body = read_json_body(roster_response).await;
    assert_eq!(roster_body["technicians"], 0);
    assert!(roster_body["average_points"].is_null());
}
