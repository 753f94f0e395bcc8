use super::common::*;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Weekday;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::tasting::preferences::{Preferences, ScheduleLength};
use crate::workflows::tasting::router::{generate_handler, GenerateBody};
use crate::workflows::tasting::TastingScheduleService;

fn post_json(uri: &str, body: Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("serialize body"),
        ))
        .expect("valid request")
}

fn get(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::get(uri)
        .body(axum::body::Body::empty())
        .expect("valid request")
}

#[tokio::test]
async fn generate_route_creates_schedule() {
    let (service, repository) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/users/casey/schedule",
            json!({ "start_date": "2025-01-06", "weeks": 4, "seed": 42 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["seed"], 42);
    assert_eq!(payload["added"], 4);
    assert_eq!(payload["mode"], "replace");
    assert_eq!(payload["schedule"][0]["date"], "2025-01-10");
    assert_eq!(payload["schedule"][0]["week"], 1);
    assert_eq!(payload["summary"]["total"], 4);
    assert_eq!(repository.stored(&user()).map(|s| s.len()), Some(4));
}

#[tokio::test]
async fn schedule_route_returns_not_found_before_generation() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/users/casey/schedule"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "not_found");
}

#[tokio::test]
async fn preview_route_reports_exhausted_pool_as_unprocessable() {
    let (service, repository) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/users/casey/schedule/preview",
            json!({ "start_date": "2025-01-06", "weeks": 8, "seed": 1 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "exhausted_pool");
    assert_eq!(payload["position"], 7);
    assert_eq!(payload["date"], "2025-02-21");
    assert!(repository.stored(&user()).is_none());
}

#[tokio::test]
async fn blacked_out_month_is_unsatisfiable() {
    let march_fridays = [7, 14, 21, 28].map(|d| day(3, d));
    let preferences = Preferences::builder()
        .preferred_day(Weekday::Fri)
        .blackout_dates(march_fridays)
        .length(ScheduleLength::Until(day(3, 31)))
        .build()
        .expect("valid preferences");
    let repository = Arc::new(MemoryRepository::seeded(collection(), preferences));
    let router = router_with_service(TastingScheduleService::new(repository));

    let response = router
        .oneshot(post_json(
            "/api/v1/users/casey/schedule",
            json!({ "start_date": "2025-03-01" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "unsatisfiable_schedule");
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("2025-03-01"));
}

#[tokio::test]
async fn end_date_before_start_names_the_field() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/users/casey/schedule",
            json!({ "start_date": "2025-03-01", "end_date": "2025-02-01" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "configuration");
    assert_eq!(payload["field"], "end_date");
}

#[tokio::test]
async fn generate_handler_returns_conflict_while_locked() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let _guard = service.hold_lock(&user());

    let body = GenerateBody {
        start_date: Some(day(1, 6)),
        weeks: Some(2),
        seed: Some(3),
        ..GenerateBody::default()
    };
    let response = generate_handler::<MemoryRepository>(
        State(service.clone()),
        Path("casey".to_string()),
        axum::Json(body),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "generation_in_progress");
}

#[tokio::test]
async fn complete_and_upcoming_routes_track_progress() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/users/casey/schedule",
            json!({ "start_date": "2025-01-06", "weeks": 4, "seed": 9 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/users/casey/schedule/items/1/complete",
            json!({ "completed_on": "2025-01-10" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "done");
    assert_eq!(payload["status_label"], "Done");
    assert_eq!(payload["completed_on"], "2025-01-10");

    let response = router
        .clone()
        .oneshot(get(
            "/api/v1/users/casey/schedule/upcoming?weeks=2&today=2025-01-10",
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let weeks: Vec<i64> = payload["upcoming"]
        .as_array()
        .expect("upcoming list")
        .iter()
        .filter_map(|entry| entry["week"].as_i64())
        .collect();
    assert_eq!(weeks, vec![2]);

    let response = router
        .oneshot(post_json(
            "/api/v1/users/casey/schedule/items/99/complete",
            json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
