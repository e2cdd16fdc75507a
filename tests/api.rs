//! HTTP surface of the ingestion service

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{dec, Fixture, SCENARIO_XML};
use http_body_util::BodyExt;
use promob_budget::api::create_router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: &axum::Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(path);
    let body = match body {
        Some(json_body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json_body.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &axum::Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, path, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_check_responds_ok() {
    let fx = Fixture::new();
    let app = create_router(fx.service());
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn process_returns_budget_and_item_count() {
    let fx = Fixture::new();
    let app = create_router(fx.service());
    let file_id = fx.upload("Cozinha", SCENARIO_XML);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/promob/process",
        Some(json!({ "promob_file_id": file_id })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["items_count"], json!(2));
    assert!(Uuid::parse_str(body["budget_id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn missing_file_id_is_bad_request() {
    let fx = Fixture::new();
    let app = create_router(fx.service());

    let (status, body) = send_json(&app, Method::POST, "/api/promob/process", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("promob_file_id is required"));

    let (status, body) = send_json(&app, Method::POST, "/api/promob/process", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("promob_file_id is required"));
}

#[tokio::test]
async fn malformed_file_id_is_bad_request() {
    let fx = Fixture::new();
    let app = create_router(fx.service());

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/promob/process",
        Some(json!({ "promob_file_id": "not-a-uuid" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not-a-uuid"));
}

#[tokio::test]
async fn unknown_file_is_not_found() {
    let fx = Fixture::new();
    let app = create_router(fx.service());
    let missing = Uuid::new_v4();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/promob/process",
        Some(json!({ "promob_file_id": missing })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!(format!("Promob file {} not found", missing)));
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn missing_upload_is_bad_gateway() {
    let fx = Fixture::new();
    let app = create_router(fx.service());
    let file = fx.register(fx.customer_id, "Cozinha");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/promob/process",
        Some(json!({ "promob_file_id": file.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("Failed to download"));
}

#[tokio::test]
async fn budget_endpoint_returns_totals_and_items() {
    let fx = Fixture::new();
    let service = fx.service();
    let app = create_router(service.clone());
    let outcome = service.process_file(fx.upload("Cozinha", SCENARIO_XML)).await.unwrap();

    let path = format!("/api/budgets/{}", outcome.budget_id);
    let (status, body) = send_json(&app, Method::GET, &path, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(dec(body["total_cost"].as_str().unwrap()), dec("72.8"));
    assert_eq!(dec(body["total_price"].as_str().unwrap()), dec("99.92"));
    assert_eq!(body["project_id"], json!(fx.project_id));
}

#[tokio::test]
async fn unknown_budget_is_not_found() {
    let fx = Fixture::new();
    let app = create_router(fx.service());
    let (status, _) = send_json(&app, Method::GET, &format!("/api/budgets/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn csv_export_lists_every_item() {
    let fx = Fixture::new();
    let service = fx.service();
    let app = create_router(service.clone());
    let outcome = service.process_file(fx.upload("Cozinha", SCENARIO_XML)).await.unwrap();

    let path = format!("/api/budgets/{}/items.csv", outcome.budget_id);
    let response = app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("FERR-01"));
    assert!(text.contains("C001"));
}

#[tokio::test]
async fn totals_failure_still_reports_success() {
    let fx = Fixture::new();
    let (flaky, service) = fx.flaky_service();
    flaky.fail_recompute(true);
    let app = create_router(service.clone());
    let file_id = fx.upload("Cozinha", SCENARIO_XML);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/promob/process",
        Some(json!({ "promob_file_id": file_id })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["items_count"], json!(2));

    let budget_id = Uuid::parse_str(body["budget_id"].as_str().unwrap()).unwrap();
    let detail = service.budget_detail(budget_id).await.unwrap();
    assert_eq!(detail.items.len(), 2);
}
