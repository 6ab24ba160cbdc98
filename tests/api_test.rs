use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use debtbook::{
    api::router,
    config::AppConfig,
    persistence::DebtPersistence,
    state::AppState,
    storage::{MemorySlotStore, SlotStore},
    store::DebtStore,
};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup_app() -> (Router, Arc<MemorySlotStore>) {
    let slots = Arc::new(MemorySlotStore::new());
    let dyn_slots: Arc<dyn SlotStore> = slots.clone();
    let store = DebtStore::open(DebtPersistence::new(dyn_slots.clone(), "debts")).await;
    let state = AppState::new(store, dyn_slots, AppConfig::default());
    (router(state), slots)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, value)
}

async fn add(app: &Router, amount: &str, description: &str, due_date: &str, status: &str) -> String {
    let (code, body) = send(
        app,
        "POST",
        "/debts",
        Some(json!({
            "amount": amount,
            "description": description,
            "due_date": due_date,
            "status": status,
        })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED, "{}", body);
    body["id"].as_str().expect("id").to_string()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup_app().await;
    let (code, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(code, StatusCode::OK);
}

#[tokio::test]
async fn test_add_returns_recomputed_totals() {
    let (app, slots) = setup_app().await;

    add(&app, "100", "Rent", "2024-01-05", "pending").await;
    let (code, body) = send(
        &app,
        "POST",
        "/debts",
        Some(json!({"amount": "50", "description": "Gym", "due_date": "2024-01-10", "status": "paid"})),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED);

    let totals = &body["dashboard"]["totals_display"];
    assert_eq!(totals["total"], "$150");
    assert_eq!(totals["paid"], "$50");
    assert_eq!(totals["pending"], "$100");
    assert_eq!(totals["overdue"], "$0");
    assert_eq!(body["dashboard"]["debts"].as_array().unwrap().len(), 2);

    let saved = slots.get("debts").expect("slot written");
    let saved: Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["version"], 1);
    assert_eq!(saved["records"].as_array().unwrap().len(), 2);
    assert_eq!(saved["records"][0]["dueDate"], "2024-01-05T00:00:00Z");
}

#[tokio::test]
async fn test_invalid_input_is_unprocessable() {
    let (app, slots) = setup_app().await;

    let (code, body) = send(
        &app,
        "POST",
        "/debts",
        Some(json!({"amount": "abc", "description": "Rent", "due_date": "2024-01-05"})),
    )
    .await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("not a number"));
    assert!(slots.get("debts").is_none());
}

#[tokio::test]
async fn test_filter_and_sort_are_kept_in_session() {
    let (app, _) = setup_app().await;
    add(&app, "10", "Early", "2024-01-01", "pending").await;
    add(&app, "20", "Late", "2024-03-01", "pending").await;
    add(&app, "30", "Paid", "2024-02-01", "paid").await;

    let (code, body) = send(&app, "GET", "/debts?filter=pending&sort=desc", None).await;
    assert_eq!(code, StatusCode::OK);
    let listed: Vec<&str> = body["debts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["description"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec!["Late", "Early"]);

    let (_, body) = send(&app, "POST", "/session/sort/toggle", None).await;
    assert_eq!(body["session"]["filter"], "pending");
    assert_eq!(body["session"]["sort"], "asc");
    assert_eq!(body["debts"][0]["description"], "Early");

    let (code, _) = send(&app, "GET", "/debts?filter=late", None).await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_status_and_delete_flow() {
    let (app, _) = setup_app().await;
    let id = add(&app, "100", "Rent", "2024-01-05", "pending").await;

    let (code, _) = send(
        &app,
        "PUT",
        &format!("/debts/{}", id),
        Some(json!({"amount": "110", "description": "Rent", "due_date": "2024-01-06", "status": "pending"})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);

    let (code, body) = send(
        &app,
        "PATCH",
        &format!("/debts/{}/status", id),
        Some(json!({"status": "paid"})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["totals_display"]["paid"], "$110");
    assert!(body["overdue"].as_array().unwrap().is_empty());

    let (code, body) = send(&app, "GET", &format!("/debts/{}", id), None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "paid");
    assert!(body["updatedAt"].is_string());

    let (code, _) = send(&app, "DELETE", &format!("/debts/{}", id), None).await;
    assert_eq!(code, StatusCode::OK);

    let (code, _) = send(&app, "GET", &format!("/debts/{}", id), None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    let (code, _) = send(&app, "DELETE", &format!("/debts/{}", id), None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let (app, _) = setup_app().await;
    let id = add(&app, "100", "Rent", "2024-01-05", "pending").await;
    let (code, _) = send(
        &app,
        "PATCH",
        &format!("/debts/{}/status", id),
        Some(json!({"status": "forgiven"})),
    )
    .await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_duplicate_month() {
    let (app, _) = setup_app().await;
    add(&app, "100", "Rent", "2024-01-05", "paid").await;
    add(&app, "50", "Gym", "2024-01-10", "pending").await;
    add(&app, "70", "Car", "2024-02-03", "pending").await;

    let (code, body) = send(
        &app,
        "POST",
        "/debts/duplicate",
        Some(json!({"reference_date": "2024-01-20"})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["created"], 2);
    assert_eq!(body["target_month"], "2024-02");

    let debts = body["dashboard"]["debts"].as_array().unwrap();
    assert_eq!(debts.len(), 5);
    let february_pending = debts
        .iter()
        .filter(|d| d["due_date_display"].as_str().unwrap().ends_with("/02/2024"))
        .filter(|d| d["status"] == "pending")
        .count();
    assert_eq!(february_pending, 3);

    let (_, body) = send(
        &app,
        "POST",
        "/debts/duplicate",
        Some(json!({"reference_date": "2023-06-01"})),
    )
    .await;
    assert_eq!(body["created"], 0);
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let (app, slots) = setup_app().await;
    add(&app, "100", "Rent", "2024-01-05", "pending").await;

    let (code, body) = send(&app, "DELETE", "/debts", None).await;
    assert_eq!(code, StatusCode::OK);
    assert!(body["debts"].as_array().unwrap().is_empty());
    assert_eq!(body["totals_display"]["total"], "$0");

    let saved: Value = serde_json::from_str(&slots.get("debts").unwrap()).unwrap();
    assert!(saved["records"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_save_is_reported_but_change_is_kept() {
    let (app, slots) = setup_app().await;
    slots.set_reject_writes(true);

    let (code, body) = send(
        &app,
        "POST",
        "/debts",
        Some(json!({"amount": "100", "description": "Rent", "due_date": "2024-01-05"})),
    )
    .await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("could not be saved"));

    let (_, body) = send(&app, "GET", "/debts", None).await;
    assert_eq!(body["debts"].as_array().unwrap().len(), 1);
}
