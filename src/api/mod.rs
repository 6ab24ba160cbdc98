use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::*;
use crate::query::{SortDirection, StatusFilter};
use crate::state::AppState;
use crate::store::DebtStore;
use crate::view::Dashboard;

#[derive(Deserialize)]
struct DashboardParams {
    filter: Option<String>,
    sort: Option<String>,
}

#[derive(Deserialize)]
struct DuplicateRequest {
    #[serde(default)]
    reference_date: Option<String>,
}

#[derive(Serialize)]
struct AddResponse {
    id: RecordId,
    dashboard: Dashboard,
}

#[derive(Serialize)]
struct DuplicateResponse {
    created: usize,
    target_month: String,
    dashboard: Dashboard,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/debts", get(dashboard).post(add_debt).delete(clear_debts))
        .route("/debts/duplicate", post(duplicate_month))
        .route("/debts/{id}", get(get_debt).put(update_debt).delete(delete_debt))
        .route("/debts/{id}/status", patch(set_status))
        .route("/session/sort/toggle", post(toggle_sort))
        .with_state(state)
}

async fn render(state: &AppState, store: &DebtStore) -> Dashboard {
    let session = *state.session.lock().await;
    Dashboard::compute(store.records(), session, Utc::now(), state.config.due_soon_days)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.slots.ping().await?;
    Ok(StatusCode::OK)
}

async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<Dashboard>, AppError> {
    let filter = params.filter.as_deref().map(str::parse::<StatusFilter>).transpose()?;
    let sort = params.sort.as_deref().map(str::parse::<SortDirection>).transpose()?;

    let store = state.store.lock().await;
    {
        let mut session = state.session.lock().await;
        if let Some(filter) = filter {
            session.filter = filter;
        }
        if let Some(sort) = sort {
            session.sort = sort;
        }
    }
    Ok(Json(render(&state, &store).await))
}

async fn get_debt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DebtRecord>, AppError> {
    let store = state.store.lock().await;
    let debt = store.get(&RecordId::from(id))?.clone();
    Ok(Json(debt))
}

async fn add_debt(
    State(state): State<AppState>,
    Json(req): Json<DebtInput>,
) -> Result<(StatusCode, Json<AddResponse>), AppError> {
    let mut store = state.store.lock().await;
    let id = store.add(&req).await?;
    let dashboard = render(&state, &store).await;
    Ok((StatusCode::CREATED, Json(AddResponse { id, dashboard })))
}

async fn update_debt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DebtInput>,
) -> Result<Json<Dashboard>, AppError> {
    let mut store = state.store.lock().await;
    store.update(&RecordId::from(id), &req).await?;
    Ok(Json(render(&state, &store).await))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Dashboard>, AppError> {
    let status: DebtStatus = req.status.parse()?;
    let mut store = state.store.lock().await;
    store.set_status(&RecordId::from(id), status).await?;
    Ok(Json(render(&state, &store).await))
}

async fn delete_debt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Dashboard>, AppError> {
    let mut store = state.store.lock().await;
    store.delete(&RecordId::from(id)).await?;
    Ok(Json(render(&state, &store).await))
}

async fn clear_debts(State(state): State<AppState>) -> Result<Json<Dashboard>, AppError> {
    let mut store = state.store.lock().await;
    store.clear().await?;
    Ok(Json(render(&state, &store).await))
}

async fn duplicate_month(
    State(state): State<AppState>,
    Json(req): Json<DuplicateRequest>,
) -> Result<Json<DuplicateResponse>, AppError> {
    let reference = match req.reference_date.as_deref() {
        Some(raw) => parse_due_date(raw)
            .ok_or_else(|| AppError::Validation(format!("invalid reference date '{}'", raw)))?,
        None => Utc::now(),
    };

    let mut store = state.store.lock().await;
    let duplication = store.duplicate_current_period(reference).await?;
    let dashboard = render(&state, &store).await;
    Ok(Json(DuplicateResponse {
        created: duplication.created,
        target_month: format!("{}-{:02}", duplication.target_year, duplication.target_month),
        dashboard,
    }))
}

async fn toggle_sort(State(state): State<AppState>) -> Json<Dashboard> {
    let store = state.store.lock().await;
    state.session.lock().await.toggle_sort();
    Json(render(&state, &store).await)
}
