use crate::errors::AppError;
use crate::forms::{require_date, validate_new_race, validate_new_run, validate_plan_entry};
use crate::models::{
    DashboardResponse, NewRace, NewRun, Plan, PlanEntry, Race, RaceId, Run, RunId,
};
use crate::session::Session;
use crate::state::AppState;
use crate::stats::{build_view_model_at, date_key};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{Local, Utc};
use tracing::info;

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let mut session = state.session.lock().await;
    session.refresh(state.store.as_ref()).await;
    Json(dashboard_response(&session))
}

pub fn dashboard_response(session: &Session) -> DashboardResponse {
    let today = Local::now().date_naive();
    let snapshot = &session.snapshot;
    DashboardResponse {
        today: date_key(today),
        view_model: build_view_model_at(today, Utc::now(), snapshot),
        runs: snapshot.runs.clone(),
        plan: snapshot.plan.clone(),
        races: snapshot.races.clone(),
        notice: session.notice.clone(),
    }
}

pub async fn list_runs(State(state): State<AppState>) -> Result<Json<Vec<Run>>, AppError> {
    Ok(Json(state.store.load_runs().await?))
}

pub async fn create_run(
    State(state): State<AppState>,
    payload: Result<Json<NewRun>, JsonRejection>,
) -> Result<(StatusCode, Json<Run>), AppError> {
    let Json(run) = payload?;
    let run = validate_new_run(run)?;
    let mut session = state.session.lock().await;
    let result = state.store.insert_run(run).await;
    let run = session.settle(state.store.as_ref(), "Saving run", result).await?;
    info!(id = run.id, date = %run.date, distance = run.distance, "run logged");
    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn update_run(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
    payload: Result<Json<NewRun>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(run) = payload?;
    let run = validate_new_run(run)?;
    let mut session = state.session.lock().await;
    let result = state.store.update_run(id, run).await;
    session.settle(state.store.as_ref(), "Updating run", result).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<StatusCode, AppError> {
    let mut session = state.session.lock().await;
    let result = state.store.delete_run(id).await;
    session.settle(state.store.as_ref(), "Deleting run", result).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_plan(State(state): State<AppState>) -> Result<Json<Plan>, AppError> {
    Ok(Json(state.store.load_plan().await?))
}

pub async fn put_plan_entry(
    State(state): State<AppState>,
    Path(date): Path<String>,
    payload: Result<Json<PlanEntry>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(entry) = payload?;
    let date = require_date(&date)?;
    validate_plan_entry(&entry)?;
    let mut session = state.session.lock().await;
    let result = state.store.upsert_plan_entry(&date, entry).await;
    session.settle(state.store.as_ref(), "Saving plan", result).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_plan_entry(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<StatusCode, AppError> {
    let date = require_date(&date)?;
    let mut session = state.session.lock().await;
    let result = state.store.delete_plan_entry(&date).await;
    session.settle(state.store.as_ref(), "Deleting plan entry", result).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_races(State(state): State<AppState>) -> Result<Json<Vec<Race>>, AppError> {
    Ok(Json(state.store.load_races().await?))
}

pub async fn create_race(
    State(state): State<AppState>,
    payload: Result<Json<NewRace>, JsonRejection>,
) -> Result<(StatusCode, Json<Race>), AppError> {
    let Json(race) = payload?;
    let race = validate_new_race(race)?;
    let mut session = state.session.lock().await;
    let result = state.store.insert_race(race).await;
    let race = session.settle(state.store.as_ref(), "Saving race", result).await?;
    info!(id = race.id, date = %race.date, "race scheduled");
    Ok((StatusCode::CREATED, Json(race)))
}

pub async fn delete_race(
    State(state): State<AppState>,
    Path(id): Path<RaceId>,
) -> Result<StatusCode, AppError> {
    let mut session = state.session.lock().await;
    let result = state.store.delete_race(id).await;
    session.settle(state.store.as_ref(), "Deleting race", result).await?;
    Ok(StatusCode::NO_CONTENT)
}
