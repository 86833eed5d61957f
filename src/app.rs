use crate::state::AppState;
use crate::{handlers, pages};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/runs/form", post(pages::submit_run))
        .route("/runs/form/toggle", post(pages::toggle_run_form))
        .route("/runs/form/cancel", post(pages::cancel_run_form))
        .route("/runs/:id/edit", post(pages::edit_run))
        .route("/runs/:id/delete", post(pages::delete_run))
        .route("/planner/toggle", post(pages::toggle_planner))
        .route("/plan/form", post(pages::submit_plan_entry))
        .route("/plan/form/cancel", post(pages::cancel_plan_edit))
        .route("/plan/:date/edit", post(pages::edit_plan_entry))
        .route("/plan/:date/delete", post(pages::delete_plan_entry))
        .route("/races/form", post(pages::submit_race))
        .route("/races/:id/delete", post(pages::delete_race))
        .route("/notice/dismiss", post(pages::dismiss_notice))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/runs", get(handlers::list_runs).post(handlers::create_run))
        .route(
            "/api/runs/:id",
            put(handlers::update_run).delete(handlers::delete_run),
        )
        .route("/api/plan", get(handlers::get_plan))
        .route(
            "/api/plan/:date",
            put(handlers::put_plan_entry).delete(handlers::delete_plan_entry),
        )
        .route("/api/races", get(handlers::list_races).post(handlers::create_race))
        .route("/api/races/:id", delete(handlers::delete_race))
        .with_state(state)
}
