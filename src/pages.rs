//! Server-rendered dashboard and the form posts behind it. Every form post redirects
//! back to `/`; failures land in the session notice instead of an error page.

use crate::forms::{PlanForm, RaceForm, RunForm, require_date};
use crate::models::{RaceId, RunId};
use crate::session::{EditorIntent, Session, Submission};
use crate::state::AppState;
use crate::stats::{build_view_model_at, date_key};
use crate::ui::{Page, render_index};
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use chrono::{Local, Utc};
use std::mem;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let mut session = state.session.lock().await;
    session.refresh(state.store.as_ref()).await;

    let today = Local::now().date_naive();
    let view = build_view_model_at(today, Utc::now(), &session.snapshot);
    Html(render_index(&Page {
        today: &date_key(today),
        view: &view,
        session: &*session,
    }))
}

pub async fn toggle_run_form(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    apply_run_intent(&mut session, EditorIntent::Toggle);
    back()
}

pub async fn edit_run(State(state): State<AppState>, Path(id): Path<RunId>) -> Redirect {
    let mut session = state.session.lock().await;
    if session.snapshot.runs.iter().any(|run| run.id == id) {
        apply_run_intent(&mut session, EditorIntent::Edit(id));
        apply_plan_intent(&mut session, EditorIntent::Cancel);
    } else {
        session.notice = Some(format!("Run {id} no longer exists"));
    }
    back()
}

pub async fn cancel_run_form(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    apply_run_intent(&mut session, EditorIntent::Cancel);
    back()
}

pub async fn submit_run(State(state): State<AppState>, Form(form): Form<RunForm>) -> Redirect {
    let mut session = state.session.lock().await;
    let run = match form.into_new_run() {
        Ok(run) => run,
        Err(err) => {
            session.notice = Some(err.message);
            return back();
        }
    };

    let store = state.store.as_ref();
    let saved = match session.run_editor.submission() {
        None => {
            session.notice = Some("The run form is not open".to_string());
            return back();
        }
        Some(Submission::Create) => {
            let result = store.insert_run(run).await;
            session.settle(store, "Saving run", result).await.map(|_| ())
        }
        Some(Submission::Update(id)) => {
            let result = store.update_run(id, run).await;
            session.settle(store, "Updating run", result).await
        }
    };

    if saved.is_ok() {
        apply_run_intent(&mut session, EditorIntent::Saved);
    }
    back()
}

pub async fn delete_run(State(state): State<AppState>, Path(id): Path<RunId>) -> Redirect {
    let mut session = state.session.lock().await;
    let store = state.store.as_ref();
    let result = store.delete_run(id).await;
    if session.settle(store, "Deleting run", result).await.is_ok()
        && session.run_editor.editing() == Some(&id)
    {
        apply_run_intent(&mut session, EditorIntent::Cancel);
    }
    back()
}

/// Shows or hides the planner. Opening it closes the run form.
pub async fn toggle_planner(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    apply_plan_intent(&mut session, EditorIntent::Toggle);
    if session.plan_editor.is_open() {
        apply_run_intent(&mut session, EditorIntent::Cancel);
    }
    back()
}

pub async fn edit_plan_entry(State(state): State<AppState>, Path(date): Path<String>) -> Redirect {
    let mut session = state.session.lock().await;
    let date = require_date(&date).unwrap_or(date);
    if session.snapshot.plan.contains_key(&date) {
        apply_plan_intent(&mut session, EditorIntent::Edit(date));
        apply_run_intent(&mut session, EditorIntent::Cancel);
    } else {
        session.notice = Some(format!("Nothing planned on {date}"));
    }
    back()
}

/// Leaves edit mode but keeps the planner open with a blank form.
pub async fn cancel_plan_edit(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    apply_plan_intent(&mut session, EditorIntent::Open);
    back()
}

pub async fn submit_plan_entry(State(state): State<AppState>, Form(form): Form<PlanForm>) -> Redirect {
    let mut session = state.session.lock().await;
    let (form_date, entry) = match form.into_entry() {
        Ok(parsed) => parsed,
        Err(err) => {
            session.notice = Some(err.message);
            return back();
        }
    };

    let date = match (session.plan_editor.submission(), form_date) {
        (Some(Submission::Update(date)), _) => date,
        (_, Some(date)) => date,
        (_, None) => {
            session.notice = Some("Pick a date for the planned session".to_string());
            return back();
        }
    };

    let store = state.store.as_ref();
    let result = store.upsert_plan_entry(&date, entry).await;
    if session.settle(store, "Saving plan", result).await.is_ok() {
        apply_plan_intent(&mut session, EditorIntent::Open);
    }
    back()
}

pub async fn delete_plan_entry(State(state): State<AppState>, Path(date): Path<String>) -> Redirect {
    let mut session = state.session.lock().await;
    let date = match require_date(&date) {
        Ok(date) => date,
        Err(err) => {
            session.notice = Some(err.message);
            return back();
        }
    };
    let store = state.store.as_ref();
    let result = store.delete_plan_entry(&date).await;
    if session.settle(store, "Deleting plan entry", result).await.is_ok()
        && session.plan_editor.editing() == Some(&date)
    {
        apply_plan_intent(&mut session, EditorIntent::Open);
    }
    back()
}

pub async fn submit_race(State(state): State<AppState>, Form(form): Form<RaceForm>) -> Redirect {
    let mut session = state.session.lock().await;
    let race = match form.into_new_race() {
        Ok(race) => race,
        Err(err) => {
            session.notice = Some(err.message);
            return back();
        }
    };

    let store = state.store.as_ref();
    let result = store.insert_race(race).await;
    session.settle(store, "Saving race", result).await.ok();
    back()
}

pub async fn delete_race(State(state): State<AppState>, Path(id): Path<RaceId>) -> Redirect {
    let mut session = state.session.lock().await;
    let store = state.store.as_ref();
    let result = store.delete_race(id).await;
    session.settle(store, "Deleting race", result).await.ok();
    back()
}

pub async fn dismiss_notice(State(state): State<AppState>) -> Redirect {
    state.session.lock().await.notice = None;
    back()
}

fn apply_run_intent(session: &mut Session, intent: EditorIntent<RunId>) {
    let editor = mem::take(&mut session.run_editor);
    session.run_editor = editor.apply(intent);
}

fn apply_plan_intent(session: &mut Session, intent: EditorIntent<String>) {
    let editor = mem::take(&mut session.plan_editor);
    session.plan_editor = editor.apply(intent);
}

fn back() -> Redirect {
    Redirect::to("/")
}
