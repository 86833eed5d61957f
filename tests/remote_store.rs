use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use chrono::{NaiveDate, TimeZone, Utc};
use race_flow::models::{NewRace, NewRun, PlanEntry, RunType, Snapshot};
use race_flow::session::Session;
use race_flow::stats::build_view_model_at;
use race_flow::storage::{Store, StoreError, SupabaseStore};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const API_KEY: &str = "test-anon-key";

#[derive(Default)]
struct MockDb {
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
    offline: bool,
}

type Db = Arc<Mutex<MockDb>>;

async fn table_handler(
    State(db): State<Db>,
    method: Method,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let authorized = headers.get("apikey").is_some_and(|value| value == API_KEY)
        && headers
            .get("authorization")
            .is_some_and(|value| value == format!("Bearer {API_KEY}").as_str());
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "missing api key").into_response();
    }

    let mut db = db.lock().unwrap();
    if db.offline {
        return (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response();
    }
    let prefer = headers
        .get("prefer")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    match method {
        Method::GET => {
            let mut rows = db.tables.get(&table).cloned().unwrap_or_default();
            match params.get("order").map(String::as_str) {
                Some("date.desc") => rows.sort_by(|a, b| b["date"].as_str().cmp(&a["date"].as_str())),
                Some("date.asc") => rows.sort_by(|a, b| a["date"].as_str().cmp(&b["date"].as_str())),
                _ => {}
            }
            Json(rows).into_response()
        }
        Method::POST if table == "training_plan" => {
            assert_eq!(params.get("on_conflict").map(String::as_str), Some("date"));
            assert!(prefer.contains("resolution=merge-duplicates"));
            let incoming: Vec<Value> = serde_json::from_str(&body).unwrap();
            let rows = db.tables.entry(table).or_default();
            for row in incoming {
                rows.retain(|existing| existing["date"] != row["date"]);
                rows.push(row);
            }
            StatusCode::CREATED.into_response()
        }
        Method::POST => {
            assert!(prefer.contains("return=representation"));
            let mut row: Value = serde_json::from_str(&body).unwrap();
            assert!(row.get("id").is_none());
            db.next_id += 1;
            row["id"] = json!(db.next_id);
            db.tables.entry(table).or_default().push(row.clone());
            (StatusCode::CREATED, Json(vec![row])).into_response()
        }
        Method::PATCH => {
            let id = filter_value(&params, "id");
            let patch: Value = serde_json::from_str(&body).unwrap();
            let mut updated = Vec::new();
            for row in db.tables.entry(table).or_default() {
                if row["id"].to_string() == id {
                    for (key, value) in patch.as_object().unwrap() {
                        row[key] = value.clone();
                    }
                    updated.push(row.clone());
                }
            }
            Json(updated).into_response()
        }
        Method::DELETE => {
            let (column, value) = params
                .iter()
                .find_map(|(column, value)| {
                    value.strip_prefix("eq.").map(|value| (column.clone(), value.to_string()))
                })
                .unwrap();
            let rows = db.tables.entry(table).or_default();
            let (removed, kept): (Vec<Value>, Vec<Value>) =
                rows.drain(..).partition(|row| cell_text(&row[&column]) == value);
            *rows = kept;
            Json(removed).into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

fn filter_value(params: &HashMap<String, String>, column: &str) -> String {
    params[column].trim_start_matches("eq.").to_string()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

async fn start_mock() -> (SupabaseStore, Db) {
    let (store, db, _) = start_mock_at().await;
    (store, db)
}

async fn start_mock_at() -> (SupabaseStore, Db, String) {
    let db: Db = Arc::new(Mutex::new(MockDb::default()));
    let app = Router::new()
        .route("/rest/v1/:table", any(table_handler))
        .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://{addr}/");
    let store = SupabaseStore::new(&base_url, API_KEY).unwrap();
    (store, db, base_url)
}

fn new_run(date: &str, distance: f64, run_type: RunType) -> NewRun {
    NewRun {
        date: date.to_string(),
        distance,
        duration: 50,
        run_type,
    }
}

#[tokio::test]
async fn runs_round_trip_through_hosted_store() {
    let (store, _db) = start_mock().await;

    let first = store
        .insert_run(new_run("2024-01-01", 10.0, RunType::Easy))
        .await
        .unwrap();
    let second = store
        .insert_run(new_run("2024-01-03", 12.0, RunType::Long))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let runs = store.load_runs().await.unwrap();
    assert_eq!(runs, vec![second.clone(), first.clone()]);

    store
        .update_run(first.id, new_run("2024-01-02", 11.0, RunType::Recovery))
        .await
        .unwrap();
    let runs = store.load_runs().await.unwrap();
    assert_eq!(runs[1].date, "2024-01-02");
    assert_eq!(runs[1].run_type, RunType::Recovery);

    store.delete_run(second.id).await.unwrap();
    assert!(matches!(
        store.delete_run(second.id).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store
            .update_run(999, new_run("2024-01-02", 1.0, RunType::Easy))
            .await,
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(store.load_runs().await.unwrap().len(), 1);
}

#[tokio::test]
async fn plan_rows_are_stored_snake_case() {
    let (store, db) = start_mock().await;

    for (task, km) in [(RunType::Easy, 6.0), (RunType::Tempo, 9.0)] {
        store
            .upsert_plan_entry(
                "2024-01-05",
                PlanEntry {
                    task,
                    target_km: km,
                    target_pace: "4:40".to_string(),
                },
            )
            .await
            .unwrap();
    }

    {
        let db = db.lock().unwrap();
        let rows = &db.tables["training_plan"];
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["target_km"], 9.0);
        assert_eq!(rows[0]["target_pace"], "4:40");
        assert!(rows[0].get("targetKm").is_none());
    }

    let plan = store.load_plan().await.unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan["2024-01-05"].task, RunType::Tempo);
    assert_eq!(plan["2024-01-05"].target_km, 9.0);

    store.delete_plan_entry("2024-01-05").await.unwrap();
    assert!(matches!(
        store.delete_plan_entry("2024-01-05").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn races_feed_the_active_race() {
    let (store, _db) = start_mock().await;

    for (name, date) in [("Spring Half", "2024-03-10"), ("Winter 10k", "2024-02-01")] {
        store
            .insert_race(NewRace {
                name: name.to_string(),
                date: date.to_string(),
                target_time: "0:48:00".to_string(),
            })
            .await
            .unwrap();
    }

    let races = store.load_races().await.unwrap();
    assert_eq!(races[0].date, "2024-02-01");
    assert_eq!(races[1].target_time, "0:48:00");

    let snapshot = Snapshot {
        races,
        ..Snapshot::default()
    };
    let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
    let view = build_view_model_at(today, now, &snapshot);
    assert_eq!(view.active_race.unwrap().name, "Winter 10k");
    assert_eq!(view.countdown_days, Some(17));

    let id = snapshot.races[1].id;
    store.delete_race(id).await.unwrap();
    assert_eq!(store.load_races().await.unwrap().len(), 1);
}

#[tokio::test]
async fn outage_surfaces_as_notice_without_touching_snapshot() {
    let (store, db) = start_mock().await;
    store
        .insert_run(new_run("2024-01-01", 10.0, RunType::Easy))
        .await
        .unwrap();

    let mut session = Session::default();
    session.refresh(&store).await;
    assert_eq!(session.snapshot.runs.len(), 1);
    assert_eq!(session.notice, None);

    db.lock().unwrap().offline = true;

    let err = store.load_runs().await.unwrap_err();
    assert!(matches!(err, StoreError::Status { status: 503, .. }));

    let result = store
        .insert_run(new_run("2024-01-02", 5.0, RunType::Easy))
        .await;
    assert!(session.settle(&store, "Saving run", result).await.is_err());
    assert_eq!(session.snapshot.runs.len(), 1);
    assert!(session.notice.as_deref().unwrap().starts_with("Saving run failed"));
}

#[tokio::test]
async fn wrong_key_is_rejected() {
    let (store, _db, base_url) = start_mock_at().await;
    assert!(store.load_runs().await.is_ok());

    let intruder = SupabaseStore::new(&base_url, "not-the-key").unwrap();
    assert!(matches!(
        intruder.load_plan().await,
        Err(StoreError::Status { status: 401, .. })
    ));
}
