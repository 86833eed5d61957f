use super::{Store, StoreError, sort_races, sort_runs};
use crate::models::{NewRace, NewRun, Plan, PlanEntry, Race, RaceId, Run, RunId};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error};

pub const RUNS_KEY: &str = "run-flow-v16";
pub const PLAN_KEY: &str = "run-plan-v16";
pub const RACES_KEY: &str = "race-list-v16";

/// On-disk document. Each collection lives under its own fixed key.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LocalData {
    #[serde(rename = "run-flow-v16", default)]
    pub runs: Vec<Run>,
    #[serde(rename = "run-plan-v16", default)]
    pub plan: Plan,
    #[serde(rename = "race-list-v16", default)]
    pub races: Vec<Race>,
}

pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<LocalData>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let data = load_data(&path).await;
        debug!(
            path = %path.display(),
            runs = data.runs.len(),
            plan = data.plan.len(),
            races = data.races.len(),
            "local store opened"
        );

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Applies `mutate` to a copy, persists it, and only then replaces the live data.
    async fn write<T>(
        &self,
        mutate: impl FnOnce(&mut LocalData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let output = mutate(&mut next)?;
        persist_data(&self.path, &next).await?;
        *data = next;
        Ok(output)
    }
}

pub async fn load_data(path: &Path) -> LocalData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                LocalData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LocalData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            LocalData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &LocalData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

/// Millisecond timestamp, bumped past `existing` ids when two writes share a millisecond.
fn next_id(existing: impl Iterator<Item = i64>) -> i64 {
    let now = Utc::now().timestamp_millis();
    match existing.max() {
        Some(max) if max >= now => max + 1,
        _ => now,
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load_runs(&self) -> Result<Vec<Run>, StoreError> {
        let mut runs = self.data.lock().await.runs.clone();
        sort_runs(&mut runs);
        Ok(runs)
    }

    async fn load_plan(&self) -> Result<Plan, StoreError> {
        Ok(self.data.lock().await.plan.clone())
    }

    async fn load_races(&self) -> Result<Vec<Race>, StoreError> {
        let mut races = self.data.lock().await.races.clone();
        sort_races(&mut races);
        Ok(races)
    }

    async fn insert_run(&self, run: NewRun) -> Result<Run, StoreError> {
        self.write(|data| {
            let run = run.with_id(next_id(data.runs.iter().map(|run| run.id)));
            data.runs.insert(0, run.clone());
            Ok(run)
        })
        .await
    }

    async fn update_run(&self, id: RunId, run: NewRun) -> Result<(), StoreError> {
        self.write(|data| {
            let slot = data
                .runs
                .iter_mut()
                .find(|existing| existing.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("run {id}")))?;
            *slot = run.with_id(id);
            Ok(())
        })
        .await
    }

    async fn delete_run(&self, id: RunId) -> Result<(), StoreError> {
        self.write(|data| {
            let before = data.runs.len();
            data.runs.retain(|run| run.id != id);
            if data.runs.len() == before {
                return Err(StoreError::NotFound(format!("run {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn upsert_plan_entry(&self, date: &str, entry: PlanEntry) -> Result<(), StoreError> {
        self.write(|data| {
            data.plan.insert(date.to_string(), entry);
            Ok(())
        })
        .await
    }

    async fn delete_plan_entry(&self, date: &str) -> Result<(), StoreError> {
        self.write(|data| {
            data.plan
                .remove(date)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("plan entry {date}")))
        })
        .await
    }

    async fn insert_race(&self, race: NewRace) -> Result<Race, StoreError> {
        self.write(|data| {
            let race = race.with_id(next_id(data.races.iter().map(|race| race.id)));
            data.races.push(race.clone());
            Ok(race)
        })
        .await
    }

    async fn delete_race(&self, id: RaceId) -> Result<(), StoreError> {
        self.write(|data| {
            let before = data.races.len();
            data.races.retain(|race| race.id != id);
            if data.races.len() == before {
                return Err(StoreError::NotFound(format!("race {id}")));
            }
            Ok(())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
