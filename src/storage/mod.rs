//! Persistence adapters for runs, the training plan and races.
//!
//! Two backends implement [`Store`]: a local JSON document keyed by fixed names and a
//! hosted PostgREST database. Callers never mutate their in-memory snapshot on a
//! failed write; they reload instead.

pub mod local;
pub mod remote;

use crate::models::{NewRace, NewRun, Plan, PlanEntry, Race, RaceId, Run, RunId, Snapshot};
use async_trait::async_trait;

pub use local::JsonFileStore;
pub use remote::SupabaseStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored data: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("request to hosted store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("hosted store answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response from hosted store: {0}")]
    UnexpectedResponse(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Runs ordered by date, newest first.
    async fn load_runs(&self) -> Result<Vec<Run>, StoreError>;
    async fn load_plan(&self) -> Result<Plan, StoreError>;
    /// Races ordered by date, earliest first.
    async fn load_races(&self) -> Result<Vec<Race>, StoreError>;

    async fn insert_run(&self, run: NewRun) -> Result<Run, StoreError>;
    async fn update_run(&self, id: RunId, run: NewRun) -> Result<(), StoreError>;
    async fn delete_run(&self, id: RunId) -> Result<(), StoreError>;

    async fn upsert_plan_entry(&self, date: &str, entry: PlanEntry) -> Result<(), StoreError>;
    async fn delete_plan_entry(&self, date: &str) -> Result<(), StoreError>;

    async fn insert_race(&self, race: NewRace) -> Result<Race, StoreError>;
    async fn delete_race(&self, id: RaceId) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Loads all three collections, failing if any one of them fails.
pub async fn load_snapshot(store: &dyn Store) -> Result<Snapshot, StoreError> {
    let (runs, plan, races) =
        tokio::try_join!(store.load_runs(), store.load_plan(), store.load_races())?;
    Ok(Snapshot { runs, plan, races })
}

pub(crate) fn sort_runs(runs: &mut [Run]) {
    runs.sort_by(|a, b| b.date.cmp(&a.date));
}

pub(crate) fn sort_races(races: &mut [Race]) {
    races.sort_by(|a, b| a.date.cmp(&b.date));
}
