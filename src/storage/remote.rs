//! Hosted store speaking the PostgREST dialect (`/rest/v1/{table}`).
//!
//! Rows use snake_case column names. [`RunRow`], [`PlanRow`] and [`RaceRow`] are the
//! only place those names appear; everything past this module sees the in-memory
//! models.

use super::{Store, StoreError, sort_races, sort_runs};
use crate::models::{NewRace, NewRun, Plan, PlanEntry, Race, RaceId, Run, RunId, RunType};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

pub const RUNS_TABLE: &str = "runs";
pub const PLAN_TABLE: &str = "training_plan";
pub const RACES_TABLE: &str = "races";

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RunId>,
    pub date: String,
    pub distance: f64,
    pub duration: u32,
    #[serde(rename = "type")]
    pub run_type: RunType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    pub date: String,
    pub task: RunType,
    #[serde(default)]
    pub target_km: Option<f64>,
    #[serde(default)]
    pub target_pace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RaceId>,
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub target_time: Option<String>,
}

impl From<&NewRun> for RunRow {
    fn from(run: &NewRun) -> Self {
        Self {
            id: None,
            date: run.date.clone(),
            distance: run.distance,
            duration: run.duration,
            run_type: run.run_type,
        }
    }
}

impl TryFrom<RunRow> for Run {
    type Error = StoreError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .ok_or_else(|| StoreError::UnexpectedResponse("run row without id".to_string()))?;
        Ok(Run {
            id,
            date: row.date,
            distance: row.distance,
            duration: row.duration,
            run_type: row.run_type,
        })
    }
}

impl PlanRow {
    pub fn new(date: &str, entry: PlanEntry) -> Self {
        Self {
            date: date.to_string(),
            task: entry.task,
            target_km: Some(entry.target_km),
            target_pace: Some(entry.target_pace),
        }
    }

    pub fn into_entry(self) -> (String, PlanEntry) {
        let entry = PlanEntry {
            task: self.task,
            target_km: self.target_km.unwrap_or(0.0),
            target_pace: self.target_pace.unwrap_or_default(),
        };
        (self.date, entry)
    }
}

impl From<&NewRace> for RaceRow {
    fn from(race: &NewRace) -> Self {
        Self {
            id: None,
            name: race.name.clone(),
            date: race.date.clone(),
            target_time: Some(race.target_time.clone()),
        }
    }
}

impl TryFrom<RaceRow> for Race {
    type Error = StoreError;

    fn try_from(row: RaceRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .ok_or_else(|| StoreError::UnexpectedResponse("race row without id".to_string()))?;
        Ok(Race {
            id,
            name: row.name,
            date: row.date,
            target_time: row.target_time.unwrap_or_default(),
        })
    }
}

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch<T: DeserializeOwned>(&self, table: &str, order: Option<&str>) -> Result<Vec<T>, StoreError> {
        let mut request = self.request(Method::GET, table).query(&[("select", "*")]);
        if let Some(order) = order {
            request = request.query(&[("order", order)]);
        }
        let rows = check(request.send().await?).await?.json().await?;
        Ok(rows)
    }

    /// Deletes rows matching `column = value`, returning how many were removed.
    async fn delete_where(&self, table: &str, column: &str, value: &str) -> Result<usize, StoreError> {
        let response = self
            .request(Method::DELETE, table)
            .query(&[(column, format!("eq.{value}"))])
            .header("Prefer", PREFER_REPRESENTATION)
            .send()
            .await?;
        let removed: Vec<serde_json::Value> = check(response).await?.json().await?;
        Ok(removed.len())
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %body, "hosted store rejected request");
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Store for SupabaseStore {
    async fn load_runs(&self) -> Result<Vec<Run>, StoreError> {
        let rows: Vec<RunRow> = self.fetch(RUNS_TABLE, Some("date.desc")).await?;
        let mut runs = rows.into_iter().map(Run::try_from).collect::<Result<Vec<_>, _>>()?;
        sort_runs(&mut runs);
        Ok(runs)
    }

    async fn load_plan(&self) -> Result<Plan, StoreError> {
        let rows: Vec<PlanRow> = self.fetch(PLAN_TABLE, None).await?;
        Ok(rows.into_iter().map(PlanRow::into_entry).collect())
    }

    async fn load_races(&self) -> Result<Vec<Race>, StoreError> {
        let rows: Vec<RaceRow> = self.fetch(RACES_TABLE, Some("date.asc")).await?;
        let mut races = rows.into_iter().map(Race::try_from).collect::<Result<Vec<_>, _>>()?;
        sort_races(&mut races);
        Ok(races)
    }

    async fn insert_run(&self, run: NewRun) -> Result<Run, StoreError> {
        let response = self
            .request(Method::POST, RUNS_TABLE)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&RunRow::from(&run))
            .send()
            .await?;
        let rows: Vec<RunRow> = check(response).await?.json().await?;
        let row = rows.into_iter().next().ok_or_else(|| {
            StoreError::UnexpectedResponse("insert returned no run".to_string())
        })?;
        let run = Run::try_from(row)?;
        debug!(id = run.id, "run inserted");
        Ok(run)
    }

    async fn update_run(&self, id: RunId, run: NewRun) -> Result<(), StoreError> {
        let response = self
            .request(Method::PATCH, RUNS_TABLE)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&RunRow::from(&run))
            .send()
            .await?;
        let rows: Vec<RunRow> = check(response).await?.json().await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("run {id}")));
        }
        Ok(())
    }

    async fn delete_run(&self, id: RunId) -> Result<(), StoreError> {
        match self.delete_where(RUNS_TABLE, "id", &id.to_string()).await? {
            0 => Err(StoreError::NotFound(format!("run {id}"))),
            _ => Ok(()),
        }
    }

    async fn upsert_plan_entry(&self, date: &str, entry: PlanEntry) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, PLAN_TABLE)
            .query(&[("on_conflict", "date")])
            .header("Prefer", PREFER_UPSERT)
            .json(&[PlanRow::new(date, entry)])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_plan_entry(&self, date: &str) -> Result<(), StoreError> {
        match self.delete_where(PLAN_TABLE, "date", date).await? {
            0 => Err(StoreError::NotFound(format!("plan entry {date}"))),
            _ => Ok(()),
        }
    }

    async fn insert_race(&self, race: NewRace) -> Result<Race, StoreError> {
        let response = self
            .request(Method::POST, RACES_TABLE)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&RaceRow::from(&race))
            .send()
            .await?;
        let rows: Vec<RaceRow> = check(response).await?.json().await?;
        let row = rows.into_iter().next().ok_or_else(|| {
            StoreError::UnexpectedResponse("insert returned no race".to_string())
        })?;
        Race::try_from(row)
    }

    async fn delete_race(&self, id: RaceId) -> Result<(), StoreError> {
        match self.delete_where(RACES_TABLE, "id", &id.to_string()).await? {
            0 => Err(StoreError::NotFound(format!("race {id}"))),
            _ => Ok(()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_row_uses_snake_case_columns() {
        let entry = PlanEntry {
            task: RunType::Long,
            target_km: 20.0,
            target_pace: "5:30".to_string(),
        };
        let value = serde_json::to_value(PlanRow::new("2024-01-01", entry.clone())).unwrap();
        assert_eq!(value["target_km"], 20.0);
        assert_eq!(value["target_pace"], "5:30");
        assert_eq!(value["task"], "Long Run");
        assert!(value.get("targetKm").is_none());

        let row: PlanRow = serde_json::from_value(value).unwrap();
        assert_eq!(row.into_entry(), ("2024-01-01".to_string(), entry));
    }

    #[test]
    fn plan_row_tolerates_null_targets() {
        let row: PlanRow = serde_json::from_str(
            r#"{"date":"2024-01-01","task":"Fartlek","target_km":null,"target_pace":null}"#,
        )
        .unwrap();
        let (_, entry) = row.into_entry();
        assert_eq!(entry.target_km, 0.0);
        assert_eq!(entry.target_pace, "");
    }

    #[test]
    fn new_rows_omit_id() {
        let run = NewRun {
            date: "2024-01-01".to_string(),
            distance: 10.0,
            duration: 50,
            run_type: RunType::Steady,
        };
        let value = serde_json::to_value(RunRow::from(&run)).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["type"], "Steady Run");

        let race = NewRace {
            name: "City Marathon".to_string(),
            date: "2024-04-07".to_string(),
            target_time: "3:15:00".to_string(),
        };
        let value = serde_json::to_value(RaceRow::from(&race)).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["target_time"], "3:15:00");
    }

    #[test]
    fn rows_without_id_are_rejected() {
        let row = RaceRow {
            id: None,
            name: "Trail".to_string(),
            date: "2024-05-01".to_string(),
            target_time: None,
        };
        assert!(matches!(Race::try_from(row), Err(StoreError::UnexpectedResponse(_))));
    }

    #[test]
    fn table_urls_ignore_trailing_slash() {
        let store = SupabaseStore::new("https://example.supabase.co/", "key").unwrap();
        assert_eq!(
            store.table_url(PLAN_TABLE),
            "https://example.supabase.co/rest/v1/training_plan"
        );
    }
}
