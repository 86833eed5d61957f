use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type RunId = i64;
pub type RaceId = i64;

/// Training plan keyed by ISO calendar date (`YYYY-MM-DD`).
pub type Plan = BTreeMap<String, PlanEntry>;

/// Training-style label shared by logged runs and plan entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RunType {
    #[default]
    #[serde(rename = "Easy Run")]
    Easy,
    #[serde(rename = "Steady Run")]
    Steady,
    #[serde(rename = "Intervals")]
    Intervals,
    #[serde(rename = "Tempo Run (Threshold)")]
    Tempo,
    #[serde(rename = "Long Run")]
    Long,
    #[serde(rename = "Recovery Run")]
    Recovery,
    #[serde(rename = "Fartlek")]
    Fartlek,
    #[serde(rename = "Race")]
    Race,
}

impl RunType {
    pub const ALL: [RunType; 8] = [
        RunType::Easy,
        RunType::Steady,
        RunType::Intervals,
        RunType::Tempo,
        RunType::Long,
        RunType::Recovery,
        RunType::Fartlek,
        RunType::Race,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RunType::Easy => "Easy Run",
            RunType::Steady => "Steady Run",
            RunType::Intervals => "Intervals",
            RunType::Tempo => "Tempo Run (Threshold)",
            RunType::Long => "Long Run",
            RunType::Recovery => "Recovery Run",
            RunType::Fartlek => "Fartlek",
            RunType::Race => "Race",
        }
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown training type '{0}'")]
pub struct UnknownRunType(pub String);

impl FromStr for RunType {
    type Err = UnknownRunType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        RunType::ALL
            .into_iter()
            .find(|kind| kind.label() == value)
            .ok_or_else(|| UnknownRunType(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub date: String,
    pub distance: f64,
    pub duration: u32,
    #[serde(rename = "type")]
    pub run_type: RunType,
}

/// Run fields as submitted by the user, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRun {
    pub date: String,
    pub distance: f64,
    pub duration: u32,
    #[serde(rename = "type", default)]
    pub run_type: RunType,
}

impl NewRun {
    pub fn with_id(self, id: RunId) -> Run {
        Run {
            id,
            date: self.date,
            distance: self.distance,
            duration: self.duration,
            run_type: self.run_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub task: RunType,
    #[serde(default)]
    pub target_km: f64,
    #[serde(default)]
    pub target_pace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub id: RaceId,
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub target_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRace {
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub target_time: String,
}

impl NewRace {
    pub fn with_id(self, id: RaceId) -> Race {
        Race {
            id,
            name: self.name,
            date: self.date,
            target_time: self.target_time,
        }
    }
}

/// The three collections the dashboard is computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub runs: Vec<Run>,
    pub plan: Plan,
    pub races: Vec<Race>,
}

pub const NO_TRAINING_PLANNED: &str = "no training planned";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaysGoal {
    pub task: String,
    pub target_km: f64,
    pub target_pace: String,
}

impl TodaysGoal {
    pub fn none() -> Self {
        Self {
            task: NO_TRAINING_PLANNED.to_string(),
            target_km: 0.0,
            target_pace: "-".to_string(),
        }
    }
}

impl From<&PlanEntry> for TodaysGoal {
    fn from(entry: &PlanEntry) -> Self {
        Self {
            task: entry.task.label().to_string(),
            target_km: entry.target_km,
            target_pace: entry.target_pace.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTask {
    pub date: String,
    pub task: RunType,
    pub target_km: f64,
    pub target_pace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub label: String,
    pub km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub todays_goal: TodaysGoal,
    pub km_today: f64,
    pub progress_percent: u8,
    pub upcoming_tasks: Vec<UpcomingTask>,
    pub chart_data: Vec<ChartPoint>,
    pub active_race: Option<Race>,
    pub countdown_days: Option<i64>,
    pub total_distance: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub today: String,
    pub view_model: ViewModel,
    pub runs: Vec<Run>,
    pub plan: Plan,
    pub races: Vec<Race>,
    pub notice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_type_uses_label_on_the_wire() {
        let json = serde_json::to_string(&RunType::Tempo).unwrap();
        assert_eq!(json, "\"Tempo Run (Threshold)\"");
        let parsed: RunType = serde_json::from_str("\"Long Run\"").unwrap();
        assert_eq!(parsed, RunType::Long);
    }

    #[test]
    fn run_type_parses_every_label() {
        for kind in RunType::ALL {
            assert_eq!(kind.label().parse::<RunType>().unwrap(), kind);
        }
        let err = "Sprint".parse::<RunType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown training type 'Sprint'");
    }

    #[test]
    fn plan_entry_is_camel_case_in_memory() {
        let entry = PlanEntry {
            task: RunType::Long,
            target_km: 20.0,
            target_pace: "5:30".to_string(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["targetKm"], 20.0);
        assert_eq!(value["targetPace"], "5:30");
        assert_eq!(value["task"], "Long Run");
    }

    #[test]
    fn run_serializes_type_field() {
        let run = NewRun {
            date: "2024-01-01".to_string(),
            distance: 5.0,
            duration: 27,
            run_type: RunType::Easy,
        }
        .with_id(7);
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["type"], "Easy Run");
        assert_eq!(value["id"], 7);
    }
}
