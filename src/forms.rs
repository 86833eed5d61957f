//! Coercion of submitted form fields into typed records.

use crate::errors::AppError;
use crate::models::{NewRace, NewRun, PlanEntry, RunType};
use crate::stats::parse_date;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RunForm {
    pub date: String,
    pub distance: String,
    pub duration: String,
    #[serde(rename = "type", default)]
    pub run_type: String,
}

/// The date field is disabled while an entry is edited, so browsers leave it out.
#[derive(Debug, Deserialize)]
pub struct PlanForm {
    #[serde(default)]
    pub date: Option<String>,
    pub task: String,
    #[serde(default)]
    pub target_km: String,
    #[serde(default)]
    pub target_pace: String,
}

#[derive(Debug, Deserialize)]
pub struct RaceForm {
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub target_time: String,
}

impl RunForm {
    pub fn into_new_run(self) -> Result<NewRun, AppError> {
        let run = NewRun {
            date: require_date(&self.date)?,
            distance: parse_distance(&self.distance)?,
            duration: parse_leading_int(&self.duration)
                .ok_or_else(|| AppError::bad_request("duration must be a whole number of minutes"))?,
            run_type: parse_run_type(&self.run_type)?,
        };
        Ok(run)
    }
}

impl PlanForm {
    pub fn into_entry(self) -> Result<(Option<String>, PlanEntry), AppError> {
        let date = match self.date.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(date) => Some(require_date(date)?),
        };
        let entry = PlanEntry {
            task: parse_run_type(&self.task)?,
            target_km: parse_target_km(&self.target_km),
            target_pace: self.target_pace.trim().to_string(),
        };
        Ok((date, entry))
    }
}

impl RaceForm {
    pub fn into_new_race(self) -> Result<NewRace, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("race name is required"));
        }
        Ok(NewRace {
            name: name.to_string(),
            date: require_date(&self.date)?,
            target_time: self.target_time.trim().to_string(),
        })
    }
}

/// Checks an API payload and rewrites its date into the canonical `YYYY-MM-DD` key.
pub fn validate_new_run(mut run: NewRun) -> Result<NewRun, AppError> {
    run.date = require_date(&run.date)?;
    if !run.distance.is_finite() || run.distance < 0.0 {
        return Err(AppError::bad_request("distance must be a non-negative number"));
    }
    Ok(run)
}

pub fn validate_plan_entry(entry: &PlanEntry) -> Result<(), AppError> {
    if !entry.target_km.is_finite() || entry.target_km < 0.0 {
        return Err(AppError::bad_request("targetKm must be a non-negative number"));
    }
    Ok(())
}

pub fn validate_new_race(mut race: NewRace) -> Result<NewRace, AppError> {
    race.date = require_date(&race.date)?;
    race.name = race.name.trim().to_string();
    if race.name.is_empty() {
        return Err(AppError::bad_request("race name is required"));
    }
    Ok(race)
}

pub fn require_date(value: &str) -> Result<String, AppError> {
    parse_date(value)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| AppError::bad_request(format!("'{value}' is not a YYYY-MM-DD date")))
}

fn parse_run_type(value: &str) -> Result<RunType, AppError> {
    if value.trim().is_empty() {
        return Ok(RunType::default());
    }
    value
        .parse()
        .map_err(|err: crate::models::UnknownRunType| AppError::bad_request(err.to_string()))
}

fn parse_distance(value: &str) -> Result<f64, AppError> {
    match value.trim().parse::<f64>() {
        Ok(distance) if distance.is_finite() && distance >= 0.0 => Ok(distance),
        _ => Err(AppError::bad_request("distance must be a non-negative number")),
    }
}

/// Blank or malformed targets count as zero kilometers.
fn parse_target_km(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(km) if km.is_finite() && km >= 0.0 => km,
        _ => 0.0,
    }
}

/// Reads the leading digits, so `"45.5"` and `"45 min"` are both 45.
fn parse_leading_int(value: &str) -> Option<u32> {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}
