use crate::models::{
    ChartPoint, Plan, Race, Run, Snapshot, TodaysGoal, UpcomingTask, ViewModel,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::collections::HashSet;

pub const UPCOMING_LIMIT: usize = 3;
pub const CHART_DAYS: i64 = 7;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Derives the dashboard figures for `today`. `now` only feeds the race countdown.
pub fn build_view_model_at(today: NaiveDate, now: DateTime<Utc>, snapshot: &Snapshot) -> ViewModel {
    let today_key = date_key(today);
    let active = active_race(&snapshot.races, &today_key).cloned();
    let countdown = active.as_ref().and_then(|race| countdown_days(race, now));

    ViewModel {
        todays_goal: todays_goal(&snapshot.plan, &today_key),
        km_today: km_on(&snapshot.runs, &today_key),
        progress_percent: progress_percent(&snapshot.runs, &snapshot.plan),
        upcoming_tasks: upcoming_tasks(&snapshot.plan, &today_key),
        chart_data: chart_data(&snapshot.runs, today),
        active_race: active,
        countdown_days: countdown,
        total_distance: total_distance(&snapshot.runs),
    }
}

pub fn todays_goal(plan: &Plan, today: &str) -> TodaysGoal {
    plan.get(today).map(TodaysGoal::from).unwrap_or_else(TodaysGoal::none)
}

pub fn km_on(runs: &[Run], date: &str) -> f64 {
    runs.iter()
        .filter(|run| run.date == date)
        .map(|run| run.distance)
        .sum()
}

pub fn total_distance(runs: &[Run]) -> f64 {
    runs.iter().map(|run| run.distance).sum()
}

/// Share of planned dates that have at least one run logged on the same date.
pub fn progress_percent(runs: &[Run], plan: &Plan) -> u8 {
    if plan.is_empty() {
        return 0;
    }

    let run_dates: HashSet<&str> = runs.iter().map(|run| run.date.as_str()).collect();
    let completed = plan
        .keys()
        .filter(|date| run_dates.contains(date.as_str()))
        .count();

    (100.0 * completed as f64 / plan.len() as f64).round() as u8
}

pub fn is_completed(runs: &[Run], date: &str) -> bool {
    runs.iter().any(|run| run.date == date)
}

pub fn upcoming_tasks(plan: &Plan, today: &str) -> Vec<UpcomingTask> {
    plan.iter()
        .filter(|(date, _)| date.as_str() > today)
        .take(UPCOMING_LIMIT)
        .map(|(date, entry)| UpcomingTask {
            date: date.clone(),
            task: entry.task,
            target_km: entry.target_km,
            target_pace: entry.target_pace.clone(),
        })
        .collect()
}

pub fn chart_data(runs: &[Run], today: NaiveDate) -> Vec<ChartPoint> {
    (0..CHART_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let key = date_key(date);
            ChartPoint {
                km: km_on(runs, &key),
                label: date.format("%a").to_string(),
                date: key,
            }
        })
        .collect()
}

/// Earliest race dated today or later.
pub fn active_race<'a>(races: &'a [Race], today: &str) -> Option<&'a Race> {
    races
        .iter()
        .filter(|race| race.date.as_str() >= today)
        .min_by(|a, b| a.date.cmp(&b.date))
}

/// Whole days until the race starts, rounded up. The race date is taken as midnight UTC
/// and compared against the exact instant `now`, so the result shifts by one during the
/// hours around midnight.
pub fn countdown_days(race: &Race, now: DateTime<Utc>) -> Option<i64> {
    let date = parse_date(&race.date)?;
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let millis = (start - now).num_milliseconds() as f64;
    Some((millis / MILLIS_PER_DAY).ceil() as i64)
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
