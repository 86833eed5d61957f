use crate::models::{PlanEntry, Race, Run, RunType, ViewModel};
use crate::pace::format_pace;
use crate::session::{Editor, Session};
use crate::stats::{is_completed, parse_date};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

pub struct Page<'a> {
    pub today: &'a str,
    pub view: &'a ViewModel,
    pub session: &'a Session,
}

pub fn render_index(page: &Page<'_>) -> String {
    let planner_open = page.session.plan_editor.is_open();
    let body = if planner_open {
        render_planner(page)
    } else {
        render_dashboard(page)
    };

    INDEX_HTML
        .replace("{{TOOLBAR}}", &render_toolbar(page.session))
        .replace("{{NOTICE}}", &render_notice(page.session.notice.as_deref()))
        .replace("{{BODY}}", &body)
}

fn render_toolbar(session: &Session) -> String {
    let planner_label = if session.plan_editor.is_open() {
        "Dashboard"
    } else {
        "Planner"
    };
    let mut out = format!(
        r#"<form method="post" action="/planner/toggle"><button class="ghost">{planner_label}</button></form>"#
    );
    if !session.plan_editor.is_open() {
        let symbol = if session.run_editor.is_open() { "&times;" } else { "+" };
        out.push_str(&format!(
            r#"<form method="post" action="/runs/form/toggle"><button class="primary" title="Log a run">{symbol}</button></form>"#
        ));
    }
    out
}

fn render_notice(notice: Option<&str>) -> String {
    match notice {
        Some(message) => format!(
            r#"<div class="notice"><span>{}</span><form method="post" action="/notice/dismiss"><button class="ghost small">Dismiss</button></form></div>"#,
            text(message)
        ),
        None => String::new(),
    }
}

fn render_dashboard(page: &Page<'_>) -> String {
    let view = page.view;
    let goal = &view.todays_goal;
    let snapshot = &page.session.snapshot;

    let mut main = format!(
        r#"<section class="hero">
  <div class="progress-row">
    <p class="eyebrow">Progress: {progress}%</p>
    <div class="progress"><div style="width: {progress}%"></div></div>
  </div>
  <h2>{task}</h2>
  <div class="tiles">
    <div class="tile"><p class="label">Target</p><p class="value">{target_km} km</p></div>
    <div class="tile mono"><p class="label">Pace</p><p class="value">{pace}</p></div>
    <div class="tile done"><p class="label">Actual</p><p class="value">{km_today:.1} km</p></div>
  </div>
</section>"#,
        progress = view.progress_percent,
        task = text(&goal.task),
        target_km = goal.target_km,
        pace = text(&goal.target_pace),
        km_today = view.km_today,
    );

    main.push_str(r#"<section><h3 class="section-title">Next sessions</h3><div class="upcoming">"#);
    if view.upcoming_tasks.is_empty() {
        main.push_str(r#"<div class="empty">No plan for the coming days</div>"#);
    }
    for task in &view.upcoming_tasks {
        main.push_str(&format!(
            r#"<div class="card"><p class="eyebrow">{date}</p><p class="task">{task}</p><div class="split"><span class="mono muted">{pace}</span><span class="km">{km} km</span></div></div>"#,
            date = display_date(&task.date, "%a %d %b"),
            task = text(task.task.label()),
            pace = text(or_dash(&task.target_pace)),
            km = task.target_km,
        ));
    }
    main.push_str("</div></section>");

    main.push_str(&render_chart(view));
    main.push_str(&render_history(&snapshot.runs, page.session));

    let mut side = String::new();
    if page.session.run_editor.is_open() {
        side.push_str(&render_run_form(page.today, &page.session.run_editor, &snapshot.runs));
    }
    side.push_str(&format!(
        r#"<section class="total"><p class="eyebrow">Total distance</p><p class="big">{:.1} <span>km</span></p></section>"#,
        view.total_distance
    ));
    side.push_str(&render_races(page.today, view, &snapshot.races));

    format!(r#"<div class="grid"><div class="main">{main}</div><aside>{side}</aside></div>"#)
}

fn render_chart(view: &ViewModel) -> String {
    let max = view
        .chart_data
        .iter()
        .map(|point| point.km)
        .fold(0.0_f64, f64::max);
    let mut out = String::from(r#"<section class="chart">"#);
    for point in &view.chart_data {
        let height = if max > 0.0 { point.km / max * 100.0 } else { 0.0 };
        out.push_str(&format!(
            r#"<div class="bar" title="{date}: {km:.1} km"><div class="fill" style="height: {height:.0}%"></div><span>{label}</span></div>"#,
            date = point.date,
            km = point.km,
            label = point.label,
        ));
    }
    out.push_str("</section>");
    out
}

fn render_history(runs: &[Run], session: &Session) -> String {
    let mut out = String::from(r#"<section class="history"><h3 class="section-title">History</h3>"#);
    for run in runs {
        let editing = session.run_editor.editing() == Some(&run.id);
        out.push_str(&format!(
            r#"<div class="run{editing}">
  <div class="day"><p>{month}</p><p class="num">{day}</p></div>
  <div class="info"><p class="task">{kind}</p><p class="eyebrow">{pace} min/km &bull; {duration} min</p></div>
  <div class="km">{distance:.1} <span>km</span></div>
  <div class="actions">
    <form method="post" action="/runs/{id}/edit"><button class="ghost small">Edit</button></form>
    <form method="post" action="/runs/{id}/delete" onsubmit="return confirm('Delete?')"><button class="ghost small danger">Delete</button></form>
  </div>
</div>"#,
            editing = if editing { " editing" } else { "" },
            month = display_date(&run.date, "%b"),
            day = display_date(&run.date, "%-d"),
            kind = text(run.run_type.label()),
            pace = format_pace(run.distance, run.duration),
            duration = run.duration,
            distance = run.distance,
            id = run.id,
        ));
    }
    out.push_str("</section>");
    out
}

fn render_run_form(today: &str, editor: &Editor<i64>, runs: &[Run]) -> String {
    let current = editor
        .editing()
        .and_then(|id| runs.iter().find(|run| run.id == *id));
    let (title, date, distance, duration, kind) = match current {
        Some(run) => (
            "Edit log",
            run.date.clone(),
            run.distance.to_string(),
            run.duration.to_string(),
            run.run_type,
        ),
        None => ("Log a run", today.to_string(), String::new(), String::new(), RunType::default()),
    };

    format!(
        r#"<section class="form-card">
  <h3>{title}</h3>
  <form method="post" action="/runs/form" class="stack">
    <select name="type">{options}</select>
    <input type="date" name="date" value="{date}" required />
    <div class="pair">
      <input type="number" step="0.1" min="0" name="distance" placeholder="km" value="{distance}" required />
      <input type="number" min="0" name="duration" placeholder="min" value="{duration}" required />
    </div>
    <button class="primary wide">Save</button>
  </form>
  <form method="post" action="/runs/form/cancel"><button class="ghost small">Cancel</button></form>
</section>"#,
        options = run_type_options(kind),
        date = attr(&date),
        distance = attr(&distance),
        duration = attr(&duration),
    )
}

fn render_races(today: &str, view: &ViewModel, races: &[Race]) -> String {
    let mut out = String::from(r#"<section class="races"><p class="eyebrow">Next race</p>"#);
    match (&view.active_race, view.countdown_days) {
        (Some(race), countdown) => {
            let countdown = match countdown {
                Some(days) if days > 0 => format!("{days} days to go"),
                Some(_) => "Race day".to_string(),
                None => String::new(),
            };
            out.push_str(&format!(
                r#"<h3>{name}</h3><p class="muted">{date} &bull; target {target}</p><p class="big">{countdown}</p>"#,
                name = text(&race.name),
                date = display_date(&race.date, "%d %b %Y"),
                target = text(or_dash(&race.target_time)),
            ));
        }
        (None, _) => out.push_str(r#"<p class="muted">No race scheduled</p>"#),
    }

    out.push_str(r#"<ul class="race-list">"#);
    for race in races {
        let past = race.date.as_str() < today;
        out.push_str(&format!(
            r#"<li class="{class}"><span>{date}</span><span>{name}</span><form method="post" action="/races/{id}/delete" onsubmit="return confirm('Delete?')"><button class="ghost small danger">&times;</button></form></li>"#,
            class = if past { "past" } else { "" },
            date = display_date(&race.date, "%d %b"),
            name = text(&race.name),
            id = race.id,
        ));
    }
    out.push_str("</ul>");

    out.push_str(&format!(
        r#"<form method="post" action="/races/form" class="stack">
  <input type="text" name="name" placeholder="Race name" required />
  <input type="date" name="date" value="{today}" required />
  <input type="text" name="target_time" placeholder="Target time" />
  <button class="primary wide">Add race</button>
</form></section>"#,
        today = attr(today),
    ));
    out
}

fn render_planner(page: &Page<'_>) -> String {
    let editor = &page.session.plan_editor;
    let snapshot = &page.session.snapshot;
    let editing = editor
        .editing()
        .and_then(|date| snapshot.plan.get(date).map(|entry| (date, entry)));

    let (title, date_input, entry) = match editing {
        Some((date, entry)) => (
            "Adjust plan",
            format!(r#"<input type="date" value="{}" disabled />"#, attr(date)),
            entry.clone(),
        ),
        None => (
            "Plan a session",
            format!(
                r#"<input type="date" name="date" value="{}" required />"#,
                attr(page.today)
            ),
            PlanEntry {
                task: RunType::default(),
                target_km: 0.0,
                target_pace: String::new(),
            },
        ),
    };
    let target_km = if editing.is_some() {
        entry.target_km.to_string()
    } else {
        String::new()
    };
    let cancel = if editing.is_some() {
        r#"<form method="post" action="/plan/form/cancel"><button class="ghost small">Cancel</button></form>"#
    } else {
        ""
    };

    let mut out = format!(
        r#"<section class="form-card{highlight}">
  <h2>{title}</h2>
  <form method="post" action="/plan/form" class="row">
    {date_input}
    <select name="task">{options}</select>
    <input type="number" step="0.1" min="0" name="target_km" placeholder="Target km" value="{target_km}" />
    <input type="text" name="target_pace" placeholder="Pace" class="mono" value="{pace}" />
    <button class="primary">Save</button>
  </form>
  {cancel}
</section>"#,
        highlight = if editing.is_some() { " editing" } else { "" },
        options = run_type_options(entry.task),
        target_km = attr(&target_km),
        pace = attr(&entry.target_pace),
    );

    out.push_str(
        r#"<section class="table"><table><thead><tr><th>Status</th><th>Date</th><th>Session</th><th class="right">Target</th><th></th></tr></thead><tbody>"#,
    );
    for (date, entry) in &snapshot.plan {
        let done = is_completed(&snapshot.runs, date);
        let missed = date.as_str() < page.today && !done;
        out.push_str(&format!(
            r#"<tr class="{class}"><td class="center">{status}</td><td>{display}</td><td>{task} <span class="mono accent">{pace}</span></td><td class="right">{km} km</td><td class="actions"><form method="post" action="/plan/{key}/edit"><button class="ghost small">Edit</button></form><form method="post" action="/plan/{key}/delete" onsubmit="return confirm('Delete?')"><button class="ghost small danger">Delete</button></form></td></tr>"#,
            class = if missed { "missed" } else { "" },
            status = if done { r#"<span class="check">&#10003;</span>"# } else { r#"<span class="open"></span>"# },
            display = display_date(date, "%d %b"),
            task = text(entry.task.label()),
            pace = text(&entry.target_pace),
            km = entry.target_km,
            key = attr(date),
        ));
    }
    out.push_str("</tbody></table></section>");
    out
}

fn run_type_options(selected: RunType) -> String {
    RunType::ALL
        .iter()
        .map(|kind| {
            format!(
                r#"<option value="{value}"{selected}>{label}</option>"#,
                value = attr(kind.label()),
                selected = if *kind == selected { " selected" } else { "" },
                label = text(kind.label()),
            )
        })
        .collect()
}

fn display_date(value: &str, format: &str) -> String {
    match parse_date(value) {
        Some(date) => date.format(format).to_string(),
        None => text(value).into_owned(),
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Race.Flow</title>
  <style>
    :root {
      --bg: #f8fafc;
      --ink: #0f172a;
      --muted: #94a3b8;
      --accent: #2563eb;
      --done: #10b981;
      --danger: #ef4444;
      --card: #ffffff;
      --line: #e2e8f0;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      max-width: 1100px;
      margin: 0 auto;
      display: grid;
      gap: 28px;
    }

    header {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    h1 {
      margin: 0;
      font-style: italic;
      font-weight: 900;
      text-transform: uppercase;
      letter-spacing: -0.04em;
    }

    .toolbar {
      display: flex;
      gap: 8px;
    }

    button {
      font: inherit;
      cursor: pointer;
      border-radius: 16px;
      padding: 8px 16px;
      font-weight: 700;
    }

    .primary {
      background: var(--accent);
      color: #fff;
      border: none;
    }

    .ghost {
      background: #fff;
      border: 1px solid var(--line);
      color: #475569;
    }

    .small {
      padding: 4px 10px;
      font-size: 0.75rem;
    }

    .wide {
      width: 100%;
    }

    .danger:hover {
      color: var(--danger);
    }

    .notice {
      display: flex;
      justify-content: space-between;
      align-items: center;
      background: #fef3c7;
      border: 1px solid #fcd34d;
      border-radius: 16px;
      padding: 12px 18px;
    }

    .grid {
      display: grid;
      grid-template-columns: 2fr 1fr;
      gap: 28px;
    }

    .main, aside {
      display: grid;
      gap: 24px;
      align-content: start;
    }

    section {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 32px;
      padding: 24px;
    }

    .hero {
      background: var(--ink);
      color: #fff;
    }

    .hero h2 {
      font-size: 2.2rem;
      font-style: italic;
      margin: 12px 0 24px;
    }

    .progress-row, .split {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    .progress {
      width: 128px;
      height: 6px;
      background: rgba(255, 255, 255, 0.1);
      border-radius: 999px;
      overflow: hidden;
    }

    .progress div {
      height: 100%;
      background: var(--accent);
    }

    .tiles, .upcoming {
      display: grid;
      grid-template-columns: repeat(3, 1fr);
      gap: 16px;
    }

    .tile {
      background: rgba(255, 255, 255, 0.05);
      border: 1px solid rgba(255, 255, 255, 0.1);
      border-radius: 24px;
      padding: 16px;
      text-align: center;
    }

    .tile.done .value {
      color: var(--done);
    }

    .label, .eyebrow {
      font-size: 0.65rem;
      font-weight: 900;
      text-transform: uppercase;
      letter-spacing: 0.2em;
      color: var(--muted);
      margin: 0 0 4px;
    }

    .value, .big {
      font-size: 1.6rem;
      font-weight: 900;
      margin: 0;
    }

    .big span, .km span {
      font-size: 0.8rem;
      font-weight: 400;
      opacity: 0.6;
    }

    .section-title {
      margin: 0 0 16px;
      font-size: 0.7rem;
      text-transform: uppercase;
      letter-spacing: 0.2em;
      color: var(--muted);
    }

    .card {
      border: 1px solid var(--line);
      border-radius: 24px;
      padding: 16px;
    }

    .task {
      font-weight: 700;
      margin: 0 0 8px;
    }

    .km {
      font-weight: 900;
      font-style: italic;
      font-size: 1.3rem;
    }

    .empty {
      grid-column: span 3;
      border: 2px dashed var(--line);
      border-radius: 24px;
      padding: 20px;
      text-align: center;
      color: var(--muted);
      font-size: 0.7rem;
      font-weight: 900;
      text-transform: uppercase;
    }

    .chart {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 12px;
      height: 220px;
      align-items: end;
    }

    .bar {
      height: 100%;
      display: flex;
      flex-direction: column;
      justify-content: flex-end;
      align-items: center;
      gap: 6px;
    }

    .bar .fill {
      width: 40px;
      background: var(--accent);
      border-radius: 6px;
      min-height: 2px;
    }

    .bar span {
      font-size: 0.7rem;
      font-weight: 800;
      color: #cbd5e1;
    }

    .run {
      display: grid;
      grid-template-columns: 60px 1fr auto auto;
      gap: 16px;
      align-items: center;
      padding: 14px 0;
      border-top: 1px solid #f1f5f9;
    }

    .run.editing {
      background: #eff6ff;
    }

    .day {
      text-align: center;
      background: var(--bg);
      border-radius: 12px;
      padding: 6px;
    }

    .day p {
      margin: 0;
      font-size: 0.65rem;
      font-weight: 900;
      text-transform: uppercase;
      color: var(--muted);
    }

    .day .num {
      font-size: 1.2rem;
      color: var(--ink);
    }

    .info .eyebrow {
      color: var(--accent);
    }

    .actions {
      display: flex;
      gap: 6px;
    }

    .form-card {
      border: 2px solid var(--accent);
    }

    .form-card.editing {
      border-color: var(--accent);
      box-shadow: 0 12px 30px rgba(37, 99, 235, 0.15);
    }

    .stack {
      display: grid;
      gap: 12px;
    }

    .row {
      display: grid;
      grid-template-columns: repeat(5, 1fr);
      gap: 12px;
    }

    .pair {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 10px;
    }

    input, select {
      font: inherit;
      padding: 12px;
      border-radius: 16px;
      border: 1px solid #f1f5f9;
      background: var(--bg);
    }

    .total {
      background: var(--accent);
      color: #fff;
    }

    .total .eyebrow {
      color: #dbeafe;
    }

    .race-list {
      list-style: none;
      padding: 0;
      margin: 16px 0;
    }

    .race-list li {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 8px;
      padding: 6px 0;
    }

    .race-list li.past {
      opacity: 0.4;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th {
      text-align: left;
      font-size: 0.65rem;
      text-transform: uppercase;
      letter-spacing: 0.2em;
      color: var(--muted);
      padding: 12px;
    }

    td {
      padding: 12px;
      border-top: 1px solid #f1f5f9;
    }

    tr.missed {
      opacity: 0.4;
    }

    .check {
      color: var(--done);
      font-weight: 900;
    }

    .open {
      display: inline-block;
      width: 18px;
      height: 18px;
      border: 2px solid var(--line);
      border-radius: 50%;
    }

    .mono {
      font-family: "JetBrains Mono", monospace;
    }

    .muted {
      color: var(--muted);
    }

    .accent {
      color: var(--accent);
      font-size: 0.7rem;
    }

    .right {
      text-align: right;
    }

    .center {
      text-align: center;
    }

    @media (max-width: 860px) {
      .grid, .row, .tiles, .upcoming {
        grid-template-columns: 1fr;
      }

      .empty {
        grid-column: span 1;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Race.Flow</h1>
      <div class="toolbar">{{TOOLBAR}}</div>
    </header>
    {{NOTICE}}
    {{BODY}}
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRun, Snapshot};
    use crate::session::EditorIntent;
    use crate::stats::build_view_model_at;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn render(session: &Session) -> String {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let view = build_view_model_at(today, now, &session.snapshot);
        render_index(&Page {
            today: "2024-01-15",
            view: &view,
            session,
        })
    }

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.runs.push(
            NewRun {
                date: "2024-01-15".to_string(),
                distance: 10.0,
                duration: 50,
                run_type: RunType::Steady,
            }
            .with_id(1),
        );
        snapshot.plan.insert(
            "2024-01-15".to_string(),
            PlanEntry {
                task: RunType::Steady,
                target_km: 10.0,
                target_pace: "5:00".to_string(),
            },
        );
        snapshot.races.push(Race {
            id: 3,
            name: "<City> Half".to_string(),
            date: "2024-02-01".to_string(),
            target_time: "1:40:00".to_string(),
        });
        snapshot
    }

    #[test]
    fn dashboard_shows_goal_history_and_race() {
        let session = Session::new(sample_snapshot());
        let html = render(&session);

        assert!(html.contains("Progress: 100%"));
        assert!(html.contains("Steady Run"));
        assert!(html.contains("5:00 min/km"));
        assert!(html.contains("17 days to go"));
        assert!(html.contains("&lt;City&gt; Half"));
        assert!(!html.contains("<City>"));
        assert!(!html.contains("{{"));
        assert!(!html.contains("/runs/form/cancel"));
    }

    #[test]
    fn editing_run_prefills_form() {
        let mut session = Session::new(sample_snapshot());
        session.run_editor = session.run_editor.clone().apply(EditorIntent::Edit(1));
        let html = render(&session);

        assert!(html.contains("Edit log"));
        assert!(html.contains(r#"name="distance" placeholder="km" value="10""#));
    }

    #[test]
    fn planner_marks_completed_dates() {
        let mut session = Session::new(sample_snapshot());
        session.plan_editor = session.plan_editor.clone().apply(EditorIntent::Open);
        session.notice = Some("Saving plan failed".to_string());
        let html = render(&session);

        assert!(html.contains("Plan a session"));
        assert!(html.contains("&#10003;"));
        assert!(html.contains("Saving plan failed"));
        assert!(html.contains(">Dashboard<"));
    }
}
