//! Read-only subcommands: validate, dashboard and anomalies.

use crate::Settings;
use aif_core::calendar_day::today;
use aif_core::{CalendarDay, Dataset, Timestamp};
use aif_data::dashboard::{analyze, AnalysisOptions, DashboardView};
use aif_data::session::{initial_base_date, month_index, RefillLevel, YearMonth};
use aif_data::statistics::NextRefill;
use aif_data::warnings::{anomaly_scan, Anomaly, RefillWarning};
use aif_data::window::ClampOutcome;
use aif_utils::dates::{format_slash_date, format_timestamp};
use aif_utils::display::{format_ratio_percent, format_volume};
use anyhow::Context;
use std::fmt::Write;
use std::path::Path;

/// User inputs for one dashboard render.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub base_date: Option<CalendarDay>,
    pub shift: Option<i64>,
    pub month: Option<String>,
    pub refill_level: f64,
    pub radius: i64,
    pub anomaly_threshold: f64,
    pub json: bool,
}

/// Read and validate `file`, or the predictions artifact when none is given.
pub fn load_dataset(settings: &Settings, file: Option<&Path>) -> anyhow::Result<Dataset> {
    match file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Dataset::parse(&text).with_context(|| format!("{} is not a valid forecast", path.display()))
        }
        None => {
            let store = settings.store();
            store.load_predictions().with_context(|| {
                format!(
                    "failed to load predictions from {}",
                    store.predictions_path().display()
                )
            })
        }
    }
}

pub fn run_validate(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let dataset = match Dataset::parse(&text) {
        Ok(dataset) => dataset,
        Err(err) => {
            let location = err.line().map(|l| format!(" (line {l})")).unwrap_or_default();
            anyhow::bail!("{}{}: {}", err.kind(), location, err);
        }
    };
    println!("{}", validation_summary(&dataset));
    Ok(())
}

fn validation_summary(dataset: &Dataset) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "valid: {} rows", dataset.len());
    if let (Some(first), Some(last)) = (dataset.first_day(), dataset.last_day()) {
        let _ = writeln!(
            out,
            "range: {} - {}",
            format_slash_date(&first.as_naive_date()),
            format_slash_date(&last.as_naive_date())
        );
    }
    if let Some(violation) = dataset.order_violation() {
        let _ = writeln!(
            out,
            "line {} is dated before line {} (rows were sorted)",
            violation.line,
            violation.line - 1
        );
    }
    let zero_actual = dataset.zero_actual_rows();
    if !zero_actual.is_empty() {
        let _ = writeln!(
            out,
            "{} rows with zero actual ammonia (percentage check skipped)",
            zero_actual.len()
        );
    }
    let anomalies = anomaly_scan(dataset.rows(), aif_data::warnings::DEFAULT_ANOMALY_THRESHOLD);
    let _ = write!(out, "{} anomalies", anomalies.len());
    out
}

pub fn run_dashboard(
    settings: &Settings,
    file: Option<&Path>,
    request: &DashboardRequest,
) -> anyhow::Result<()> {
    let dataset = load_dataset(settings, file)?;
    let months = month_index(&dataset);
    let base = resolve_base(&dataset, &months, request, today())?;
    let level = RefillLevel::new(request.refill_level).with_context(|| {
        format!(
            "refill level {} is outside {}..={}",
            request.refill_level,
            aif_data::session::REFILL_LEVEL_MIN,
            aif_data::session::REFILL_LEVEL_MAX
        )
    })?;
    let options = AnalysisOptions {
        radius_days: request.radius.max(0),
        anomaly_threshold: request.anomaly_threshold,
    };
    let view = analyze(&dataset, base, level, options);
    if request.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", render_text(&view, &months));
    }
    Ok(())
}

/// Pick the base date from the request, then apply the day shift.
pub fn resolve_base(
    dataset: &Dataset,
    months: &[YearMonth],
    request: &DashboardRequest,
    today: CalendarDay,
) -> anyhow::Result<CalendarDay> {
    let base = match (&request.month, request.base_date) {
        (Some(key), _) => {
            let month = months
                .iter()
                .find(|m| m.key() == *key)
                .with_context(|| {
                    let available: Vec<String> = months.iter().map(YearMonth::key).collect();
                    format!("no data in {key}; available: {}", available.join(", "))
                })?;
            month
                .first_day()
                .with_context(|| format!("invalid month {key}"))?
        }
        (None, Some(day)) => day,
        (None, None) => initial_base_date(dataset, today).context("dataset has no rows")?,
    };
    match request.shift {
        Some(days) => base
            .shift(days)
            .with_context(|| format!("cannot move {base} by {days} days")),
        None => Ok(base),
    }
}

fn day_label(ts: &Timestamp) -> String {
    format_slash_date(&CalendarDay::of(ts).as_naive_date())
}

fn next_refill_label(next: &NextRefill) -> String {
    match (next.date(), next.days()) {
        (Some(date), Some(days)) => {
            let scheduled = matches!(next, NextRefill::ScheduledRefill { .. });
            format!(
                "{} ({} days{})",
                day_label(&date),
                days,
                if scheduled { ", scheduled refill" } else { "" }
            )
        }
        _ if *next == NextRefill::NoForecastData => {
            "no forecast data after the base date".to_string()
        }
        _ => "none within the forecast horizon".to_string(),
    }
}

fn anomaly_line(a: &Anomaly) -> String {
    format!(
        "  row {}: {} -> {} changed {} without a refill flag",
        a.line,
        format_timestamp(&a.previous_date),
        format_timestamp(&a.date),
        format_volume(a.change)
    )
}

/// Plain-text rendering of a dashboard view.
pub fn render_text(view: &DashboardView<'_>, months: &[YearMonth]) -> String {
    let mut out = String::new();
    let base = format_slash_date(&view.base.as_naive_date());
    match view.clamp {
        ClampOutcome::InRange => {
            let _ = writeln!(out, "Base date      {base}");
        }
        ClampOutcome::ClampedBefore | ClampOutcome::ClampedAfterRangeExceeded => {
            let _ = writeln!(
                out,
                "Base date      {base} (requested {} is outside the data)",
                format_slash_date(&view.requested_base.as_naive_date())
            );
        }
    }
    let _ = writeln!(
        out,
        "Window         {} - {} ({} rows)",
        day_label(&view.window_start),
        day_label(&view.window_end),
        view.rows.len()
    );
    let _ = writeln!(out, "Refill level   {}", format_volume(view.refill_level));

    match &view.statistics {
        Some(stats) => {
            let stock = stats
                .current_stock
                .map(format_volume)
                .unwrap_or_else(|| "no data for the base date".to_string());
            let _ = writeln!(out, "Current stock  {stock}");
            let _ = writeln!(out, "Accuracy (R²)  {}", format_ratio_percent(stats.accuracy));
            let _ = writeln!(out, "Avg error      {}", format_volume(stats.avg_error));
            let _ = writeln!(out, "Next refill    {}", next_refill_label(&stats.next_refill));
        }
        None => {
            let _ = writeln!(out, "No data in this window");
        }
    }

    match &view.refill_warning {
        RefillWarning::Breach { days, level, date } => {
            let _ = writeln!(
                out,
                "WARNING: stock falls to {} in {} days ({})",
                format_volume(*level),
                days,
                day_label(date)
            );
        }
        RefillWarning::BaseDateBeyondRange { last_day } => {
            let _ = writeln!(
                out,
                "WARNING: base date is past the last forecast day {}",
                format_slash_date(&last_day.as_naive_date())
            );
        }
        RefillWarning::NoData | RefillWarning::Clear => {}
    }

    if !view.anomalies.is_empty() {
        let _ = writeln!(out, "Anomalies ({})", view.anomalies.len());
        for a in &view.anomalies {
            let _ = writeln!(out, "{}", anomaly_line(a));
        }
    }

    let labels: Vec<String> = months.iter().map(YearMonth::label).collect();
    let _ = write!(out, "Months         {}", labels.join(" "));
    out
}

pub fn run_anomalies(settings: &Settings, file: Option<&Path>, threshold: f64) -> anyhow::Result<()> {
    let dataset = load_dataset(settings, file)?;
    let anomalies = anomaly_scan(dataset.rows(), threshold);
    if anomalies.is_empty() {
        println!("no anomalies above {}", format_volume(threshold));
    }
    for a in &anomalies {
        println!("{}", anomaly_line(a));
    }
    Ok(())
}
