use std::io::Write;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::analytics::{self, AnalyticsSource};
use crate::config::ReportConfig;
use crate::error::{ReportError, ServiceError};
use crate::models::{QueryWindow, RawRow, ReportTotals, UsageQuery, UsageRecord, UsageReport};
use crate::report;

pub const IDENTITY_SEPARATOR: char = '|';
pub const UNKNOWN_NAME: &str = "(unknown)";
pub const ROW_LIMIT: u32 = 1000;

impl QueryWindow {
    /// `[today - days_back, today]`. `days_back` is not clamped, but a start
    /// date chrono cannot represent is rejected.
    pub fn trailing(today: NaiveDate, days_back: i64) -> Result<Self, ReportError> {
        let start = Duration::try_days(days_back)
            .and_then(|span| today.checked_sub_signed(span))
            .ok_or_else(|| {
                ReportError::Configuration(format!(
                    "GA4_DAYS_BACK={days_back} puts the window start outside the supported date range"
                ))
            })?;
        Ok(Self { start, end: today })
    }
}

pub fn build_query(config: &ReportConfig, window: QueryWindow) -> UsageQuery {
    UsageQuery {
        property: config.property_resource(),
        window,
        identity_dimension: config.identity_dimension.clone(),
        metrics: analytics::METRICS.iter().map(|m| m.to_string()).collect(),
        limit: ROW_LIMIT,
    }
}

/// Splits on the first separator; anything without one keeps the whole
/// value as the id.
pub fn split_identity(identity: &str) -> (String, String) {
    match identity.split_once(IDENTITY_SEPARATOR) {
        Some((id, name)) => (id.to_string(), name.to_string()),
        None => (identity.to_string(), UNKNOWN_NAME.to_string()),
    }
}

fn parse_count(field: &str, value: &str) -> Result<i64, ServiceError> {
    let value = value.trim();
    if let Ok(count) = value.parse::<i64>() {
        return Ok(count);
    }

    match value.parse::<f64>() {
        Ok(float) if float.is_finite() && float.fract() == 0.0 => Ok(float as i64),
        _ => Err(ServiceError::Shape(format!(
            "{field} value {value:?} is not an integer"
        ))),
    }
}

pub fn format_engagement_rate(value: &str) -> Result<String, ServiceError> {
    let rate: f64 = value.trim().parse().map_err(|_| {
        ServiceError::Shape(format!("engagementRate value {value:?} is not a number"))
    })?;
    Ok(format!("{:.2}%", rate * 100.0))
}

pub fn parse_row(row: &RawRow) -> Result<UsageRecord, ServiceError> {
    let [pageviews, sessions, active_users, engagement_rate] = row.metrics.as_slice() else {
        return Err(ServiceError::Shape(format!(
            "expected {} metric values for {:?}, got {}",
            analytics::METRICS.len(),
            row.identity,
            row.metrics.len()
        )));
    };

    let (user_id, user_name) = split_identity(&row.identity);

    Ok(UsageRecord {
        user_id,
        user_name,
        identity: row.identity.clone(),
        pageviews: parse_count("screenPageViews", pageviews)?,
        sessions: parse_count("sessions", sessions)?,
        active_users: parse_count("activeUsers", active_users)?,
        engagement_rate: format_engagement_rate(engagement_rate)?,
    })
}

/// Keeps the order the service returned; the query already sorts by pageviews.
pub fn parse_rows(rows: &[RawRow]) -> Result<Vec<UsageRecord>, ServiceError> {
    rows.iter().map(parse_row).collect()
}

pub fn totals(records: &[UsageRecord]) -> ReportTotals {
    records.iter().fold(
        ReportTotals {
            users: records.len(),
            ..ReportTotals::default()
        },
        |mut totals, record| {
            totals.pageviews += record.pageviews;
            totals.sessions += record.sessions;
            totals
        },
    )
}

/// Fetches, reshapes and presents the usage report.
///
/// The console summary goes to `out`. When `config.output_path` is set the
/// full record set is also written there as CSV, replacing any existing file.
pub async fn generate_report<S>(
    source: &S,
    config: &ReportConfig,
    today: NaiveDate,
    out: &mut dyn Write,
) -> Result<UsageReport, ReportError>
where
    S: AnalyticsSource + ?Sized,
{
    config.validate()?;

    let window = QueryWindow::trailing(today, config.days_back)?;
    let query = build_query(config, window);
    info!(
        property = %query.property,
        start = %window.start,
        end = %window.end,
        "querying analytics service"
    );

    let result = source.run_query(&query).await?;
    let records = parse_rows(&result.rows)?;

    let truncated = result
        .total_rows
        .is_some_and(|total| total > result.rows.len() as u64);
    if truncated {
        warn!(
            returned = result.rows.len(),
            total = result.total_rows.unwrap_or_default(),
            "report truncated at row limit"
        );
    }

    let usage = UsageReport {
        window,
        records,
        total_rows: result.total_rows,
        truncated,
    };

    out.write_all(report::render_summary(&usage, config.top_n).as_bytes())?;

    if let Some(path) = &config.output_path {
        report::write_csv(path, &usage.records)?;
        info!(path = %path.display(), records = usage.records.len(), "report written");
        writeln!(out, "Report saved to {}", path.display())?;
    }

    Ok(usage)
}
