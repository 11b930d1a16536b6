use std::fmt::Write;
use std::path::Path;

use crate::error::ReportError;
use crate::models::{UsageRecord, UsageReport};
use crate::usage;

const ID_WIDTH: usize = 24;
const NAME_WIDTH: usize = 24;

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(width - 1).collect();
    clipped.push('…');
    clipped
}

pub fn render_table(records: &[UsageRecord], limit: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{:<id$} {:<name$} {:>10} {:>9} {:>7} {:>11}",
        "user_id",
        "user_name",
        "pageviews",
        "sessions",
        "users",
        "engagement",
        id = ID_WIDTH,
        name = NAME_WIDTH,
    );
    let _ = writeln!(output, "{}", "-".repeat(ID_WIDTH + NAME_WIDTH + 42));

    for record in records.iter().take(limit) {
        let _ = writeln!(
            output,
            "{:<id$} {:<name$} {:>10} {:>9} {:>7} {:>11}",
            clip(&record.user_id, ID_WIDTH),
            clip(&record.user_name, NAME_WIDTH),
            record.pageviews,
            record.sessions,
            record.active_users,
            record.engagement_rate,
            id = ID_WIDTH,
            name = NAME_WIDTH,
        );
    }

    output
}

pub fn render_summary(report: &UsageReport, top_n: usize) -> String {
    let totals = usage::totals(&report.records);
    let mut output = String::new();

    let _ = writeln!(
        output,
        "User usage report ({} to {})",
        report.window.start, report.window.end
    );
    let _ = writeln!(output, "Total users: {}", totals.users);
    let _ = writeln!(output, "Total pageviews: {}", totals.pageviews);
    let _ = writeln!(output, "Total sessions: {}", totals.sessions);

    if report.truncated {
        let _ = writeln!(
            output,
            "Note: showing the top {} of {} users; the rest were cut by the row limit.",
            report.records.len(),
            report.total_rows.unwrap_or_default()
        );
    }

    let _ = writeln!(output);

    if report.records.is_empty() {
        let _ = writeln!(output, "No authenticated users found for this window.");
        return output;
    }

    let shown = report.records.len().min(top_n);
    let _ = writeln!(output, "Top {shown} users by pageviews:");
    output.push_str(&render_table(&report.records, top_n));

    output
}

/// Writes every record with a header row, truncating any existing file.
pub fn write_csv(path: &Path, records: &[UsageRecord]) -> Result<(), ReportError> {
    let output_error = |source: csv::Error| ReportError::Output {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(output_error)?;
    if records.is_empty() {
        writer
            .write_record([
                "user_id",
                "user_name",
                "identity",
                "pageviews",
                "sessions",
                "active_users",
                "engagement_rate",
            ])
            .map_err(output_error)?;
    }
    for record in records {
        writer.serialize(record).map_err(output_error)?;
    }
    writer.flush().map_err(|err| output_error(err.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryWindow;
    use chrono::NaiveDate;

    fn record(id: &str, name: &str, pageviews: i64) -> UsageRecord {
        UsageRecord {
            user_id: id.to_string(),
            user_name: name.to_string(),
            identity: format!("{id}|{name}"),
            pageviews,
            sessions: 2,
            active_users: 1,
            engagement_rate: "50.00%".to_string(),
        }
    }

    fn report(records: Vec<UsageRecord>) -> UsageReport {
        let end = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        UsageReport {
            window: QueryWindow::trailing(end, 30).unwrap(),
            records,
            total_rows: None,
            truncated: false,
        }
    }

    #[test]
    fn summary_limits_table_to_top_n() {
        let records = (0..25)
            .map(|i| record(&format!("u-{i:02}"), "Someone", 100 - i))
            .collect();
        let summary = render_summary(&report(records), 20);

        assert!(summary.contains("2026-02-13 to 2026-03-15"));
        assert!(summary.contains("Total users: 25"));
        assert!(summary.contains("Top 20 users by pageviews:"));
        assert!(summary.contains("u-19"));
        assert!(!summary.contains("u-20"));
    }

    #[test]
    fn summary_handles_empty_reports() {
        let summary = render_summary(&report(Vec::new()), 20);
        assert!(summary.contains("Total pageviews: 0"));
        assert!(summary.contains("No authenticated users found"));
    }

    #[test]
    fn truncated_summary_names_service_row_count() {
        let mut truncated = report(vec![record("u-1", "A", 5)]);
        truncated.total_rows = Some(1500);
        truncated.truncated = true;

        let summary = render_summary(&truncated, 20);
        assert!(summary.contains("showing the top 1 of 1500 users"));
    }

    #[test]
    fn long_names_are_clipped_to_column_width() {
        let long = "x".repeat(40);
        let table = render_table(&[record("u-1", &long, 1)], 20);
        assert!(!table.contains(&long));
        assert!(table.contains('…'));
    }

    #[test]
    fn csv_has_header_and_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale contents that should disappear\n").unwrap();

        let records: Vec<_> = (0..30).map(|i| record(&format!("u-{i}"), "N", i)).collect();
        write_csv(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("user_id,user_name,identity,pageviews,sessions,active_users,engagement_rate")
        );
        assert_eq!(lines.next(), Some("u-0,N,u-0|N,0,2,1,50.00%"));
        assert_eq!(text.lines().count(), 31);
        assert!(!text.contains("stale"));
    }

    #[test]
    fn csv_for_empty_report_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_csv(&path, &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.trim_end(),
            "user_id,user_name,identity,pageviews,sessions,active_users,engagement_rate"
        );
    }
}
