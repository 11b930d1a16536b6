use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageQuery {
    pub property: String,
    pub window: QueryWindow,
    pub identity_dimension: String,
    pub metrics: Vec<String>,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub identity: String,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub rows: Vec<RawRow>,
    pub total_rows: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub user_name: String,
    pub identity: String,
    pub pageviews: i64,
    pub sessions: i64,
    pub active_users: i64,
    pub engagement_rate: String,
}

#[derive(Debug, Clone)]
pub struct UsageReport {
    pub window: QueryWindow,
    pub records: Vec<UsageRecord>,
    pub total_rows: Option<u64>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportTotals {
    pub users: usize,
    pub pageviews: i64,
    pub sessions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillOutcome {
    pub name: String,
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub failed: Vec<String>,
}

impl SkillOutcome {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

impl RunSummary {
    pub fn record(&mut self, outcome: &SkillOutcome) {
        self.total += 1;
        if !outcome.is_valid() {
            self.failed.push(outcome.name.clone());
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.failed.is_empty() {
            0
        } else {
            1
        }
    }
}
