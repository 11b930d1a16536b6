//! GA4 Data API access.
//!
//! The report only needs one call, `properties/{id}:runReport`, so this module
//! exposes a single-method capability and one reqwest-backed implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::error::ServiceError;
use crate::models::{QueryResult, RawRow, UsageQuery};

const API_BASE: &str = "https://analyticsdata.googleapis.com/v1beta";

/// Metric order here is the order values come back in each row.
pub const METRICS: [&str; 4] = ["screenPageViews", "sessions", "activeUsers", "engagementRate"];

/// Runs one metrics query and hands back the raw rows.
#[async_trait]
pub trait AnalyticsSource {
    async fn run_query(&self, query: &UsageQuery) -> Result<QueryResult, ServiceError>;
}

/// Request body for `runReport`.
pub fn request_body(query: &UsageQuery) -> Value {
    json!({
        "dateRanges": [{
            "startDate": query.window.start.format("%Y-%m-%d").to_string(),
            "endDate": query.window.end.format("%Y-%m-%d").to_string(),
        }],
        "dimensions": [{ "name": query.identity_dimension }],
        "metrics": query.metrics.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
        "dimensionFilter": {
            "notExpression": {
                "filter": {
                    "fieldName": query.identity_dimension,
                    "inListFilter": { "values": ["", "(not set)"] }
                }
            }
        },
        "orderBys": [{
            "metric": { "metricName": METRICS[0] },
            "desc": true
        }],
        "limit": query.limit.to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunReportResponse {
    #[serde(default)]
    rows: Vec<ResponseRow>,
    row_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseRow {
    #[serde(default)]
    dimension_values: Vec<ResponseValue>,
    #[serde(default)]
    metric_values: Vec<ResponseValue>,
}

#[derive(Debug, Deserialize)]
struct ResponseValue {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn into_query_result(response: RunReportResponse) -> Result<QueryResult, ServiceError> {
    let rows = response
        .rows
        .into_iter()
        .map(|row| -> Result<RawRow, ServiceError> {
            let identity = row
                .dimension_values
                .into_iter()
                .next()
                .map(|value| value.value)
                .ok_or_else(|| ServiceError::Shape("row without a dimension value".to_string()))?;
            Ok(RawRow {
                identity,
                metrics: row.metric_values.into_iter().map(|value| value.value).collect(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryResult {
        rows,
        total_rows: response.row_count,
    })
}

pub fn parse_response(body: &str) -> Result<QueryResult, ServiceError> {
    let response: RunReportResponse =
        serde_json::from_str(body).map_err(|err| ServiceError::Shape(err.to_string()))?;
    into_query_result(response)
}

pub struct Ga4Client<T> {
    http: Client,
    tokens: T,
}

impl<T: TokenProvider> Ga4Client<T> {
    pub fn new(http: Client, tokens: T) -> Self {
        Self { http, tokens }
    }
}

#[async_trait]
impl<T> AnalyticsSource for Ga4Client<T>
where
    T: TokenProvider + Send + Sync,
{
    async fn run_query(&self, query: &UsageQuery) -> Result<QueryResult, ServiceError> {
        let token = self.tokens.access_token(&self.http).await?;
        let url = format!("{API_BASE}/{}:runReport", query.property);
        debug!(%url, "sending runReport");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&request_body(query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|err| err.error.message)
                .unwrap_or(body);
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryWindow;
    use chrono::NaiveDate;

    fn query() -> UsageQuery {
        UsageQuery {
            property: "properties/1234".to_string(),
            window: QueryWindow::trailing(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(), 7)
                .unwrap(),
            identity_dimension: "customUser:user_identity".to_string(),
            metrics: METRICS.iter().map(|m| m.to_string()).collect(),
            limit: 1000,
        }
    }

    #[test]
    fn request_body_describes_the_report() {
        let body = request_body(&query());

        assert_eq!(body["dateRanges"][0]["startDate"], "2026-03-08");
        assert_eq!(body["dateRanges"][0]["endDate"], "2026-03-15");
        assert_eq!(body["dimensions"][0]["name"], "customUser:user_identity");
        assert_eq!(body["metrics"].as_array().unwrap().len(), 4);
        assert_eq!(body["metrics"][0]["name"], "screenPageViews");
        assert_eq!(body["orderBys"][0]["metric"]["metricName"], "screenPageViews");
        assert_eq!(body["orderBys"][0]["desc"], true);
        assert_eq!(body["limit"], "1000");
        assert_eq!(
            body["dimensionFilter"]["notExpression"]["filter"]["fieldName"],
            "customUser:user_identity"
        );
    }

    #[test]
    fn parses_rows_and_row_count() {
        let body = r#"{
            "dimensionHeaders": [{"name": "customUser:user_identity"}],
            "metricHeaders": [{"name": "screenPageViews", "type": "TYPE_INTEGER"}],
            "rows": [
                {
                    "dimensionValues": [{"value": "u-1|Avery"}],
                    "metricValues": [{"value": "10"}, {"value": "3"}, {"value": "1"}, {"value": "0.5"}]
                }
            ],
            "rowCount": 1204
        }"#;

        let result = parse_response(body).unwrap();
        assert_eq!(result.total_rows, Some(1204));
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].identity, "u-1|Avery");
        assert_eq!(result.rows[0].metrics, vec!["10", "3", "1", "0.5"]);
    }

    #[test]
    fn empty_response_has_no_rows() {
        let result = parse_response("{}").unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.total_rows, None);
    }

    #[test]
    fn malformed_response_is_a_shape_error() {
        assert!(matches!(
            parse_response("not json"),
            Err(ServiceError::Shape(_))
        ));
        assert!(matches!(
            parse_response(r#"{"rows": [{"metricValues": []}]}"#),
            Err(ServiceError::Shape(_))
        ));
    }
}
