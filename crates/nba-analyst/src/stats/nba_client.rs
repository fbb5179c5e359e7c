//! Live Stats API Client
//!
//! Talks to the league's public stats host. The host is fussy: it
//! rejects requests without browser-like headers and answers in a
//! tabular envelope (`resultSets` with parallel `headers`/`rowSet`
//! arrays) that we flatten into one JSON object per row.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use serde_json::{Map, Value};
use tracing::debug;

use super::{Endpoint, StatParams, StatsSource};
use crate::error::{AnalystError, Result};

use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://stats.nba.com/stats";
const NBA_REFERER: &str = "https://www.nba.com/";
const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;

const LEAGUE_ID: &str = "00";
const SEASON_TYPE: &str = "Regular Season";

/// Client for the live stats host
pub struct NbaStatsClient {
    http: reqwest::Client,
    base_url: String,
}

impl NbaStatsClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(NBA_REFERER));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-nba-stats-origin", HeaderValue::from_static("stats"));
        headers.insert("x-nba-stats-token", HeaderValue::from_static("true"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host (test fixtures, a mirror)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Query string for one endpoint
    ///
    /// The host requires its full parameter set per endpoint; anything
    /// the caller does not control is pinned to the API defaults here.
    fn query_pairs(endpoint: Endpoint, params: &StatParams) -> Vec<(&'static str, String)> {
        let per_mode = params.per_mode.clone().unwrap_or_else(|| "Totals".into());
        let measure_type = params.measure_type.clone().unwrap_or_else(|| "Base".into());
        let team_id = params.team_id.clone().unwrap_or_else(|| "0".into());

        let mut pairs = vec![
            ("LeagueID", LEAGUE_ID.to_string()),
            ("Season", params.season.clone()),
            ("SeasonType", SEASON_TYPE.to_string()),
            ("PerMode", per_mode),
            ("TeamID", team_id),
        ];

        match endpoint {
            Endpoint::LeagueDashLineups => {
                pairs.push(("MeasureType", measure_type));
                pairs.push(("GroupQuantity", "5".to_string()));
            }
            Endpoint::LeagueHustleStatsTeam => {}
            Endpoint::LeagueDashPlayerClutch => {
                pairs.push(("MeasureType", measure_type));
                pairs.push(("ClutchTime", "Last 5 Minutes".to_string()));
                pairs.push(("AheadBehind", "Ahead or Behind".to_string()));
                pairs.push(("PointDiff", "5".to_string()));
            }
            Endpoint::LeagueDashPlayerStats => {
                pairs.push(("MeasureType", measure_type));
            }
        }

        pairs
    }

    /// Flatten the first result set into one object per row
    fn parse_result_set(body: &Value) -> Result<Vec<Value>> {
        let set = body
            .get("resultSets")
            .and_then(|sets| sets.get(0))
            .ok_or_else(|| AnalystError::StatsApi("response carries no result sets".into()))?;

        let headers: Vec<&str> = set
            .get("headers")
            .and_then(Value::as_array)
            .map(|cols| cols.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if headers.is_empty() {
            return Err(AnalystError::StatsApi("result set has no headers".into()));
        }

        let rows = set
            .get("rowSet")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let records = rows
            .iter()
            .filter_map(Value::as_array)
            .map(|row| {
                let mut record = Map::new();
                for (column, value) in headers.iter().zip(row) {
                    record.insert((*column).to_string(), value.clone());
                }
                Value::Object(record)
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl StatsSource for NbaStatsClient {
    async fn fetch(&self, endpoint: Endpoint, params: &StatParams) -> Result<Vec<Value>> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let query = Self::query_pairs(endpoint, params);

        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalystError::StatsApi(format!(
                "{} answered HTTP {status}",
                endpoint.label()
            )));
        }

        let body: Value = response.json().await?;
        let records = Self::parse_result_set(&body)?;
        debug!(
            endpoint = endpoint.label(),
            rows = records.len(),
            "fetched stats rows"
        );
        Ok(records)
    }

    fn name(&self) -> &str {
        "stats.nba.com"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lineup_query_pins_group_quantity() {
        let params = StatParams::for_season()
            .with_measure_type("Advanced")
            .with_team_id("1610612738");
        let pairs = NbaStatsClient::query_pairs(Endpoint::LeagueDashLineups, &params);

        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("MeasureType"), Some("Advanced"));
        assert_eq!(get("GroupQuantity"), Some("5"));
        assert_eq!(get("TeamID"), Some("1610612738"));
        assert_eq!(get("PerMode"), Some("Totals"));
    }

    #[test]
    fn test_clutch_query_carries_clutch_window() {
        let pairs =
            NbaStatsClient::query_pairs(Endpoint::LeagueDashPlayerClutch, &StatParams::for_season());
        assert!(pairs.iter().any(|(k, v)| *k == "ClutchTime" && v == "Last 5 Minutes"));
        assert!(pairs.iter().any(|(k, v)| *k == "PointDiff" && v == "5"));
    }

    #[test]
    fn test_parse_result_set_zips_headers_with_rows() {
        let body = json!({
            "resultSets": [{
                "name": "LeagueHustleStatsTeam",
                "headers": ["TEAM_ID", "TEAM_NAME", "DEFLECTIONS"],
                "rowSet": [
                    [1610612738, "Boston Celtics", 16.2],
                    [1610612747, "Los Angeles Lakers", 14.9]
                ]
            }]
        });

        let rows = NbaStatsClient::parse_result_set(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["TEAM_NAME"], "Boston Celtics");
        assert_eq!(rows[1]["DEFLECTIONS"], 14.9);
    }

    #[test]
    fn test_parse_result_set_rejects_empty_envelope() {
        let err = NbaStatsClient::parse_result_set(&json!({})).unwrap_err();
        assert!(matches!(err, AnalystError::StatsApi(_)));
    }
}
