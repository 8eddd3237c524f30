//! Client for the public LeetCode stats endpoint. Best-effort: one attempt
//! per sync, no retry or backoff; failures surface to the caller as a sync
//! error.

use log::info;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::database::LeetcodeStats;

#[derive(Error, Debug)]
pub enum LeetCodeError {
    /// The service answered but rejected the username; this is the caller's
    /// bad input.
    #[error("{0}")]
    InvalidUsername(String),
    /// Transport or decode failure; the details are for the log, not the
    /// caller.
    #[error("Failed to fetch LeetCode data: {0}")]
    Unavailable(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    easy_solved: Option<i32>,
    #[serde(default)]
    medium_solved: Option<i32>,
    #[serde(default)]
    hard_solved: Option<i32>,
    #[serde(default)]
    total_solved: Option<i32>,
    #[serde(default)]
    acceptance_rate: Option<f64>,
    #[serde(default)]
    ranking: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct LeetCodeClient {
    client: Client,
    base_url: String,
}

impl LeetCodeClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        LeetCodeClient { client, base_url }
    }

    pub async fn fetch_stats(&self, username: &str) -> Result<LeetcodeStats, LeetCodeError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(username)
        );
        info!("Fetching LeetCode stats for {}", username);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LeetCodeError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LeetCodeError::Unavailable(format!(
                "stats service returned {}",
                response.status()
            )));
        }

        let body: StatsResponse = response
            .json()
            .await
            .map_err(|e| LeetCodeError::Unavailable(e.to_string()))?;

        if body.status.as_deref() == Some("error") {
            return Err(LeetCodeError::InvalidUsername(
                body.message
                    .unwrap_or_else(|| "Invalid LeetCode username".to_string()),
            ));
        }

        Ok(LeetcodeStats {
            easy_solved: body.easy_solved.unwrap_or(0),
            medium_solved: body.medium_solved.unwrap_or(0),
            hard_solved: body.hard_solved.unwrap_or(0),
            total_solved: body.total_solved.unwrap_or(0),
            acceptance_rate: body.acceptance_rate.unwrap_or(0.0),
            ranking: body.ranking.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_response_tolerates_missing_fields() {
        let body: StatsResponse =
            serde_json::from_str(r#"{"status": "success", "totalSolved": 10}"#).expect("parse");
        assert_eq!(body.total_solved, Some(10));
        assert_eq!(body.easy_solved, None);
    }

    #[test]
    fn error_status_is_detected() {
        let body: StatsResponse = serde_json::from_str(
            r#"{"status": "error", "message": "user does not exist"}"#,
        )
        .expect("parse");
        assert_eq!(body.status.as_deref(), Some("error"));
        assert_eq!(body.message.as_deref(), Some("user does not exist"));
    }
}
