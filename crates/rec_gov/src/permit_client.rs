use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use reqwest::{Client, header};
use serde_json::Value;

use crate::types::RecGovError;

/// Base URL of the internal recreation.gov API.
pub const DEFAULT_BASE_URL: &str = "https://www.recreation.gov/api";

const USER_AGENT: &str = "Mozilla/5.0";

/// Client for the recreation.gov monthly permit availability endpoint
pub struct PermitAvailabilityClient {
    client: Client,
    base_url: String,
    permit_id: String,
}

impl PermitAvailabilityClient {
    /// Create a client for one permit with the given request timeout
    pub fn new(permit_id: impl Into<String>, timeout: Duration) -> Result<Self, RecGovError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RecGovError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            permit_id: permit_id.into(),
        })
    }

    /// Point the client at a different API root (no trailing slash)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The permit this client queries
    pub fn permit_id(&self) -> &str {
        &self.permit_id
    }

    /// Fetch the raw availability payload for the month containing `month`.
    ///
    /// Any non-success status, transport failure or timeout is returned as an
    /// error; nothing is retried here.
    pub async fn fetch_month(&self, month: NaiveDate) -> Result<Value, RecGovError> {
        let url = format!(
            "{}/permits/{}/availability/month",
            self.base_url, self.permit_id
        );

        let params = [
            ("start_date", month_start_param(month)),
            ("commercial_acct", "false".to_string()),
            ("is_lottery", "false".to_string()),
        ];

        debug!("Making request to: {} for month {}", url, params[0].1);

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .header(
                header::REFERER,
                format!("https://www.recreation.gov/permits/{}", self.permit_id),
            )
            .query(&params)
            .send()
            .await
            .map_err(|e| RecGovError::Network(format!("HTTP request failed: {}", e)))?;

        debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            warn!("API request failed with status {}: {}", status, body);

            return Err(match status.as_u16() {
                429 => RecGovError::RateLimited,
                401 | 403 => RecGovError::AuthenticationFailed,
                404 => RecGovError::NotFound,
                500..=599 => RecGovError::ServerError(format!("HTTP {} - {}", status, body)),
                _ => RecGovError::ApiError(format!("HTTP {} - {}", status, body)),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                RecGovError::Network(format!("Timed out reading response: {}", e))
            } else {
                RecGovError::DataFormat(format!("Failed to parse response: {}", e))
            }
        })
    }
}

/// First instant of the month containing `date`, in the format the API expects
pub fn month_start_param(date: NaiveDate) -> String {
    format!("{:04}-{:02}-01T00:00:00.000Z", date.year(), date.month())
}
