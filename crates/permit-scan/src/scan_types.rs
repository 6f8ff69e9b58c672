use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use notification_services::NotificationError;
use rec_gov::RecGovError;

/// Permit queried when `PERMIT_ID` is not set (Brooks Camp, Katmai)
pub const DEFAULT_PERMIT_ID: &str = "249991";

/// State file used when `SEEN_STATE_FILE` is not set
pub const DEFAULT_STATE_FILE: &str = "seen_dates.json";

/// Custom error type for scan operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Fetching availability failed
    #[error("Availability fetch failed: {0}")]
    Fetch(#[from] RecGovError),

    /// Sending the alert failed
    #[error("Notification failed: {0}")]
    Notification(#[from] NotificationError),

    /// Reading or writing the seen-dates file failed
    #[error("State file error: {0}")]
    State(String),

    /// Invalid date range
    #[error("Invalid date range: end date must not be before start date")]
    InvalidDateRange,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Inclusive range of dates the user wants permits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Create a window; `end` must not precede `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ScanError> {
        if end < start {
            return Err(ScanError::InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    /// First day of the window
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every day of the window in ascending order, both ends included
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|day| *day <= self.end)
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2026, 7, 22).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Bounded retry for availability fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per month, including the first (1 = no retry)
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Everything one scan run needs
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// recreation.gov permit id
    pub permit_id: String,

    /// Dates to watch
    pub window: DateWindow,

    /// Webhook that receives alerts
    pub webhook_url: String,

    /// Where the seen dates are persisted
    pub state_file: PathBuf,

    /// Root of the availability API
    pub api_base_url: String,

    /// Timeout for each availability request (default: 20 seconds)
    pub fetch_timeout: Duration,

    /// Timeout for the webhook post (default: 10 seconds)
    pub notify_timeout: Duration,

    /// Retry policy for availability requests (default: no retry)
    pub retry: RetryPolicy,
}

impl ScanConfig {
    /// Default configuration alerting to `webhook_url`
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            permit_id: DEFAULT_PERMIT_ID.to_string(),
            window: DateWindow::default(),
            webhook_url: webhook_url.into(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            api_base_url: rec_gov::DEFAULT_BASE_URL.to_string(),
            fetch_timeout: Duration::from_secs(20),
            notify_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self, ScanError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    ///
    /// `DISCORD_WEBHOOK` is required. `PERMIT_ID`, `PERMIT_START_DATE`,
    /// `PERMIT_END_DATE`, `SEEN_STATE_FILE`, `PERMIT_API_BASE_URL` and
    /// `FETCH_MAX_ATTEMPTS` override the defaults when present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = lookup("DISCORD_WEBHOOK")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                ScanError::ConfigError("DISCORD_WEBHOOK environment variable not set".to_string())
            })?;

        let mut config = Self::new(webhook_url);

        if let Some(permit_id) = lookup("PERMIT_ID") {
            config.permit_id = permit_id;
        }

        let start = match lookup("PERMIT_START_DATE") {
            Some(value) => parse_date("PERMIT_START_DATE", &value)?,
            None => config.window.start(),
        };
        let end = match lookup("PERMIT_END_DATE") {
            Some(value) => parse_date("PERMIT_END_DATE", &value)?,
            None => config.window.end(),
        };
        config.window = DateWindow::new(start, end)?;

        if let Some(path) = lookup("SEEN_STATE_FILE") {
            config.state_file = PathBuf::from(path);
        }

        if let Some(base_url) = lookup("PERMIT_API_BASE_URL") {
            config.api_base_url = base_url;
        }

        if let Some(attempts) = lookup("FETCH_MAX_ATTEMPTS") {
            config.retry.max_attempts = match attempts.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ScanError::ConfigError(format!(
                        "FETCH_MAX_ATTEMPTS must be a positive integer, got {:?}",
                        attempts
                    )));
                }
            };
        }

        Ok(config)
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, ScanError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ScanError::ConfigError(format!("{} must be YYYY-MM-DD, got {:?}: {}", key, value, e))
    })
}
