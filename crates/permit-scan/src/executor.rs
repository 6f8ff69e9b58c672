use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use notification_services::Notifier;
use rec_gov::{PermitAvailabilityClient, extract_available_dates};
use tracing::{debug, info};

use crate::executor_helpers::{months_to_query, new_hits, retry_transient, window_hits};
use crate::scan_types::*;
use crate::seen_store::SeenStore;

/// Result of one scan run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Month starts that were fetched
    pub months_queried: Vec<NaiveDate>,

    /// Open dates inside the window, in window order
    pub available_in_window: Vec<NaiveDate>,

    /// Dates alerted on in this run (empty if nothing new)
    pub new_dates: Vec<String>,
}

/// Runs a single fetch → diff → notify → persist pass for one permit
pub struct PermitScanExecutor {
    client: PermitAvailabilityClient,
    notifier: Arc<dyn Notifier>,
    store: SeenStore,
    config: ScanConfig,
}

impl PermitScanExecutor {
    /// Build an executor from `config`, alerting through `notifier`
    pub fn new(config: ScanConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ScanError> {
        let client = PermitAvailabilityClient::new(config.permit_id.clone(), config.fetch_timeout)?
            .with_base_url(config.api_base_url.clone());
        let store = SeenStore::new(config.state_file.clone());

        Ok(Self {
            client,
            notifier,
            store,
            config,
        })
    }

    /// Run one scan.
    ///
    /// Any fetch, state or notification error aborts the run. The seen state
    /// is only written after the alert went out, so a failed save means the
    /// same dates are alerted again next run.
    pub async fn run_once(&self) -> Result<ScanOutcome, ScanError> {
        let window = self.config.window;
        info!(
            "Scanning permit {} for {} to {}",
            self.client.permit_id(),
            window.start(),
            window.end()
        );

        let months_queried = months_to_query(&window);
        let mut available = HashSet::new();

        let client = &self.client;
        for &month in &months_queried {
            let payload = retry_transient(&self.config.retry, "Availability fetch", move || {
                client.fetch_month(month)
            })
            .await?;

            let month_dates = extract_available_dates(&payload);
            debug!(
                "Month {} has {} date(s) with permits remaining",
                month.format("%Y-%m"),
                month_dates.len()
            );
            available.extend(month_dates);
        }

        let hits = window_hits(&window, &available);

        let mut seen = self.store.load()?;
        debug!(
            "Loaded {} seen date(s) from {}",
            seen.len(),
            self.store.path().display()
        );
        let new_dates = new_hits(&hits, &seen);

        if new_dates.is_empty() {
            debug!(
                "No new availability ({} open date(s) already notified)",
                hits.len()
            );
        } else {
            info!("Found {} newly available date(s)", new_dates.len());

            self.notifier.notify_new_dates(&new_dates).await?;

            seen.extend(new_dates.iter().cloned());
            self.store.save(&seen)?;
        }

        Ok(ScanOutcome {
            months_queried,
            available_in_window: hits,
            new_dates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use notification_services::NotificationError;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records every alert instead of sending it
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn sent(&self) -> Vec<Vec<String>> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify_new_dates(&self, dates: &[String]) -> Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::Webhook("HTTP 500".to_string()));
            }
            self.sent.lock().unwrap().push(dates.to_vec());
            Ok(())
        }
    }

    const PERMIT_PATH: &str = "/permits/249991/availability/month";

    fn month_payload(dates: &[(&str, i64)]) -> Value {
        let date_availability: serde_json::Map<String, Value> = dates
            .iter()
            .map(|(d, remaining)| {
                (
                    format!("{}T00:00:00Z", d),
                    json!({"remaining": remaining, "total": 60}),
                )
            })
            .collect();

        json!({
            "payload": {
                "permit_id": "249991",
                "availability": {
                    "1": {"division_id": "1", "date_availability": date_availability}
                }
            }
        })
    }

    async fn mount_month(server: &MockServer, start_date: &str, payload: Value) {
        Mock::given(method("GET"))
            .and(path(PERMIT_PATH))
            .and(query_param("start_date", start_date))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload))
            .mount(server)
            .await;
    }

    /// June has 06-15 open and 06-16 full; July is empty
    async fn scenario_server() -> MockServer {
        let server = MockServer::start().await;
        mount_month(
            &server,
            "2026-06-01T00:00:00.000Z",
            month_payload(&[("2026-06-15", 2), ("2026-06-16", 0)]),
        )
        .await;
        mount_month(&server, "2026-07-01T00:00:00.000Z", month_payload(&[])).await;
        server
    }

    fn config_for(server: &MockServer, state_file: &Path) -> ScanConfig {
        let mut config = ScanConfig::new("https://hook.test/webhook");
        config.api_base_url = server.uri();
        config.state_file = state_file.to_path_buf();
        config.fetch_timeout = Duration::from_secs(5);
        config
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_new_availability_is_notified_and_persisted() {
        let server = scenario_server().await;
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("seen_dates.json");
        let notifier = Arc::new(RecordingNotifier::default());

        let executor =
            PermitScanExecutor::new(config_for(&server, &state_file), notifier.clone()).unwrap();
        let outcome = executor.run_once().await.unwrap();

        assert_eq!(outcome.months_queried, vec![date(2026, 6, 1), date(2026, 7, 1)]);
        assert_eq!(outcome.available_in_window, vec![date(2026, 6, 15)]);
        assert_eq!(outcome.new_dates, vec!["2026-06-15"]);
        assert_eq!(notifier.sent(), vec![vec!["2026-06-15".to_string()]]);
        assert_eq!(
            std::fs::read_to_string(&state_file).unwrap(),
            r#"["2026-06-15"]"#
        );
    }

    #[tokio::test]
    async fn test_already_seen_dates_are_not_notified() {
        let server = scenario_server().await;
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("seen_dates.json");
        std::fs::write(&state_file, r#"["2026-06-15"]"#).unwrap();
        let before = std::fs::metadata(&state_file).unwrap().modified().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());

        let executor =
            PermitScanExecutor::new(config_for(&server, &state_file), notifier.clone()).unwrap();
        let outcome = executor.run_once().await.unwrap();

        assert!(outcome.new_dates.is_empty());
        assert!(notifier.sent().is_empty());
        assert_eq!(
            std::fs::read_to_string(&state_file).unwrap(),
            r#"["2026-06-15"]"#
        );
        assert_eq!(
            std::fs::metadata(&state_file).unwrap().modified().unwrap(),
            before
        );
    }

    #[tokio::test]
    async fn test_repeated_runs_notify_once() {
        let server = scenario_server().await;
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("seen_dates.json");
        let notifier = Arc::new(RecordingNotifier::default());

        let executor =
            PermitScanExecutor::new(config_for(&server, &state_file), notifier.clone()).unwrap();

        for _ in 0..3 {
            executor.run_once().await.unwrap();
        }

        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_only_new_dates_are_added_to_existing_state() {
        let server = MockServer::start().await;
        mount_month(
            &server,
            "2026-06-01T00:00:00.000Z",
            month_payload(&[("2026-06-15", 1), ("2026-06-02", 3)]),
        )
        .await;
        mount_month(
            &server,
            "2026-07-01T00:00:00.000Z",
            month_payload(&[("2026-07-22", 1), ("2026-07-23", 9)]),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("seen_dates.json");
        std::fs::write(&state_file, r#"["2026-06-15","2025-01-01"]"#).unwrap();
        let notifier = Arc::new(RecordingNotifier::default());

        let executor =
            PermitScanExecutor::new(config_for(&server, &state_file), notifier.clone()).unwrap();
        let outcome = executor.run_once().await.unwrap();

        assert_eq!(
            outcome.available_in_window,
            vec![date(2026, 6, 2), date(2026, 6, 15), date(2026, 7, 22)]
        );
        assert_eq!(
            notifier.sent(),
            vec![vec!["2026-06-02".to_string(), "2026-07-22".to_string()]]
        );
        assert_eq!(
            std::fs::read_to_string(&state_file).unwrap(),
            r#"["2025-01-01","2026-06-02","2026-06-15","2026-07-22"]"#
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_before_notifying() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("seen_dates.json");
        let notifier = Arc::new(RecordingNotifier::default());

        let executor =
            PermitScanExecutor::new(config_for(&server, &state_file), notifier.clone()).unwrap();
        let err = executor.run_once().await.unwrap_err();

        assert!(matches!(err, ScanError::Fetch(_)));
        assert!(notifier.sent().is_empty());
        assert!(!state_file.exists());
    }

    #[tokio::test]
    async fn test_transient_fetch_failure_is_retried_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        mount_month(
            &server,
            "2026-06-01T00:00:00.000Z",
            month_payload(&[("2026-06-15", 2)]),
        )
        .await;
        mount_month(&server, "2026-07-01T00:00:00.000Z", month_payload(&[])).await;

        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("seen_dates.json");
        let notifier = Arc::new(RecordingNotifier::default());

        let mut config = config_for(&server, &state_file);
        config.retry = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::ZERO,
        };

        let executor = PermitScanExecutor::new(config, notifier.clone()).unwrap();
        let outcome = executor.run_once().await.unwrap();

        assert_eq!(outcome.new_dates, vec!["2026-06-15"]);
    }

    #[tokio::test]
    async fn test_failed_notification_leaves_state_untouched() {
        let server = scenario_server().await;
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("seen_dates.json");
        let notifier = Arc::new(RecordingNotifier::failing());

        let executor =
            PermitScanExecutor::new(config_for(&server, &state_file), notifier.clone()).unwrap();
        let err = executor.run_once().await.unwrap_err();

        assert!(matches!(err, ScanError::Notification(_)));
        assert!(!state_file.exists());
    }

    #[tokio::test]
    async fn test_corrupt_state_aborts_run() {
        let server = scenario_server().await;
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("seen_dates.json");
        std::fs::write(&state_file, "not json").unwrap();
        let notifier = Arc::new(RecordingNotifier::default());

        let executor =
            PermitScanExecutor::new(config_for(&server, &state_file), notifier.clone()).unwrap();
        let err = executor.run_once().await.unwrap_err();

        assert!(matches!(err, ScanError::State(_)));
        assert!(notifier.sent().is_empty());
    }
}
