//! Entry point for the permit availability monitor.
//! Runs a single scan and exits; schedule it externally (cron, systemd timer).

use std::sync::Arc;

use anyhow::Context;
use notification_services::WebhookNotifier;
use permit_scan::{PermitScanExecutor, ScanConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ScanConfig::from_env().context("failed to load configuration")?;

    log::info!(
        "🏕️ Watching permit {} from {} to {} (state: {})",
        config.permit_id,
        config.window.start(),
        config.window.end(),
        config.state_file.display()
    );

    let notifier = WebhookNotifier::new(&config.webhook_url, config.notify_timeout)
        .context("failed to create webhook notifier")?;

    let executor = PermitScanExecutor::new(config, Arc::new(notifier))
        .context("failed to create scan executor")?;

    let outcome = executor.run_once().await.context("permit scan failed")?;

    if outcome.new_dates.is_empty() {
        log::info!(
            "✅ No new dates ({} open in window, all previously notified)",
            outcome.available_in_window.len()
        );
    } else {
        log::info!(
            "📣 Notified {} new date(s): {}",
            outcome.new_dates.len(),
            outcome.new_dates.join(", ")
        );
    }

    Ok(())
}
