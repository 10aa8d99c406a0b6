//! Trigger host for the recurring-ledger engine.
//!
//! The engine core exposes a pure `run_scan`; this binary owns the timer
//! lifecycle: it connects the database, then fires a due scan for the
//! configured owner on a repeating interval. The first tick fires
//! immediately, which doubles as the app-start check. Redundant or
//! overlapping invocations are harmless - the single-flight guard skips them
//! and the store's uniqueness constraint backstops whatever slips through.

use dotenvy::dotenv;
use recurring_ledger::config::settings::HostSettings;
use recurring_ledger::core::scan::{ScanGuard, format_scan_summary, run_scan};
use recurring_ledger::config;
use recurring_ledger::errors::Result;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal - env vars can be set externally
    dotenv().ok();

    // 3. Load host settings
    let settings = HostSettings::from_env()
        .inspect_err(|e| error!("Failed to load host settings: {e}"))?;
    info!(
        owner_id = %settings.owner_id,
        scan_interval_secs = settings.scan_interval_secs,
        "Host settings loaded."
    );

    // 4. Initialize database
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Run the scan loop; the first tick fires immediately
    let guard = ScanGuard::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(settings.scan_interval_secs));

    loop {
        ticker.tick().await;

        let now = chrono::Utc::now();
        match run_scan(&db, &guard, &settings.owner_id, now).await {
            Ok(report) => {
                if report.failed.is_empty() {
                    info!("{}", format_scan_summary(&settings.owner_id, &report));
                } else {
                    warn!("{}", format_scan_summary(&settings.owner_id, &report));
                }
            }
            // A whole-scan failure means the store could not even be
            // queried; the next tick is the retry
            Err(e) => error!("Due scan failed: {e}"),
        }
    }
}
