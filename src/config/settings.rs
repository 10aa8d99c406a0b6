//! Host settings loaded from environment variables.
//!
//! The engine core takes everything it needs as arguments; these settings
//! exist for the trigger binary only (which owner to scan for, how often the
//! timer fires). Values come from the environment, optionally via a `.env`
//! file loaded in `main`.

use crate::errors::{Error, Result};

/// Default seconds between scheduled due scans.
const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

/// Settings for the trigger host.
#[derive(Debug, Clone)]
pub struct HostSettings {
    /// Owner whose templates the periodic scan covers
    pub owner_id: String,
    /// Seconds between timer ticks
    pub scan_interval_secs: u64,
}

impl HostSettings {
    /// Loads host settings from the environment.
    ///
    /// `OWNER_ID` is required; `SCAN_INTERVAL_SECS` defaults to 60 and must
    /// parse as a positive integer when present.
    pub fn from_env() -> Result<Self> {
        let owner_id = std::env::var("OWNER_ID").map_err(|_| Error::Config {
            message: "OWNER_ID environment variable is not set".to_string(),
        })?;

        let scan_interval_secs = parse_scan_interval(std::env::var("SCAN_INTERVAL_SECS").ok())?;

        Ok(Self {
            owner_id,
            scan_interval_secs,
        })
    }
}

/// Parses the scan interval, falling back to the default when unset.
fn parse_scan_interval(raw: Option<String>) -> Result<u64> {
    match raw {
        None => Ok(DEFAULT_SCAN_INTERVAL_SECS),
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|&secs| secs > 0)
            .ok_or_else(|| Error::Config {
                message: format!("SCAN_INTERVAL_SECS must be a positive integer, got {raw:?}"),
            }),
    }
}
