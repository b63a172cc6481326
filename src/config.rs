// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use chrono::FixedOffset;

/// Exchange local time: Asia/Taipei, UTC+8, no DST.
const TAIPEI_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Run parameters. Defaults match the daily publishing job; the `TWSE_*`
/// env overrides exist for ad-hoc runs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Artifact directory consumed by the static site.
    pub out_dir: PathBuf,
    /// How many recent trading dates to merge into the margin table.
    pub trading_days: usize,
    /// Calendar days to probe before giving up on calendar resolution.
    pub max_lookback_days: u32,
    /// Per-request timeout on the shared HTTP session.
    pub http_timeout: Duration,
    /// The exchange's publication timezone; the base date is "today" here.
    pub exchange_tz: FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("docs/data"),
            trading_days: 5,
            max_lookback_days: 45,
            http_timeout: Duration::from_secs(30),
            exchange_tz: FixedOffset::east_opt(TAIPEI_UTC_OFFSET_SECS).unwrap(),
        }
    }
}

impl Config {
    /// Defaults with optional `TWSE_OUT_DIR`, `TWSE_TRADING_DAYS` and
    /// `TWSE_LOOKBACK_DAYS` overrides. Unparseable values fall back to the
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var("TWSE_OUT_DIR") {
            config.out_dir = PathBuf::from(dir);
        }
        if let Some(n) = env_usize("TWSE_TRADING_DAYS") {
            config.trading_days = n;
        }
        if let Some(n) = env_usize("TWSE_LOOKBACK_DAYS") {
            config.max_lookback_days = n as u32;
        }
        config
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
