// src/fetch/calendar.rs
//
// The exchange publishes no machine-readable holiday calendar. Trading dates
// are discovered empirically: a date is a trading day exactly when it yields
// a lending-summary report.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use tracing::debug;

use super::{reports, Session};
use crate::error::ScrapeError;
use crate::process::Table;

/// Probe for one date's lending summary. The live implementation goes
/// through the fallback fetcher; tests substitute a scripted one.
#[async_trait]
pub trait LendingProbe {
    async fn fetch_lending(&self, date_yyyymmdd: &str) -> Result<(Table, String), ScrapeError>;
}

#[async_trait]
impl LendingProbe for Session {
    async fn fetch_lending(&self, date_yyyymmdd: &str) -> Result<(Table, String), ScrapeError> {
        reports::fetch_twt93u(self, date_yyyymmdd).await
    }
}

/// One resolved trading date, carrying the lending table and source URL
/// fetched while probing so the merge step never re-fetches it.
#[derive(Debug)]
pub struct TradingDay {
    pub date: NaiveDate,
    pub table: Table,
    pub url: String,
}

/// Compact date format used by the report endpoints.
pub fn yyyymmdd(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Walk backward one calendar day at a time from `base` (inclusive) until
/// `count` dates have produced a lending summary, most recent first. Dates
/// that fail to produce one are weekends or holidays and are skipped without
/// comment. At most `max_lookback_days` dates are probed; running out of
/// window is fatal.
pub async fn resolve_trading_dates<P: LendingProbe + ?Sized>(
    probe: &P,
    base: NaiveDate,
    count: usize,
    max_lookback_days: u32,
) -> Result<Vec<TradingDay>, ScrapeError> {
    let mut days: Vec<TradingDay> = Vec::with_capacity(count);
    let mut cursor = base;

    for _ in 0..max_lookback_days {
        let ds = yyyymmdd(cursor);
        match probe.fetch_lending(&ds).await {
            Ok((table, url)) => {
                debug!(date = %cursor, rows = table.rows.len(), "trading day");
                days.push(TradingDay {
                    date: cursor,
                    table,
                    url,
                });
                if days.len() >= count {
                    break;
                }
            }
            Err(e) => {
                debug!(date = %cursor, error = %e, "no report, skipping date");
            }
        }
        cursor = cursor - Days::new(1);
    }

    if days.len() < count {
        return Err(ScrapeError::InsufficientTradingHistory {
            found: days.len(),
            want: count,
            window: max_lookback_days,
        });
    }

    Ok(days)
}
