use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use twsescraper::{
    config::Config,
    fetch::{calendar, reports, Session},
    output::{self, CsvRef, Envelope, Source},
    process::{columns, merge},
};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) configure run ────────────────────────────────────────────
    let config = Config::from_env();
    let now = Utc::now().with_timezone(&config.exchange_tz);
    let base_date = now.date_naive();
    let base_iso = base_date.to_string();
    info!(base_date = %base_iso, "base date (Taipei)");

    let session = Session::new(config.http_timeout)?;

    // ─── 3) resolve recent trading dates via TWT93U ──────────────────
    info!(count = config.trading_days, "resolving recent trading dates");
    let trading_days = calendar::resolve_trading_dates(
        &session,
        base_date,
        config.trading_days,
        config.max_lookback_days,
    )
    .await?;
    let trading_dates_iso: Vec<String> = trading_days.iter().map(|d| d.date.to_string()).collect();
    let labels = merge::recency_labels(trading_days.len());
    info!(dates = ?trading_dates_iso, "trading dates resolved");

    // ─── 4) per-date balance maps from the cached lending tables ─────
    let mut date_maps = Vec::with_capacity(trading_days.len());
    let mut twt93u_by_date = BTreeMap::new();
    for day in &trading_days {
        let cols = columns::twt93u_columns(&day.table.fields)?;
        date_maps.push(merge::balance_map(&day.table, cols));
        twt93u_by_date.insert(calendar::yyyymmdd(day.date), day.url.clone());
    }

    // ─── 5) fetch the margin-trading base table ──────────────────────
    info!("fetching BFI84U");
    let (bfi_table, bfi_url) =
        reports::fetch_bfi84u(&session, &calendar::yyyymmdd(base_date)).await?;
    info!(url = %bfi_url, rows = bfi_table.rows.len(), "BFI84U fetched");

    // ─── 6) merge and write artifacts ────────────────────────────────
    let merged = merge::merge(&bfi_table, &labels, &date_maps);
    let envelope = Envelope {
        base_date: base_iso.clone(),
        generated_at: now.to_rfc3339(),
        trading_dates: trading_dates_iso,
        labels,
        source: Source {
            bfi84u: bfi_url,
            twt93u_by_date,
        },
        csv: CsvRef {
            file: format!("latest-{base_iso}.csv"),
        },
        fields: merged.fields,
        rows: merged.rows,
    };

    let (csv_path, json_path) = output::write_outputs(&config.out_dir, &envelope)?;
    info!(csv = %csv_path.display(), json = %json_path.display(), "wrote artifacts");

    Ok(())
}
