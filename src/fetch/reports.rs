// src/fetch/reports.rs
//
// The exchange has moved its report endpoints across site generations and
// the older paths intermittently come back. Each report therefore carries an
// ordered candidate list (JSON endpoints first, the HTML page last) and the
// first candidate producing a non-empty table wins.

use serde_json::Value;
use tracing::debug;

use super::Session;
use crate::error::ScrapeError;
use crate::process::{self, Table};

/// Daily margin-trading summary report.
pub const BFI84U: &str = "BFI84U";
/// Daily securities-lending / short-sale summary report.
pub const TWT93U: &str = "TWT93U";

/// Response shape a candidate URL is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Json,
    Html,
}

#[derive(Debug)]
struct Candidate {
    url: String,
    shape: Shape,
}

fn bfi84u_candidates(date_yyyymmdd: &str) -> Vec<Candidate> {
    vec![
        Candidate {
            url: "https://www.twse.com.tw/rwd/zh/marginTrading/BFI84U?response=json".into(),
            shape: Shape::Json,
        },
        Candidate {
            url: format!(
                "https://www.twse.com.tw/rwd/zh/marginTrading/BFI84U?response=json&date={date_yyyymmdd}"
            ),
            shape: Shape::Json,
        },
        Candidate {
            url: "https://www.twse.com.tw/exchangeReport/BFI84U?response=json".into(),
            shape: Shape::Json,
        },
        Candidate {
            url: format!(
                "https://www.twse.com.tw/exchangeReport/BFI84U?response=json&date={date_yyyymmdd}"
            ),
            shape: Shape::Json,
        },
        Candidate {
            url: "https://www.twse.com.tw/zh/trading/margin/bfi84u.html".into(),
            shape: Shape::Html,
        },
    ]
}

fn twt93u_candidates(date_yyyymmdd: &str) -> Vec<Candidate> {
    vec![
        Candidate {
            url: format!(
                "https://www.twse.com.tw/rwd/zh/marginTrading/TWT93U?response=json&date={date_yyyymmdd}"
            ),
            shape: Shape::Json,
        },
        Candidate {
            url: format!(
                "https://www.twse.com.tw/exchangeReport/TWT93U?response=json&date={date_yyyymmdd}"
            ),
            shape: Shape::Json,
        },
        Candidate {
            url: "https://www.twse.com.tw/zh/trading/margin/twt93u.html".into(),
            shape: Shape::Html,
        },
    ]
}

/// Fetch the margin-trading summary for the given base date. Returns the
/// parsed table and the URL that produced it.
pub async fn fetch_bfi84u(
    session: &Session,
    date_yyyymmdd: &str,
) -> Result<(Table, String), ScrapeError> {
    fetch_report(session, BFI84U, bfi84u_candidates(date_yyyymmdd)).await
}

/// Fetch the lending summary for one specific date.
pub async fn fetch_twt93u(
    session: &Session,
    date_yyyymmdd: &str,
) -> Result<(Table, String), ScrapeError> {
    fetch_report(session, TWT93U, twt93u_candidates(date_yyyymmdd)).await
}

async fn fetch_report(
    session: &Session,
    report: &'static str,
    candidates: Vec<Candidate>,
) -> Result<(Table, String), ScrapeError> {
    let mut last_err: Option<ScrapeError> = None;

    for candidate in candidates {
        match attempt(session, &candidate).await {
            Ok(table) => return Ok((table, candidate.url)),
            Err(e) => {
                debug!(report, url = %candidate.url, error = %e, "candidate failed");
                last_err = Some(e);
            }
        }
    }

    Err(ScrapeError::FetchExhausted {
        report,
        last_error: last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no candidates".into()),
    })
}

/// One candidate attempt: fetch, shape-specific parse, reject empty tables.
async fn attempt(session: &Session, candidate: &Candidate) -> Result<Table, ScrapeError> {
    let table = match candidate.shape {
        Shape::Json => {
            let payload = session.get_json(&candidate.url).await?;
            check_stat(&payload)?;
            process::parse_json_table(&payload)?
        }
        Shape::Html => {
            let html = session.get_html(&candidate.url).await?;
            process::parse_html_table(&html)?
        }
    };

    if table.rows.is_empty() {
        return Err(ScrapeError::MalformedPayload("no rows".into()));
    }
    Ok(table)
}

/// The JSON endpoints report "no data" inline with a 200 status; `stat` must
/// contain `OK` (a missing field counts as OK, matching older payloads).
fn check_stat(payload: &Value) -> Result<(), ScrapeError> {
    let stat = payload.get("stat").and_then(Value::as_str).unwrap_or("OK");
    if stat.to_uppercase().contains("OK") {
        Ok(())
    } else {
        Err(ScrapeError::MalformedPayload(format!("stat not OK: {stat}")))
    }
}
