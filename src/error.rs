// src/error.rs

use thiserror::Error;

/// Fatal error taxonomy for a scrape run. Per-candidate fetch failures and
/// calendar probes that hit a holiday are recovered locally and never reach
/// this type; once one of the domain variants is raised the run aborts and no
/// output file is touched.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The payload did not contain the expected table structure.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Every candidate URL for one report failed.
    #[error("every candidate URL for {report} failed; last error: {last_error}")]
    FetchExhausted {
        report: &'static str,
        last_error: String,
    },

    /// The lookback window ran out before enough trading dates were found.
    #[error("only found {found} trading days within the {window}-day lookback window (need {want})")]
    InsufficientTradingHistory {
        found: usize,
        want: usize,
        window: u32,
    },

    /// A required semantic column is absent from a resolved table.
    #[error("missing column: {0}")]
    ColumnNotFound(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
