// src/fetch/mod.rs

pub mod calendar;
pub mod reports;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::ScrapeError;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; twse-scraper/1.0; +https://github.com/)";
const ACCEPT_HEADER: &str = "application/json,text/html;q=0.9,*/*;q=0.8";

/// Outbound HTTP session, built once per run and reused across every fetch so
/// connections are reused. Dropped at run end.
pub struct Session {
    client: Client,
}

impl Session {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// GET `url` and decode the body as JSON. Non-2xx statuses are errors.
    pub(crate) async fn get_json(&self, url: &str) -> Result<Value, ScrapeError> {
        debug!(%url, "GET json");
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    /// GET `url` and return the body as text, decoded per the server's
    /// declared charset (UTF-8 when unspecified).
    pub(crate) async fn get_html(&self, url: &str) -> Result<String, ScrapeError> {
        debug!(%url, "GET html");
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}
