// src/process/mod.rs

pub mod columns;
pub mod merge;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::ScrapeError;

/// A uniformly-shaped report table: header fields plus string-cell rows.
///
/// Rows are addressed by position only. A row may be shorter than the header;
/// missing trailing cells read as empty. Field names are what the report
/// claims and are not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse the exchange's JSON report payload into a [`Table`].
///
/// The payload carries a top-level `fields` (or, on some endpoints,
/// `fields1`) array and a `data` array of row arrays. Every cell is
/// stringified and trimmed; JSON `null` becomes the empty string.
pub fn parse_json_table(payload: &Value) -> Result<Table, ScrapeError> {
    let fields = payload
        .get("fields")
        .or_else(|| payload.get("fields1"))
        .and_then(Value::as_array)
        .ok_or_else(|| ScrapeError::MalformedPayload("missing `fields` array".into()))?;
    let data = payload
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ScrapeError::MalformedPayload("missing `data` array".into()))?;

    let fields = fields.iter().map(cell_text).collect();
    let rows = data
        .iter()
        .map(|row| match row {
            Value::Array(cells) => Ok(cells.iter().map(cell_text).collect()),
            other => Err(ScrapeError::MalformedPayload(format!(
                "data row is not an array: {other}"
            ))),
        })
        .collect::<Result<Vec<Vec<String>>, _>>()?;

    Ok(Table { fields, rows })
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Parse the first `<table>` of an HTML report page into a [`Table`].
///
/// Header fields come from the last `<thead>` row, which in grouped
/// multi-row headers carries the most specific captions. Body rows come from
/// `<tbody>`; tables without explicit body sectioning fall back to scanning
/// every `<tr>` for data cells.
pub fn parse_html_table(html: &str) -> Result<Table, ScrapeError> {
    let table_sel = Selector::parse("table").expect("valid selector");
    let thead_sel = Selector::parse("thead").expect("valid selector");
    let tbody_sel = Selector::parse("tbody").expect("valid selector");
    let tr_sel = Selector::parse("tr").expect("valid selector");
    let any_cell_sel = Selector::parse("th, td").expect("valid selector");
    let td_sel = Selector::parse("td").expect("valid selector");

    let doc = Html::parse_document(html);
    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScrapeError::MalformedPayload("no <table> found".into()))?;

    let thead = table
        .select(&thead_sel)
        .next()
        .ok_or_else(|| ScrapeError::MalformedPayload("no <thead> found".into()))?;
    let header_row = thead
        .select(&tr_sel)
        .last()
        .ok_or_else(|| ScrapeError::MalformedPayload("no header rows".into()))?;
    let fields: Vec<String> = header_row.select(&any_cell_sel).map(element_text).collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    if let Some(tbody) = table.select(&tbody_sel).next() {
        for tr in tbody.select(&tr_sel) {
            let cells: Vec<String> = tr.select(&any_cell_sel).map(element_text).collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
    }

    // Some report pages section the table with bare <tr>s only.
    if rows.is_empty() {
        for tr in table.select(&tr_sel) {
            let cells: Vec<String> = tr.select(&td_sel).map(element_text).collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
    }

    if rows.is_empty() {
        return Err(ScrapeError::MalformedPayload(
            "no data rows in <table>".into(),
        ));
    }

    Ok(Table { fields, rows })
}

fn element_text(el: ElementRef) -> String {
    el.text().map(str::trim).collect()
}
