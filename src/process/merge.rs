// src/process/merge.rs

use std::collections::HashMap;

use super::{columns, Table};

/// Placeholder for "no entry for this code on this date"; distinct from an
/// empty source cell.
pub const NO_DATA: &str = "—";

/// Appended-field prefixes, suffixed with the recency label per date.
pub const SHORT_FIELD_PREFIX: &str = "融券_今日餘額";
pub const BORROW_FIELD_PREFIX: &str = "借券_當日餘額";

/// Short-sale and lending balances for one stock code on one date.
pub type BalancePair = (String, String);

/// Recency labels for the resolved trading dates, most recent first:
/// `D0`, `D-1`, `D-2`, …
pub fn recency_labels(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| if i == 0 { "D0".to_string() } else { format!("D-{i}") })
        .collect()
}

/// Map stock code → balance pair for one lending-summary table. Rows whose
/// code cell is missing or empty are skipped; out-of-range balance cells read
/// as empty.
pub fn balance_map(table: &Table, cols: columns::Twt93uColumns) -> HashMap<String, BalancePair> {
    let mut map = HashMap::new();
    for row in &table.rows {
        let Some(code_cell) = row.get(cols.code) else {
            continue;
        };
        let code = code_cell.trim();
        if code.is_empty() {
            continue;
        }
        let short = cell(row, cols.short_balance);
        let borrow = cell(row, cols.borrow_balance);
        map.insert(code.to_string(), (short, borrow));
    }
    map
}

fn cell(row: &[String], idx: usize) -> String {
    row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Append 2×N balance columns to the margin table, one short/borrow pair per
/// trading date in recency order (`date_maps` and `labels` are parallel,
/// most recent first). Base rows are never dropped or reordered; codes
/// missing from a date's map get [`NO_DATA`] in both cells.
pub fn merge(
    base: &Table,
    labels: &[String],
    date_maps: &[HashMap<String, BalancePair>],
) -> Table {
    debug_assert_eq!(labels.len(), date_maps.len());
    let code_idx = columns::stock_code_column(&base.fields);

    let mut fields = base.fields.clone();
    for label in labels {
        fields.push(format!("{SHORT_FIELD_PREFIX}_{label}"));
        fields.push(format!("{BORROW_FIELD_PREFIX}_{label}"));
    }

    let mut rows = Vec::with_capacity(base.rows.len());
    for row in &base.rows {
        let code = row.get(code_idx).map(|s| s.trim()).unwrap_or("");
        let mut out = row.clone();
        for map in date_maps {
            match map.get(code) {
                Some((short, borrow)) => {
                    out.push(short.clone());
                    out.push(borrow.clone());
                }
                None => {
                    out.push(NO_DATA.to_string());
                    out.push(NO_DATA.to_string());
                }
            }
        }
        rows.push(out);
    }

    Table { fields, rows }
}
