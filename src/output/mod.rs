// src/output/mod.rs

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::ScrapeError;

/// Dated-artifact filename pattern; stale ones are removed before each write
/// so only one dated CSV survives per run.
static DATED_CSV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^latest-\d{4}-\d{2}-\d{2}\.csv$").expect("valid regex"));

/// Spreadsheet apps need the BOM to open UTF-8 CSVs with CJK text intact.
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

const JSON_FILE: &str = "latest.json";

/// URLs the merged output was actually built from.
#[derive(Debug, Serialize)]
pub struct Source {
    pub bfi84u: String,
    /// Lending-summary URL per trading date, keyed `YYYYMMDD`.
    pub twt93u_by_date: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct CsvRef {
    pub file: String,
}

/// The provenance envelope persisted as `latest.json`; the `fields`/`rows`
/// body duplicates the CSV so consumers can pick either artifact.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub base_date: String,
    pub generated_at: String,
    pub trading_dates: Vec<String>,
    pub labels: Vec<String>,
    pub source: Source,
    pub csv: CsvRef,
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Persist the merged table under `out_dir`: the dated CSV plus the
/// `latest.json` envelope. Call only once the whole merge has succeeded —
/// stale dated CSVs are deleted here, so a failed run upstream leaves every
/// existing artifact untouched.
pub fn write_outputs(out_dir: &Path, envelope: &Envelope) -> Result<(PathBuf, PathBuf), ScrapeError> {
    fs::create_dir_all(out_dir)?;
    remove_stale_csvs(out_dir)?;

    let csv_path = out_dir.join(&envelope.csv.file);
    write_csv(&csv_path, &envelope.fields, &envelope.rows)?;

    let json_path = out_dir.join(JSON_FILE);
    fs::write(&json_path, serde_json::to_vec(envelope)?)?;

    Ok((csv_path, json_path))
}

fn remove_stale_csvs(out_dir: &Path) -> Result<(), ScrapeError> {
    for entry in fs::read_dir(out_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if DATED_CSV.is_match(name) {
            debug!(file = name, "removing stale dated CSV");
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn write_csv(path: &Path, fields: &[String], rows: &[Vec<String>]) -> Result<(), ScrapeError> {
    let mut file = fs::File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(fields)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn envelope() -> Envelope {
        let mut twt93u_by_date = BTreeMap::new();
        twt93u_by_date.insert(
            "20260805".to_string(),
            "https://example.test/TWT93U?date=20260805".to_string(),
        );
        Envelope {
            base_date: "2026-08-06".into(),
            generated_at: "2026-08-06T15:00:00+08:00".into(),
            trading_dates: vec!["2026-08-05".into()],
            labels: vec!["D0".into()],
            source: Source {
                bfi84u: "https://example.test/BFI84U".into(),
                twt93u_by_date,
            },
            csv: CsvRef {
                file: "latest-2026-08-06.csv".into(),
            },
            fields: vec!["證券代號".into(), "融券_今日餘額_D0".into()],
            rows: vec![
                vec!["0050".into(), "1,000".into()],
                vec!["2330".into(), "—".into()],
            ],
        }
    }

    #[test]
    fn csv_starts_with_bom_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let (csv_path, _) = write_outputs(dir.path(), &envelope()).unwrap();

        let bytes = fs::read(&csv_path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&bytes[UTF8_BOM.len()..]);
        let records: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|c| c.to_string()).collect())
            .collect();

        assert_eq!(records[0], vec!["證券代號", "融券_今日餘額_D0"]);
        assert_eq!(records[1], vec!["0050", "1,000"]);
        assert_eq!(records[2], vec!["2330", "—"]);
    }

    #[test]
    fn json_rows_equal_csv_body() {
        let dir = TempDir::new().unwrap();
        let env = envelope();
        let (csv_path, json_path) = write_outputs(dir.path(), &env).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_slice(&fs::read(&json_path).unwrap()).unwrap();
        assert_eq!(parsed["base_date"], "2026-08-06");
        assert_eq!(parsed["csv"]["file"], "latest-2026-08-06.csv");
        assert_eq!(
            parsed["source"]["twt93u_by_date"]["20260805"],
            "https://example.test/TWT93U?date=20260805"
        );

        let bytes = fs::read(&csv_path).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(&bytes[UTF8_BOM.len()..]);
        let body: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|c| c.to_string()).collect())
            .collect();

        let json_rows: Vec<Vec<String>> = parsed["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| {
                row.as_array()
                    .unwrap()
                    .iter()
                    .map(|c| c.as_str().unwrap().to_string())
                    .collect()
            })
            .collect();
        assert_eq!(json_rows, body);
    }

    #[test]
    fn stale_dated_csvs_are_replaced() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("latest-2026-01-02.csv"), "old").unwrap();
        fs::write(dir.path().join("latest-notadate.csv"), "keep").unwrap();

        write_outputs(dir.path(), &envelope()).unwrap();

        assert!(!dir.path().join("latest-2026-01-02.csv").exists());
        assert!(dir.path().join("latest-notadate.csv").exists());
        assert!(dir.path().join("latest-2026-08-06.csv").exists());
        assert!(dir.path().join(JSON_FILE).exists());
    }
}
