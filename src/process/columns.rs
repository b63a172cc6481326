// src/process/columns.rs
//
// The exchange revises report headers between site generations, so semantic
// columns are located by substring + neighbor scoring rather than exact
// header text. Header-format drift should only ever require edits here.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ScrapeError;

/// Header substrings that mark the security-code column.
static CODE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new("代號|證券代號|股票代號").expect("valid regex"));

/// Short-sale "today's balance" header substring.
const SHORT_BALANCE: &str = "今日餘額";
/// Securities-lending "same-day balance" header substring.
const BORROW_BALANCE: &str = "當日餘額";
/// Covered-shares group marker preceding the short-sale balance.
const COVERED_MARKER: &str = "現券";
/// Markers following the lending balance column.
const NEXT_PERIOD_MARKER: &str = "次一";
const QUOTA_MARKER: &str = "限額";
/// Same-day adjustment column preceding the lending balance.
const ADJUST_MARKER: &str = "當日調整";

/// Index of the security-code column, defaulting to the first column when no
/// header matches.
pub fn stock_code_column(fields: &[String]) -> usize {
    fields
        .iter()
        .position(|f| CODE_HEADER.is_match(f))
        .unwrap_or(0)
}

/// Resolved TWT93U column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Twt93uColumns {
    pub code: usize,
    pub short_balance: usize,
    pub borrow_balance: usize,
}

/// Locate the code column and disambiguate the two similarly-named balance
/// columns of a lending-summary header.
pub fn twt93u_columns(fields: &[String]) -> Result<Twt93uColumns, ScrapeError> {
    let code = stock_code_column(fields);
    let short_balance = pick_column(fields, SHORT_BALANCE, |i| score_short(fields, i))?;
    let borrow_balance = pick_column(fields, BORROW_BALANCE, |i| score_borrow(fields, i))?;
    Ok(Twt93uColumns {
        code,
        short_balance,
        borrow_balance,
    })
}

/// Highest-scoring header containing `target`; ties go to the earliest
/// column. No header containing `target` at all is fatal.
fn pick_column(
    fields: &[String],
    target: &str,
    score: impl Fn(usize) -> i32,
) -> Result<usize, ScrapeError> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.contains(target))
        .map(|(i, _)| (score(i), i))
        .max_by_key(|&(s, i)| (s, std::cmp::Reverse(i)))
        .map(|(_, i)| i)
        .ok_or_else(|| ScrapeError::ColumnNotFound(target.to_string()))
}

/// The short-sale balance sits one to three columns after the covered-shares
/// group; immediate adjacency is the strongest signal.
fn score_short(fields: &[String], i: usize) -> i32 {
    let mut score = 0;
    for (back, pts) in [(1usize, 2), (2, 1), (3, 1)] {
        if i >= back && fields[i - back].contains(COVERED_MARKER) {
            score += pts;
        }
    }
    score
}

/// The lending balance is followed by the next-period/quota-limit columns and
/// preceded by the same-day adjustment column.
fn score_borrow(fields: &[String], i: usize) -> i32 {
    let mut score = 0;
    if let Some(next) = fields.get(i + 1) {
        if next.contains(NEXT_PERIOD_MARKER) || next.contains(QUOTA_MARKER) {
            score += 2;
        }
    }
    if i >= 1 && fields[i - 1].contains(ADJUST_MARKER) {
        score += 1;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn code_column_matches_known_headers() {
        assert_eq!(stock_code_column(&fields(&["名稱", "股票代號", "買進"])), 1);
        assert_eq!(stock_code_column(&fields(&["證券代號", "名稱"])), 0);
    }

    #[test]
    fn code_column_defaults_to_first_when_unmatched() {
        assert_eq!(stock_code_column(&fields(&["名稱", "買進", "賣出"])), 0);
    }

    #[test]
    fn short_balance_prefers_column_right_after_covered_marker() {
        // Both balance headers match the target substring; only the second
        // one's immediate predecessor is the covered-shares column.
        let header = fields(&["股票代號", "今日餘額", "現券償還", "今日餘額", "備註"]);
        let cols = twt93u_columns(&header);
        // borrow column is absent here, so resolve the short side directly
        let idx = pick_column(&header, SHORT_BALANCE, |i| score_short(&header, i)).unwrap();
        assert_eq!(idx, 3);
        assert!(cols.is_err());
    }

    #[test]
    fn short_balance_tie_breaks_to_first_occurrence() {
        let header = fields(&["股票代號", "今日餘額", "名稱", "今日餘額"]);
        let idx = pick_column(&header, SHORT_BALANCE, |i| score_short(&header, i)).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn borrow_balance_scores_forward_and_back_markers() {
        let header = fields(&[
            "股票代號",
            "當日餘額",
            "名稱",
            "當日調整",
            "當日餘額",
            "次一營業日可限額",
        ]);
        let idx = pick_column(&header, BORROW_BALANCE, |i| score_borrow(&header, i)).unwrap();
        assert_eq!(idx, 4);
    }

    #[test]
    fn resolves_full_twt93u_header() {
        let header = fields(&[
            "股票代號",
            "股票名稱",
            "前日餘額",
            "賣出",
            "買進",
            "現券償還",
            "今日餘額",
            "限額",
            "前日餘額",
            "當日賣出",
            "當日還券",
            "當日調整",
            "當日餘額",
            "次一營業日可借券賣出限額",
            "備註",
        ]);
        let cols = twt93u_columns(&header).unwrap();
        assert_eq!(cols.code, 0);
        assert_eq!(cols.short_balance, 6);
        assert_eq!(cols.borrow_balance, 12);
    }

    #[test]
    fn missing_target_substring_is_fatal() {
        let header = fields(&["股票代號", "股票名稱"]);
        let err = twt93u_columns(&header).unwrap_err();
        assert!(matches!(err, ScrapeError::ColumnNotFound(_)), "{err}");
    }
}
