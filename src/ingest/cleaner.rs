use crate::models::{ColumnMap, LedgerRecord, NormalizedRow, RawCell, RawRow};
use tracing::debug;

/// Amount columns arrive in base currency units; records hold wan.
pub const WAN: f64 = 10_000.0;

/// Row 0 of every sheet is the header.
pub const HEADER_ROWS: usize = 1;

// ── Cell coercion ─────────────────────────────────────────────────────────────

/// Parse the longest numeric prefix of a string, after trimming.
/// "91.33%" → 91.33 | "12abc" → 12 | "1,234" → 1 | "abc" → None | "NaN" → None
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = numeric_prefix_len(s.as_bytes());
    if end == 0 {
        return None;
    }
    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Length of `[+-]? digits [. digits]? ([eE] [+-]? digits)?`, 0 when there are
/// no mantissa digits. An exponent without digits is not consumed.
fn numeric_prefix_len(b: &[u8]) -> usize {
    let digits = |from: usize| b[from..].iter().take_while(|c| c.is_ascii_digit()).count();

    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_digits = digits(i);
    i += int_digits;

    let mut frac_digits = 0;
    if b.get(i) == Some(&b'.') {
        frac_digits = digits(i + 1);
        if int_digits > 0 || frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }

    if matches!(b.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = digits(j);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }
    i
}

/// Numeric value of a cell; anything unparseable (or missing) is 0.
pub fn cell_number(cell: Option<&RawCell>) -> f64 {
    match cell {
        Some(RawCell::Number(n)) if n.is_finite() => *n,
        Some(RawCell::Text(s)) => parse_amount(s).unwrap_or(0.0),
        Some(RawCell::Number(_)) | Some(RawCell::Empty) | None => 0.0,
    }
}

/// Text value of a cell, trimmed. Numbers render without a trailing `.0`.
pub fn cell_text(cell: Option<&RawCell>) -> String {
    match cell {
        Some(RawCell::Text(s)) => s.trim().to_string(),
        Some(RawCell::Number(n)) => n.to_string(),
        Some(RawCell::Empty) | None => String::new(),
    }
}

// ── Row → record ──────────────────────────────────────────────────────────────

/// Map one data row through the column table. `None` when the identity is blank.
pub fn normalize_row(row: &[RawCell], map: &ColumnMap) -> Option<NormalizedRow> {
    let identity = cell_text(row.get(map.identity));
    if identity.is_empty() {
        return None;
    }

    Some(NormalizedRow {
        identity,
        current: cell_number(row.get(map.current)) / WAN,
        year_to_date: cell_number(row.get(map.year_to_date)) / WAN,
        budget: cell_number(row.get(map.budget)) / WAN,
        rate: cell_number(row.get(map.rate)),
        department: cell_text(row.get(map.department)),
    })
}

/// Normalize data rows (header already removed), keeping row order.
pub fn normalize_rows<R, I>(rows: I, map: &ColumnMap) -> Vec<R>
where
    R: LedgerRecord,
    I: IntoIterator<Item = RawRow>,
{
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| match normalize_row(&row, map) {
            Some(n) => Some(R::from_normalized(n)),
            None => {
                debug!("{} row {}: blank identity, dropped", R::SCHEMA, i + 1);
                None
            }
        })
        .collect()
}

/// Normalize a whole sheet: skips the header by position, not by content.
pub fn normalize_sheet<R, I>(rows: I, map: &ColumnMap) -> Vec<R>
where
    R: LedgerRecord,
    I: IntoIterator<Item = RawRow>,
{
    normalize_rows(rows.into_iter().skip(HEADER_ROWS), map)
}
