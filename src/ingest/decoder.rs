//! Spreadsheet bytes → positional raw rows, first sheet only.

use crate::models::{RawCell, RawRow};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("upload bytes could not be read: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("not a readable spreadsheet: {0}")]
    Container(#[from] calamine::Error),

    #[error("workbook contains no sheets")]
    NoSheets,
}

/// Decode a workbook and return the rows of its first sheet (workbook order).
///
/// Format is sniffed from the bytes, so `.xls` and `.xlsx` both work
/// regardless of what the file was named.
pub fn decode(bytes: Vec<u8>) -> Result<SheetRows, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    // NoSheets is untested: rust_xlsxwriter always writes at least one sheet,
    // so no in-memory fixture can produce a sheetless workbook.
    let range = workbook.worksheet_range_at(0).ok_or(DecodeError::NoSheets)??;
    Ok(SheetRows::new(range))
}

/// Single-pass iterator over the used rows of a sheet.
///
/// Rows start at the first used row. Columns are addressed from column A so a
/// blank leading column does not shift positions.
pub struct SheetRows {
    range: Range<Data>,
    next_row: u32,
    last_row: u32,
    width: u32,
    exhausted: bool,
}

impl SheetRows {
    fn new(range: Range<Data>) -> Self {
        match (range.start(), range.end()) {
            (Some(start), Some(end)) => Self {
                next_row: start.0,
                last_row: end.0,
                width: end.1 + 1,
                exhausted: false,
                range,
            },
            _ => Self {
                next_row: 0,
                last_row: 0,
                width: 0,
                exhausted: true,
                range,
            },
        }
    }
}

impl Iterator for SheetRows {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        if self.exhausted || self.next_row > self.last_row {
            self.exhausted = true;
            return None;
        }

        let row = self.next_row;
        let cells = (0..self.width)
            .map(|col| {
                self.range
                    .get_value((row, col))
                    .map(cell_from_data)
                    .unwrap_or_default()
            })
            .collect();

        if row == self.last_row {
            self.exhausted = true;
        } else {
            self.next_row += 1;
        }
        Some(cells)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.exhausted {
            0
        } else {
            (self.last_row - self.next_row + 1) as usize
        };
        (left, Some(left))
    }
}

fn cell_from_data(data: &Data) -> RawCell {
    match data {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        // Excel serial, same as what a JS reader would surface
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}
