pub mod cleaner;
pub mod decoder;

use crate::models::{ColumnMap, LedgerRecord};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

use self::cleaner::normalize_sheet;
use self::decoder::{decode, DecodeError};

// ── Upload sources ────────────────────────────────────────────────────────────

/// Anything an upload can come from. Reading the bytes is the only await.
#[async_trait]
pub trait UploadSource: Send + Sync {
    fn name(&self) -> &str;
    async fn read_bytes(&self) -> std::io::Result<Vec<u8>>;
}

/// A spreadsheet file on disk.
pub struct FileUpload {
    path: PathBuf,
    name: String,
}

impl FileUpload {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

#[async_trait]
impl UploadSource for FileUpload {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// Bytes already in memory (e.g. handed over by a UI layer).
pub struct BytesUpload {
    name: String,
    bytes: Vec<u8>,
}

impl BytesUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

#[async_trait]
impl UploadSource for BytesUpload {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

// ── Ingest ────────────────────────────────────────────────────────────────────

/// Read, decode, and normalize one upload into records of schema `R`.
///
/// Fails only with [`DecodeError`]; malformed numeric cells never fail, they
/// become 0. Nothing is persisted here.
pub async fn ingest<R: LedgerRecord>(source: &dyn UploadSource) -> Result<Vec<R>, DecodeError> {
    debug!("Reading {} upload {}", R::SCHEMA, source.name());
    let bytes = source.read_bytes().await?;

    let rows = decode(bytes)?;
    let raw_rows = rows.size_hint().0.saturating_sub(cleaner::HEADER_ROWS);
    let records: Vec<R> = normalize_sheet(rows, &ColumnMap::for_schema(R::SCHEMA));

    info!(
        "{}: {} {} records ({} blank rows dropped)",
        source.name(),
        records.len(),
        R::SCHEMA,
        raw_rows.saturating_sub(records.len())
    );
    Ok(records)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{RawCell, RawRow};
    use rust_xlsxwriter::Workbook;

    /// In-memory `.xlsx` with one sheet.
    pub fn workbook(rows: &[RawRow]) -> Vec<u8> {
        workbook_with_sheets(&[("Sheet1", rows.to_vec())])
    }

    pub fn workbook_with_sheets(sheets: &[(&str, Vec<RawRow>)]) -> Vec<u8> {
        let mut book = Workbook::new();
        for (name, rows) in sheets {
            let sheet = book.add_worksheet();
            sheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    match cell {
                        RawCell::Empty => {}
                        RawCell::Text(s) => {
                            sheet.write_string(r as u32, c as u16, s.as_str()).unwrap();
                        }
                        RawCell::Number(n) => {
                            sheet.write_number(r as u32, c as u16, *n).unwrap();
                        }
                    }
                }
            }
        }
        book.save_to_buffer().unwrap()
    }

    pub fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    pub fn num(n: f64) -> RawCell {
        RawCell::Number(n)
    }

    /// Six-column ledger sheet with a header row and the given data rows.
    pub fn ledger_sheet(rows: &[RawRow]) -> Vec<u8> {
        let mut all: Vec<RawRow> = vec![
            ["业务板块", "当月收入", "本年累计", "预算额", "完成率", "部门"]
                .iter()
                .map(|h| RawCell::Text(h.to_string()))
                .collect(),
        ];
        all.extend(rows.iter().cloned());
        workbook(&all)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{ledger_sheet, num, text};
    use super::*;
    use crate::models::{CostRecord, RawCell, RevenueRecord};

    #[tokio::test]
    async fn test_ingest_counts_rows_minus_blank_identities() {
        let bytes = ledger_sheet(&[
            vec![text("A"), num(10_000_000.0), num(137_000_000.0), RawCell::Empty, num(91.33), text("Dept1")],
            vec![RawCell::Empty, num(1.0)],
            vec![text("B"), text("oops"), num(20_000.0), num(40_000.0), num(50.0), text("Dept2")],
        ]);
        let upload = BytesUpload::new("rev.xlsx", bytes);

        let records: Vec<RevenueRecord> = ingest(&upload).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].current_month_revenue, 1000.0);
        assert_eq!(records[0].year_to_date_revenue, 13700.0);
        assert_eq!(records[0].budget_amount, 0.0);
        assert_eq!(records[1].current_month_revenue, 0.0);
        assert_eq!(records[1].budget_amount, 4.0);
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let bytes = ledger_sheet(&[
            vec![text("Labour"), num(5_000.0), num(60_000.0), num(80_000.0), num(75.0), text("Ops")],
            vec![text("Fuel"), num(1_000.0), num(9_000.0), num(10_000.0), num(90.0), text("Ops")],
        ]);
        let upload = BytesUpload::new("cost.xlsx", bytes);

        let first: Vec<CostRecord> = ingest(&upload).await.unwrap();
        let second: Vec<CostRecord> = ingest(&upload).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].cost_category, "Labour");
    }

    #[tokio::test]
    async fn test_ingest_surfaces_decode_error() {
        let upload = BytesUpload::new("broken.xlsx", b"PK\x03\x04 nope".to_vec());
        let err = ingest::<RevenueRecord>(&upload).await.unwrap_err();
        assert!(matches!(err, DecodeError::Container(_)));
    }

    #[test]
    fn test_ingest_missing_file_is_unreadable() {
        let upload = FileUpload::new("/definitely/not/here.xlsx");
        assert_eq!(upload.name(), "here.xlsx");
        let err = tokio_test::block_on(ingest::<RevenueRecord>(&upload)).unwrap_err();
        assert!(matches!(err, DecodeError::Unreadable(_)));
    }

    #[tokio::test]
    async fn test_file_upload_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revenue.xlsx");
        std::fs::write(
            &path,
            ledger_sheet(&[vec![text("A"), num(20_000.0)]]),
        )
        .unwrap();

        let records: Vec<RevenueRecord> = ingest(&FileUpload::new(&path)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].current_month_revenue, 2.0);
    }
}
