//! Pipeline orchestrator: ties ingest → storage together.
//!
//! ## Upload flow
//!
//! `upload()` — one spreadsheet, one schema:
//!   1. Await the upload bytes, decode the first sheet, normalize rows.
//!   2. Replace the stored collection for that schema wholesale.
//!   A decode failure returns before step 2, so stored data is untouched.
//!
//! The caller is expected to run one upload at a time.

use crate::ingest::{ingest, UploadSource};
use crate::models::{CostRecord, Dataset, LedgerRecord, RevenueRecord, Schema};
use crate::storage::{KeyValueStore, Persistence};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

pub struct Pipeline<S> {
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> Pipeline<S> {
    pub fn new(store: S) -> Self {
        Self {
            persistence: Persistence::new(store),
        }
    }

    pub async fn upload(&self, source: &dyn UploadSource, schema: Schema) -> Result<UploadStats> {
        match schema {
            Schema::Revenue => self.upload_as::<RevenueRecord>(source).await,
            Schema::Cost => self.upload_as::<CostRecord>(source).await,
        }
    }

    pub async fn upload_as<R>(&self, source: &dyn UploadSource) -> Result<UploadStats>
    where
        R: LedgerRecord + Serialize,
    {
        let records: Vec<R> = ingest(source)
            .await
            .with_context(|| format!("{} upload {} failed", R::SCHEMA, source.name()))?;

        self.persistence.save(&records)?;

        info!("{}: replaced {} data ({} records)", source.name(), R::SCHEMA, records.len());
        Ok(UploadStats {
            source: source.name().to_string(),
            schema: R::SCHEMA,
            records: records.len(),
        })
    }

    /// Current stored state; recomputed aggregates should start from here.
    pub fn dataset(&self) -> Dataset {
        self.persistence.load()
    }

    pub fn reset(&self) -> Result<()> {
        self.persistence.clear()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadStats {
    pub source: String,
    pub schema: Schema,
    pub records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{cross_summarize, group_by, summarize};
    use crate::ingest::decoder::DecodeError;
    use crate::ingest::fixtures::{ledger_sheet, num, text};
    use crate::ingest::BytesUpload;
    use crate::models::{Field, KeyField, RawCell};
    use crate::storage::MemoryStore;

    fn revenue_upload() -> BytesUpload {
        BytesUpload::new(
            "revenue.xlsx",
            ledger_sheet(&[
                vec![text("Hotel"), num(6_000_000.0), num(6_000_000.0), num(10_000_000.0), num(60.0), text("X")],
                vec![text("Parking"), num(0.0), num(4_000_000.0), num(0.0), num(0.0), text("X")],
            ]),
        )
    }

    fn cost_upload() -> BytesUpload {
        BytesUpload::new(
            "cost.xlsx",
            ledger_sheet(&[vec![text("Labour"), RawCell::Empty, num(6_000_000.0), num(8_000_000.0), num(75.0), text("Ops")]]),
        )
    }

    #[tokio::test]
    async fn test_upload_then_aggregate() {
        let p = Pipeline::new(MemoryStore::new());
        let stats = p.upload(&revenue_upload(), Schema::Revenue).await.unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.schema, Schema::Revenue);
        p.upload(&cost_upload(), Schema::Cost).await.unwrap();

        let data = p.dataset();
        let by_dept = group_by(&data.revenue, KeyField::Department, Field::YearToDate);
        assert_eq!(by_dept.get("X"), Some(1000.0));

        let x = cross_summarize(&data.revenue, &data.cost);
        assert_eq!(x.total_revenue, 1000.0);
        assert_eq!(x.total_cost, 600.0);
        assert_eq!(x.net_profit, 400.0);
        assert_eq!(x.profit_margin, 40.0);

        let s = summarize(&data.cost, Field::YearToDate, Field::Budget);
        assert_eq!(s.rate, 75.0);
    }

    #[tokio::test]
    async fn test_reupload_replaces_not_merges() {
        let p = Pipeline::new(MemoryStore::new());
        p.upload(&revenue_upload(), Schema::Revenue).await.unwrap();

        let smaller = BytesUpload::new(
            "revenue2.xlsx",
            ledger_sheet(&[vec![text("Only"), num(10_000.0)]]),
        );
        p.upload(&smaller, Schema::Revenue).await.unwrap();

        let data = p.dataset();
        assert_eq!(data.revenue.len(), 1);
        assert_eq!(data.revenue[0].business_segment, "Only");
    }

    #[tokio::test]
    async fn test_failed_decode_leaves_stored_data() {
        let p = Pipeline::new(MemoryStore::new());
        p.upload(&revenue_upload(), Schema::Revenue).await.unwrap();
        let before = p.dataset();

        let broken = BytesUpload::new("broken.xlsx", b"garbage".to_vec());
        let err = p.upload(&broken, Schema::Revenue).await.unwrap_err();
        assert!(err.downcast_ref::<DecodeError>().is_some());

        assert_eq!(p.dataset(), before);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let p = Pipeline::new(MemoryStore::new());
        p.upload(&revenue_upload(), Schema::Revenue).await.unwrap();
        p.upload(&cost_upload(), Schema::Cost).await.unwrap();
        assert!(p.dataset().has_data());

        p.reset().unwrap();
        assert!(!p.dataset().has_data());
    }
}
