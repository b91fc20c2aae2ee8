//! Persistence adapter: whole-collection snapshots in a string key-value store.
//!
//! Each upload replaces its collection wholesale, so there are no partial
//! writes to reconcile. Reads never fail: missing or corrupt entries load as
//! empty collections.

pub mod duck;

use crate::models::{CostRecord, Dataset, LedgerRecord, RevenueRecord, Schema};
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

pub use self::duck::DuckDbStore;

pub const REVENUE_KEY: &str = "financialDashboard_revenueData";
pub const COST_KEY: &str = "financialDashboard_costData";

pub fn key_for(schema: Schema) -> &'static str {
    match schema {
        Schema::Revenue => REVENUE_KEY,
        Schema::Cost => COST_KEY,
    }
}

// ── Store trait ───────────────────────────────────────────────────────────────

/// Durable string store, the moral equivalent of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Both collections; anything unreadable comes back empty.
    pub fn load(&self) -> Dataset {
        Dataset {
            revenue: self.load_collection::<RevenueRecord>(),
            cost: self.load_collection::<CostRecord>(),
        }
    }

    pub fn load_collection<R>(&self) -> Vec<R>
    where
        R: LedgerRecord + DeserializeOwned,
    {
        let key = key_for(R::SCHEMA);
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Could not read {}: {:#}", key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<R>>(&raw) {
            Ok(records) => {
                debug!("Loaded {} {} records", records.len(), R::SCHEMA);
                records
            }
            Err(e) => {
                warn!("Stored {} data is corrupt, treating as empty: {}", R::SCHEMA, e);
                Vec::new()
            }
        }
    }

    /// Replace the stored collection for `R`'s schema.
    pub fn save<R>(&self, records: &[R]) -> Result<()>
    where
        R: LedgerRecord + Serialize,
    {
        let key = key_for(R::SCHEMA);
        let json = serde_json::to_string(records)
            .with_context(|| format!("serialize {} records", R::SCHEMA))?;
        self.store
            .set(key, &json)
            .with_context(|| format!("write {}", key))?;
        info!("Saved {} {} records", records.len(), R::SCHEMA);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        for key in [REVENUE_KEY, COST_KEY] {
            self.store
                .remove(key)
                .with_context(|| format!("remove {}", key))?;
        }
        info!("Cleared stored revenue and cost data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revenue() -> Vec<RevenueRecord> {
        vec![RevenueRecord {
            business_segment: "呼叫中心服务收入".into(),
            current_month_revenue: 54.74,
            year_to_date_revenue: 80.38,
            budget_amount: 227.92,
            completion_rate: 35.26,
            department: "数字技术部".into(),
        }]
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let p = Persistence::new(MemoryStore::new());
        p.save(&revenue()).unwrap();

        let data = p.load();
        assert_eq!(data.revenue, revenue());
        assert!(data.cost.is_empty());
        assert!(data.has_data());
    }

    #[test]
    fn test_save_replaces_whole_collection() {
        let p = Persistence::new(MemoryStore::new());
        p.save(&revenue()).unwrap();
        p.save::<RevenueRecord>(&[]).unwrap();
        assert!(p.load().revenue.is_empty());
    }

    #[test]
    fn test_corrupt_entry_loads_empty() {
        let store = MemoryStore::new();
        store.set(REVENUE_KEY, "{not json").unwrap();
        store.set(COST_KEY, r#"[{"costCategory": 5}]"#).unwrap();

        let data = Persistence::new(store).load();
        assert!(data.revenue.is_empty());
        assert!(data.cost.is_empty());
        assert!(!data.has_data());
    }

    #[test]
    fn test_stored_format_uses_record_field_names() {
        let p = Persistence::new(MemoryStore::new());
        p.save(&revenue()).unwrap();
        let raw = p.store().get(REVENUE_KEY).unwrap().unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.contains("\"businessSegment\""));
        assert!(raw.contains("\"yearToDateRevenue\":80.38"));
    }

    #[test]
    fn test_clear_removes_both() {
        let p = Persistence::new(MemoryStore::new());
        p.save(&revenue()).unwrap();
        p.clear().unwrap();
        assert_eq!(p.store().get(REVENUE_KEY).unwrap(), None);
        assert_eq!(p.load(), Dataset::default());
    }
}
