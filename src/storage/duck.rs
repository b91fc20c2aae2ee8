use super::KeyValueStore;
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use duckdb::{params, Connection};
use std::path::Path;
use tracing::info;

// ── Schema ────────────────────────────────────────────────────────────────────

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    store_key    VARCHAR PRIMARY KEY,
    store_value  VARCHAR NOT NULL,
    updated_at   TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TIMESTAMP NOT NULL
);
"#;

// ── DuckDB-backed store ───────────────────────────────────────────────────────

pub struct DuckDbStore {
    conn: Connection,
}

impl DuckDbStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Could not create dir {:?}", parent))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB at {:?}", path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn run_migrations(&self) -> Result<()> {
        info!("Running migrations…");
        self.conn.execute_batch(DDL).context("DDL failed")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, ?)",
            params![Utc::now().naive_utc()],
        )?;
        info!("Migrations done.");
        Ok(())
    }

    /// When `key` was last written, if ever.
    pub fn updated_at(&self, key: &str) -> Result<Option<NaiveDateTime>> {
        let mut stmt = self
            .conn
            .prepare("SELECT updated_at FROM kv_store WHERE store_key = ?")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn entry_count(&self) -> Result<i64> {
        let mut s = self.conn.prepare("SELECT COUNT(*) FROM kv_store")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }
}

impl KeyValueStore for DuckDbStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT store_value FROM kv_store WHERE store_key = ?")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Single-statement upsert, so a write is all-or-nothing.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r#"INSERT INTO kv_store (store_key, store_value, updated_at)
                   VALUES (?, ?, ?)
                   ON CONFLICT (store_key) DO UPDATE SET
                       store_value = excluded.store_value,
                       updated_at  = excluded.updated_at"#,
                params![key, value, Utc::now().naive_utc()],
            )
            .with_context(|| format!("upsert {}", key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE store_key = ?", params![key])
            .with_context(|| format!("delete {}", key))?;
        Ok(())
    }
}
