//! Spreadsheet discovery for bulk uploads.

use crate::models::Schema;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Extensions the upload surface accepts. The decoder itself sniffs content.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

pub fn is_spreadsheet_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            SPREADSHEET_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Guess the schema from a file name: "revenue_2024.xlsx", "成本明细.xls", …
pub fn schema_hint(path: &Path) -> Option<Schema> {
    let stem = path.file_stem()?.to_str()?.to_lowercase();

    let revenue = ["revenue", "income", "收入"].iter().any(|k| stem.contains(k));
    let cost = ["cost", "expense", "成本"].iter().any(|k| stem.contains(k));

    match (revenue, cost) {
        (true, false) => Some(Schema::Revenue),
        (false, true) => Some(Schema::Cost),
        _ => None,
    }
}

/// Spreadsheets directly inside `dir`, sorted by name. Missing dir → empty.
pub fn discover_spreadsheets(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read dir {:?}", dir))? {
        let path = entry?.path();
        if path.is_file() && is_spreadsheet_path(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
