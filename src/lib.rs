//! Revenue and cost spreadsheet ingestion with dashboard aggregates.
//!
//! Upload flow: bytes → [`ingest::decoder`] → [`ingest::cleaner`] → typed
//! records → [`storage`]. Views call [`aggregate`] on every read.

pub mod aggregate;
pub mod config;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod utils;
