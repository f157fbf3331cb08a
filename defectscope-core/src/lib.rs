//! # defectscope-core
//!
//! Core library for defectscope - a local-first Jira defect analytics engine.
//!
//! This library provides:
//! - Typed domain records for imported issues
//! - CSV export ingestion with locale-configurable header mapping
//! - Index construction and statistics/team/report aggregation
//! - A keyed reactive state store with batched, de-duplicated updates
//! - SQLite-backed snapshot persistence
//!
//! ## Architecture
//!
//! Data flows in one direction:
//! - **Ingest:** a raw CSV export becomes a normalized `Vec<Issue>`
//! - **Derive:** the issue collection is indexed wholesale and aggregated
//!   into statistics, team analytics, and report snapshots
//! - **Publish:** derived snapshots go through the [`state::StateStore`]
//!   to subscribed consumers and into the [`store::SnapshotStore`]
//!
//! Derived structures are immutable snapshots: every data change rebuilds
//! them in full. There is no incremental update path, by design.
//!
//! ## Example
//!
//! ```rust,no_run
//! use defectscope_core::{Config, CsvImporter, IssueIndex, StatisticsSnapshot};
//! use std::path::Path;
//!
//! let config = Config::load().expect("failed to load config");
//! let importer = CsvImporter::new(&config.ingest).expect("bad ingest config");
//! let result = importer.import_file(Path::new("export.csv")).expect("import failed");
//! let index = IssueIndex::build(result.issues);
//! let stats = StatisticsSnapshot::compute(&index, config.analytics.top_reported_limit);
//! println!("{} issues, {} unresolved", stats.total, stats.unresolved);
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{StatisticsSnapshot, TeamAnalytics, TeamAnalyticsResult, TrendStatistics};
pub use config::Config;
pub use error::{Error, Result};
pub use index::IssueIndex;
pub use ingest::{CsvImporter, ImportResult};
pub use state::{StateKey, StateStore};
pub use store::SnapshotStore;
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod logging;
pub mod state;
pub mod store;
pub mod types;
