//! # Equipscope - Equipment Measurement Analysis Pipeline
//!
//! Equipscope ingests tabular equipment-measurement data (CSV), computes
//! summary statistics, keeps a bounded per-owner history of datasets, and
//! renders any stored dataset as a printable PDF report with an embedded
//! chart dashboard.
//!
//! ## Quick Start
//!
//! ```no_run
//! use equipscope::pipeline;
//! use equipscope::store::file::FileStore;
//!
//! # async fn example() -> equipscope::error::Result<()> {
//! let store = FileStore::new("./data".into())?;
//! let csv = std::fs::read("plant.csv")?;
//!
//! let dataset = pipeline::ingest_csv(&store, "alice", "plant.csv", &csv).await?;
//! println!(
//!     "{} records, avg flowrate {:.2} m³/h",
//!     dataset.stats.total_count, dataset.stats.avg_flowrate
//! );
//!
//! let report = pipeline::generate_report(&store, "alice", dataset.id).await?;
//! std::fs::write(&report.file_name, &report.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`ingest`]: CSV parsing and schema validation
//! - [`stats`]: summary statistics and type distribution
//! - [`retention`]: bounded per-owner dataset history
//! - [`store`]: dataset persistence contract and backends
//! - [`chart`]: dashboard image generation (in-memory PNG)
//! - [`report`]: PDF report assembly
//! - [`pipeline`]: the ingest and report flows gluing the above together
//! - [`error`]: error types and handling utilities
//!
//! ## Pipeline Shape
//!
//! Ingestion is strictly sequential: parse → aggregate → persist →
//! retain. A dataset is created atomically — either all its records are
//! stored or none are — and is immutable afterwards. Report generation is
//! read-only and can run concurrently with other owners' ingestions.
//! Chart failures degrade the report (the visualization section is
//! omitted); they never fail it.

#![warn(clippy::all, rust_2018_idioms)]

pub mod chart;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod retention;
pub mod stats;
pub mod store;
