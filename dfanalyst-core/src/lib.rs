//! Core data structures and operations for dfanalyst.
//!
//! This crate holds one tabular dataset per session and exposes the
//! analysis operations applied to it: schema inference, missing-value
//! reporting, profiling, correlation, outlier detection, grouped
//! aggregation, and report export.
//!
//! # Architecture
//! - [`models`]: typed columns with an explicit missing marker per cell
//! - [`session`]: single-dataset state with generation-keyed memoization
//! - [`analysis`]: pure operations over a [`Dataset`]
//! - [`ingest`] / [`export`]: I/O collaborators behind async traits
//! - [`Analyst`]: the facade that serializes operations on one session
//!
//! Missing cells are excluded from every numeric computation; they are
//! never treated as zero.

pub mod analysis;
pub mod analyst;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod session;

// Re-export commonly used types
pub use analyst::{Analyst, LoadSummary};
pub use config::AnalystConfig;
pub use error::{AnalystError, ErrorKind, Result};
pub use models::{Column, ColumnData, DataType, Dataset, Scalar, SourceMetadata};
pub use session::Session;
