//! Report assembly, rendering and sinks.
//!
//! Exporting runs in three steps: sections are computed from the current
//! dataset, the document is rendered to markdown, JSON or HTML, and the
//! rendered body is handed to a [`ReportSink`]. Only the last step performs
//! I/O.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::PathBuf;

use crate::analysis::{
    CorrelationMethod, OutlierRequest, ProfileRequest, correlation, detect_outliers,
    infer_schema, missing_report, profile,
};
use crate::config::AnalystConfig;
use crate::error::{AnalystError, Result};
use crate::models::{Dataset, SourceMetadata};

mod local;
mod render;

pub use local::LocalFileSink;
pub use render::{RenderedReport, ReportFormat, render_report};

/// Section names accepted by `export_report`.
pub const SECTION_NAMES: [&str; 6] = ["schema", "missing", "profile", "corr", "correlation", "outliers"];

/// One titled block of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section heading
    pub title: String,
    /// Operation response rendered in this section
    pub content: JsonValue,
}

impl ReportSection {
    /// Creates a section.
    pub fn new(title: impl Into<String>, content: JsonValue) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }
}

/// A report before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    /// Report heading
    pub title: String,
    /// Render time
    pub generated_at: DateTime<Utc>,
    /// Provenance of the dataset the report describes
    pub source: SourceMetadata,
    /// Sections in request order
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    /// Creates a document stamped with the current time.
    pub fn new(title: impl Into<String>, source: SourceMetadata, sections: Vec<ReportSection>) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            source,
            sections,
        }
    }
}

fn to_content<T: Serialize>(value: &T) -> Result<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| AnalystError::export_failed("Failed to serialize report section", e))
}

/// Computes the requested sections in request order.
///
/// Unknown names are skipped with a warning, and `corr` and `correlation`
/// both map to one section that is emitted once. The outlier section runs IQR
/// detection with configured defaults on the first natively numeric column
/// and is omitted when there is none.
pub fn build_sections(
    dataset: &Dataset,
    names: &[String],
    config: &AnalystConfig,
) -> Result<Vec<ReportSection>> {
    let mut sections = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for name in names {
        let canonical = match name.as_str() {
            "corr" => "correlation",
            other => other,
        };
        if seen.contains(&canonical) {
            continue;
        }
        seen.push(canonical);

        match canonical {
            "schema" => {
                let report = infer_schema(dataset);
                sections.push(ReportSection::new("Schema", to_content(&report.schema)?));
            }
            "missing" => {
                let report = missing_report(dataset);
                sections.push(ReportSection::new("Missing", to_content(&report.missing_pct)?));
            }
            "profile" => {
                let report = profile(dataset, &ProfileRequest::new(), &config.default_percentiles)?;
                sections.push(ReportSection::new("Profile", to_content(&report)?));
            }
            "correlation" => {
                let report = correlation(dataset, CorrelationMethod::default());
                sections.push(ReportSection::new("Correlation", to_content(&report)?));
            }
            "outliers" => {
                let target = dataset
                    .columns()
                    .iter()
                    .find(|c| c.data_type().is_numeric());
                match target {
                    Some(column) => {
                        let report = detect_outliers(
                            dataset,
                            &OutlierRequest::new(column.name.clone()),
                            &config.outliers,
                        )?;
                        sections.push(ReportSection::new(
                            format!("Outliers ({})", column.name),
                            to_content(&report)?,
                        ));
                    }
                    None => tracing::debug!("No numeric column for outlier section"),
                }
            }
            unknown => tracing::warn!(section = unknown, "Skipping unknown report section"),
        }
    }

    Ok(sections)
}

/// Where to store a rendered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    /// A file on the local filesystem
    Local { path: PathBuf },
}

impl Destination {
    /// Creates a local file destination.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Parses a destination from tool-call JSON.
    ///
    /// # Errors
    /// `InvalidArgument` for a missing or unknown `type`, or missing fields.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| AnalystError::invalid_argument(format!("invalid destination: {}", e)))
    }
}

/// Confirmation returned by a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    /// Whether the sink stored the document
    pub saved: bool,
    /// Sink-specific description of where the document went
    pub dest: serde_json::Map<String, JsonValue>,
}

/// Storage for finished reports.
///
/// # Object Safety
/// This trait is object-safe, allowing for dynamic dispatch through
/// `Box<dyn ReportSink>`.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Stores the document.
    ///
    /// # Errors
    /// `ExportSink` if the document cannot be stored.
    async fn save(&self, report: &RenderedReport) -> Result<SaveReceipt>;

    /// Sink type label echoed in receipts (`local`, ...).
    fn kind(&self) -> &'static str;
}

/// Creates the sink for a destination.
pub fn create_sink(destination: &Destination) -> Box<dyn ReportSink> {
    match destination {
        Destination::Local { path } => Box::new(LocalFileSink::new(path.clone())),
    }
}
