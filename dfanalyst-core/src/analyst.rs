//! Session facade exposing every tool operation.
//!
//! [`Analyst`] serializes all operations on one [`Session`] behind a single
//! async mutex. Read operations lock, compute and unlock. Ingestion runs
//! outside the lock and only the final `set` is performed under it, so a
//! failed or cancelled load leaves the session untouched. Export renders
//! under the lock and writes to the sink outside it.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::analysis::{
    self, CorrelationMethod, CorrelationReport, GroupByReport, GroupByRequest, MissingReport,
    OutlierReport, OutlierRequest, ProfileReport, ProfileRequest, SchemaReport,
};
use crate::config::AnalystConfig;
use crate::error::Result;
use crate::export::{
    Destination, ReportDocument, ReportFormat, SaveReceipt, build_sections, create_sink,
    render_report,
};
use crate::ingest::{LoadOptions, SourceDescriptor, create_source};
use crate::models::{Dataset, SourceMetadata};
use crate::session::Session;

/// Title of exported reports.
const REPORT_TITLE: &str = "Dataset report";

/// Response of `load_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    /// Column names in order
    pub columns: Vec<String>,
    /// Total row count
    pub rows: usize,
    /// First rows as records
    pub rows_preview: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Provenance of the loaded dataset
    pub source_meta: SourceMetadata,
}

/// Handle to an analysis session.
///
/// Cloning the handle shares the same session.
///
/// # Example
/// ```rust
/// use dfanalyst_core::{Analyst, AnalystConfig};
/// use dfanalyst_core::analysis::ProfileRequest;
/// use dfanalyst_core::models::{Column, Dataset, SourceMetadata};
///
/// # async fn example() -> dfanalyst_core::Result<()> {
/// let analyst = Analyst::new(AnalystConfig::default());
/// let dataset = Dataset::from_columns(vec![Column::integer(
///     "precio",
///     vec![Some(1), Some(2), Some(3), Some(4), Some(5)],
/// )])?;
/// analyst.load_dataset(dataset, SourceMetadata::new()).await;
///
/// let report = analyst.profile(&ProfileRequest::new()).await?;
/// assert_eq!(report.columns[0].stats.as_ref().map(|s| s.count), Some(5));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Analyst {
    session: Arc<Mutex<Session>>,
    config: Arc<AnalystConfig>,
}

impl Default for Analyst {
    fn default() -> Self {
        Self::new(AnalystConfig::default())
    }
}

impl Analyst {
    /// Creates an analyst with an empty session.
    pub fn new(config: AnalystConfig) -> Self {
        let session = Session::with_cache(config.cache_enabled);
        Self {
            session: Arc::new(Mutex::new(session)),
            config: Arc::new(config),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &AnalystConfig {
        &self.config
    }

    /// Identifier of the underlying session.
    pub async fn session_id(&self) -> Uuid {
        self.session.lock().await.id()
    }

    /// Generation of the current dataset; 0 before the first load.
    pub async fn generation(&self) -> u64 {
        self.session.lock().await.generation()
    }

    /// Provenance metadata of the current dataset.
    pub async fn metadata(&self) -> SourceMetadata {
        self.session.lock().await.metadata().clone()
    }

    /// Returns the current dataset.
    ///
    /// # Errors
    /// `NoDatasetLoaded` before the first successful load.
    pub async fn require(&self) -> Result<Arc<Dataset>> {
        self.session.lock().await.require()
    }

    /// Loads a dataset from a source and makes it current.
    ///
    /// # Errors
    /// `Ingestion` if the source fails; the session is unchanged in that case.
    pub async fn load_data(
        &self,
        source: &SourceDescriptor,
        options: &LoadOptions,
    ) -> Result<LoadSummary> {
        let loaded = create_source(source, options)?.load().await?;

        let summary = LoadSummary {
            columns: loaded.dataset.column_names(),
            rows: loaded.dataset.row_count(),
            rows_preview: loaded.dataset.head_records(self.config.preview_rows),
            source_meta: loaded.metadata.clone(),
        };

        self.session
            .lock()
            .await
            .set(loaded.dataset, loaded.metadata);

        Ok(summary)
    }

    /// Installs an already-built dataset; returns the new generation.
    pub async fn load_dataset(&self, dataset: Dataset, metadata: SourceMetadata) -> u64 {
        self.session.lock().await.set(dataset, metadata)
    }

    /// Storage type and nullability of every column.
    pub async fn infer_schema(&self) -> Result<SchemaReport> {
        let mut session = self.session.lock().await;
        let report = session.memoize("infer_schema", &(), |d| Ok(analysis::infer_schema(d)))?;
        Ok(report.as_ref().clone())
    }

    /// Missing percentage of every column.
    pub async fn missing_report(&self) -> Result<MissingReport> {
        let mut session = self.session.lock().await;
        let report = session.memoize("missing_report", &(), |d| Ok(analysis::missing_report(d)))?;
        Ok(report.as_ref().clone())
    }

    /// Descriptive statistics.
    pub async fn profile(&self, request: &ProfileRequest) -> Result<ProfileReport> {
        let percentiles = &self.config.default_percentiles;
        let mut session = self.session.lock().await;
        let report = session.memoize("profile", request, |d| {
            analysis::profile(d, request, percentiles)
        })?;
        Ok(report.as_ref().clone())
    }

    /// Correlation matrix across all columns.
    pub async fn correlation(&self, method: CorrelationMethod) -> Result<CorrelationReport> {
        let mut session = self.session.lock().await;
        let report = session.memoize("correlation", &method, |d| {
            Ok(analysis::correlation(d, method))
        })?;
        Ok(report.as_ref().clone())
    }

    /// Outlier flagging on one column.
    pub async fn detect_outliers(&self, request: &OutlierRequest) -> Result<OutlierReport> {
        let defaults = &self.config.outliers;
        let mut session = self.session.lock().await;
        let report = session.memoize("detect_outliers", request, |d| {
            analysis::detect_outliers(d, request, defaults)
        })?;
        Ok(report.as_ref().clone())
    }

    /// Grouped aggregation.
    pub async fn groupby(&self, request: &GroupByRequest) -> Result<GroupByReport> {
        let policy = &self.config.groupby;
        let mut session = self.session.lock().await;
        let report = session.memoize("groupby", request, |d| analysis::groupby(d, request, policy))?;
        Ok(report.as_ref().clone())
    }

    /// Renders the requested sections and hands the document to a sink.
    ///
    /// # Errors
    /// `NoDatasetLoaded` without a dataset, `ExportSink` if the sink fails.
    pub async fn export_report(
        &self,
        destination: &Destination,
        format: ReportFormat,
        sections: &[String],
    ) -> Result<SaveReceipt> {
        let rendered = {
            let session = self.session.lock().await;
            let dataset = session.require()?;
            let document = ReportDocument::new(
                REPORT_TITLE,
                session.metadata().clone(),
                build_sections(&dataset, sections, &self.config)?,
            );
            render_report(&document, format)?
        };

        tracing::debug!(format = %format, sections = ?sections, "Rendered report");
        create_sink(destination).save(&rendered).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalystError;
    use crate::models::Column;

    fn sales() -> Dataset {
        Dataset::from_columns(vec![
            Column::integer("precio", vec![Some(1), Some(2), Some(3), Some(4), Some(5)]),
            Column::text(
                "categoria",
                ["A", "A", "B", "B", "C"]
                    .iter()
                    .map(|s| Some(s.to_string()))
                    .collect(),
            ),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_operations_require_dataset() {
        let analyst = Analyst::default();
        assert!(matches!(
            analyst.infer_schema().await,
            Err(AnalystError::NoDatasetLoaded)
        ));
        assert!(matches!(
            analyst.correlation(CorrelationMethod::Pearson).await,
            Err(AnalystError::NoDatasetLoaded)
        ));
        assert!(matches!(
            analyst.groupby(&GroupByRequest::new(["categoria"]).with_metric("precio", ["mean"])).await,
            Err(AnalystError::NoDatasetLoaded)
        ));
    }

    #[tokio::test]
    async fn test_memoized_reads_are_stable() {
        let analyst = Analyst::default();
        analyst.load_dataset(sales(), SourceMetadata::new()).await;

        let first = analyst.profile(&ProfileRequest::new()).await.unwrap();
        let second = analyst.profile(&ProfileRequest::new()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(analyst.session.lock().await.cache().hits(), 1);
    }

    #[tokio::test]
    async fn test_reload_clears_derived_results() {
        let analyst = Analyst::default();
        analyst.load_dataset(sales(), SourceMetadata::new()).await;
        let before = analyst.infer_schema().await.unwrap();
        assert_eq!(before.schema.len(), 2);

        let replacement =
            Dataset::from_columns(vec![Column::float("only", vec![Some(1.0)])]).unwrap();
        analyst.load_dataset(replacement, SourceMetadata::new()).await;

        let after = analyst.infer_schema().await.unwrap();
        assert_eq!(after.schema.len(), 1);
        assert_eq!(after.schema[0].name, "only");
        assert_eq!(analyst.generation().await, 2);
    }
}
