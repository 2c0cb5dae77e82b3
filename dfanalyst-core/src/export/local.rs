//! Local filesystem report sink.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use crate::error::{AnalystError, Result};

use super::{RenderedReport, ReportSink, SaveReceipt};

/// Writes reports to a local file, creating parent directories as needed.
#[derive(Debug, Clone)]
pub struct LocalFileSink {
    path: PathBuf,
}

impl LocalFileSink {
    /// Creates a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSink for LocalFileSink {
    async fn save(&self, report: &RenderedReport) -> Result<SaveReceipt> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AnalystError::export_failed(
                    format!("Failed to create directory {}", parent.display()),
                    e,
                )
            })?;
        }

        tokio::fs::write(&self.path, report.body.as_bytes())
            .await
            .map_err(|e| {
                AnalystError::export_failed(
                    format!("Failed to write report to {}", self.path.display()),
                    e,
                )
            })?;

        tracing::info!(
            path = %self.path.display(),
            format = %report.format,
            mime = report.format.mime_type(),
            bytes = report.len(),
            "Report saved"
        );

        let mut dest = serde_json::Map::new();
        dest.insert("type".to_string(), JsonValue::from(self.kind()));
        dest.insert(
            "path".to_string(),
            JsonValue::from(self.path.display().to_string()),
        );
        dest.insert("bytes".to_string(), JsonValue::from(report.len()));

        Ok(SaveReceipt { saved: true, dest })
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ReportFormat;

    fn report() -> RenderedReport {
        RenderedReport {
            format: ReportFormat::Md,
            body: "# Report\n".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/report.md");

        let receipt = LocalFileSink::new(&path).save(&report()).await.unwrap();

        assert!(receipt.saved);
        assert_eq!(receipt.dest["type"], "local");
        assert_eq!(receipt.dest["bytes"], 9);
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "# Report\n");
    }

    #[tokio::test]
    async fn test_save_failure_maps_to_export_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten by a file
        let result = LocalFileSink::new(dir.path()).save(&report()).await;
        assert!(matches!(result, Err(AnalystError::ExportSink { .. })));
    }
}
