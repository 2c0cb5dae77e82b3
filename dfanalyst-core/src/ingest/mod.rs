//! Dataset ingestion sources and factory.
//!
//! A source turns a `load_data` descriptor into a complete [`Dataset`] plus
//! provenance metadata. Sources never touch the session: the caller installs
//! the result with a single `set` once loading has fully succeeded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::PathBuf;

use crate::error::{AnalystError, Result};
use crate::models::{Dataset, SourceMetadata};

mod inference;
mod local;

pub use inference::{MISSING_MARKERS, is_missing_marker};
pub use local::LocalFileSource;

/// Where to load a dataset from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// A file on the local filesystem
    Local { path: PathBuf },
}

impl SourceDescriptor {
    /// Creates a local file descriptor.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Parses a descriptor from tool-call JSON.
    ///
    /// # Errors
    /// `InvalidArgument` for a missing or unknown `type`, or missing fields.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| AnalystError::invalid_argument(format!("invalid source descriptor: {}", e)))
    }
}

fn default_header() -> Option<usize> {
    Some(0)
}

/// Parsing options supplied with `load_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Field separator; defaults to `,` for .csv and tab for .tsv
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sep: Option<String>,
    /// Header row index; `null` means the file has no header row
    #[serde(default = "default_header")]
    pub header: Option<usize>,
    /// Text encoding; only UTF-8 is accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Worksheet selector; rejected while spreadsheet files are unsupported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sep: None,
            header: default_header(),
            encoding: None,
            sheet: None,
        }
    }
}

impl LoadOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from tool-call JSON; `null` yields defaults.
    pub fn from_json(value: Option<&JsonValue>) -> Result<Self> {
        match value {
            None | Some(JsonValue::Null) => Ok(Self::default()),
            Some(value) => {
                let options: Self = serde_json::from_value(value.clone()).map_err(|e| {
                    AnalystError::invalid_argument(format!("invalid load options: {}", e))
                })?;
                options.validate()?;
                Ok(options)
            }
        }
    }

    /// Rejects options no built-in source can honor.
    ///
    /// # Errors
    /// `InvalidArgument` if a worksheet is selected.
    pub fn validate(&self) -> Result<()> {
        match &self.sheet {
            Some(sheet) => Err(AnalystError::invalid_argument(format!(
                "sheet '{}' requested, but spreadsheet files are not supported",
                sheet
            ))),
            None => Ok(()),
        }
    }

    /// Builder method to set the separator.
    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = Some(sep.into());
        self
    }

    /// Builder method to set the header row (`None` for no header).
    pub fn with_header(mut self, header: Option<usize>) -> Self {
        self.header = header;
        self
    }

    /// Builder method to set the encoding.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// A loaded dataset and its provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// The parsed table
    pub dataset: Dataset,
    /// Provenance echoed as `source_meta`
    pub metadata: SourceMetadata,
}

/// A place datasets can be loaded from.
///
/// # Object Safety
/// This trait is object-safe, allowing for dynamic dispatch through
/// `Box<dyn DataSource>`.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Loads the complete dataset.
    ///
    /// # Errors
    /// `Ingestion` if the source cannot be read or parsed.
    async fn load(&self) -> Result<LoadedData>;

    /// Source type label echoed in metadata (`local`, ...).
    fn kind(&self) -> &'static str;
}

/// Creates the source for a descriptor.
///
/// # Example
/// ```rust,no_run
/// use dfanalyst_core::ingest::{LoadOptions, SourceDescriptor, create_source};
///
/// # async fn example() -> dfanalyst_core::Result<()> {
/// let source = create_source(&SourceDescriptor::local("sales.csv"), &LoadOptions::default())?;
/// let loaded = source.load().await?;
/// println!("Loaded {} rows", loaded.dataset.row_count());
/// # Ok(())
/// # }
/// ```
pub fn create_source(
    source: &SourceDescriptor,
    options: &LoadOptions,
) -> Result<Box<dyn DataSource>> {
    options.validate()?;
    match source {
        SourceDescriptor::Local { path } => {
            Ok(Box::new(LocalFileSource::new(path.clone(), options.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_parsing() {
        let source = SourceDescriptor::from_json(&json!({"type": "local", "path": "a.csv"})).unwrap();
        assert_eq!(source, SourceDescriptor::local("a.csv"));

        for bad in [
            json!({"type": "gsheet", "spreadsheetId": "x"}),
            json!({"path": "a.csv"}),
            json!({"type": "local"}),
        ] {
            assert!(matches!(
                SourceDescriptor::from_json(&bad),
                Err(AnalystError::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn test_load_options() {
        let options = LoadOptions::from_json(None).unwrap();
        assert_eq!(options.header, Some(0));

        let options = LoadOptions::from_json(Some(&json!({"header": null, "sep": ";"}))).unwrap();
        assert_eq!(options.header, None);
        assert_eq!(options.sep.as_deref(), Some(";"));

        let options = LoadOptions::from_json(Some(&json!({"header": 2}))).unwrap();
        assert_eq!(options.header, Some(2));

        assert!(LoadOptions::from_json(Some(&json!({"header": "first"}))).is_err());
        assert!(LoadOptions::from_json(Some(&json!({"sheet": null}))).is_ok());
    }

    #[test]
    fn test_sheet_option_rejected() {
        assert!(matches!(
            LoadOptions::from_json(Some(&json!({"sheet": "Hoja1"}))),
            Err(AnalystError::InvalidArgument { .. })
        ));

        let options = LoadOptions {
            sheet: Some("Hoja1".to_string()),
            ..LoadOptions::default()
        };
        assert!(matches!(
            create_source(&SourceDescriptor::local("x.csv"), &options),
            Err(AnalystError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_create_source() {
        let source = create_source(&SourceDescriptor::local("x.csv"), &LoadOptions::default()).unwrap();
        assert_eq!(source.kind(), "local");
    }
}
