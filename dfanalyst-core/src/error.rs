//! Error types for dataset analysis operations.
//!
//! Every failure carries a machine-readable [`ErrorKind`] and a
//! human-readable message. Errors are local to a single operation: no
//! variant is ever produced after the session has been partially mutated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for dfanalyst operations.
#[derive(Debug, Error)]
pub enum AnalystError {
    /// An analysis operation was invoked before any dataset was loaded
    #[error("No dataset loaded. Call load_data first.")]
    NoDatasetLoaded,

    /// A referenced column does not exist in the current dataset
    #[error("Column not found: '{column}'")]
    ColumnNotFound { column: String },

    /// Unsupported method or function name
    #[error("Invalid method '{method}': expected one of {expected}")]
    InvalidMethod { method: String, expected: String },

    /// Report format outside md/json/html
    #[error("Unsupported format '{format}': format must be md/json/html")]
    UnsupportedFormat { format: String },

    /// Malformed operation parameters
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Dataset ingestion failed
    #[error("Ingestion failed: {context}")]
    Ingestion {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Report sink failed to store the document
    #[error("Export sink failed: {context}")]
    ExportSink {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results with `AnalystError`
pub type Result<T> = std::result::Result<T, AnalystError>;

/// Machine-readable error kind surfaced by tool-call adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// An operation needed a dataset and none is loaded
    NoDatasetLoaded,
    /// A named column does not exist
    ColumnNotFound,
    /// Unknown method or aggregation name
    InvalidMethod,
    /// Unknown export format
    UnsupportedFormat,
    /// Malformed or out-of-range argument
    InvalidArgument,
    /// The source could not be read or parsed
    IngestionFailure,
    /// The report could not be saved
    ExportSinkFailure,
    /// Invalid configuration
    Configuration,
}

impl ErrorKind {
    /// Returns the stable string form of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoDatasetLoaded => "NoDatasetLoaded",
            ErrorKind::ColumnNotFound => "ColumnNotFound",
            ErrorKind::InvalidMethod => "InvalidMethod",
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::IngestionFailure => "IngestionFailure",
            ErrorKind::ExportSinkFailure => "ExportSinkFailure",
            ErrorKind::Configuration => "Configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal error carrying only a message, used when a collaborator
/// reports a failure without an underlying error value.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct MessageError(pub String);

impl AnalystError {
    /// Returns the machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalystError::NoDatasetLoaded => ErrorKind::NoDatasetLoaded,
            AnalystError::ColumnNotFound { .. } => ErrorKind::ColumnNotFound,
            AnalystError::InvalidMethod { .. } => ErrorKind::InvalidMethod,
            AnalystError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            AnalystError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            AnalystError::Ingestion { .. } => ErrorKind::IngestionFailure,
            AnalystError::ExportSink { .. } => ErrorKind::ExportSinkFailure,
            AnalystError::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Creates a column-not-found error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates an invalid-method error listing the accepted values
    pub fn invalid_method(method: impl Into<String>, expected: &[&str]) -> Self {
        Self::InvalidMethod {
            method: method.into(),
            expected: expected.join(", "),
        }
    }

    /// Creates an unsupported-format error
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an ingestion error with context
    pub fn ingestion_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Ingestion {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an ingestion error from a plain message
    pub fn ingestion_message(context: impl Into<String>) -> Self {
        let context = context.into();
        Self::Ingestion {
            source: Box::new(MessageError(context.clone())),
            context,
        }
    }

    /// Creates an export sink error with context
    pub fn export_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ExportSink {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AnalystError::NoDatasetLoaded.kind(), ErrorKind::NoDatasetLoaded);
        assert_eq!(
            AnalystError::column_not_found("precio").kind(),
            ErrorKind::ColumnNotFound
        );
        assert_eq!(
            AnalystError::invalid_method("median", &["iqr", "zscore"]).kind(),
            ErrorKind::InvalidMethod
        );
        assert_eq!(
            AnalystError::ingestion_message("missing file").kind(),
            ErrorKind::IngestionFailure
        );
    }

    #[test]
    fn test_error_messages() {
        let error = AnalystError::column_not_found("precio");
        assert!(error.to_string().contains("'precio'"));

        let error = AnalystError::invalid_method("median", &["iqr", "zscore"]);
        assert!(error.to_string().contains("iqr, zscore"));

        let error = AnalystError::unsupported_format("pdf");
        assert!(error.to_string().contains("md/json/html"));
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::ExportSinkFailure).unwrap();
        assert_eq!(json, "\"ExportSinkFailure\"");
        assert_eq!(ErrorKind::NoDatasetLoaded.to_string(), "NoDatasetLoaded");
    }

    #[test]
    fn test_ingestion_message_keeps_context() {
        let error = AnalystError::ingestion_message("Local file not found: data.csv");
        assert!(error.to_string().contains("data.csv"));
        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Local file not found: data.csv"));
    }
}
