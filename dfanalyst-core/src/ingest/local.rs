//! Local file source for delimited text and JSON records.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use crate::error::{AnalystError, Result};
use crate::models::{Column, Dataset, SourceMetadata};

use super::inference::{infer_json_column, infer_text_column, json_cell, normalize_headers};
use super::{DataSource, LoadOptions, LoadedData};

/// File formats understood by [`LocalFileSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Csv,
    Tsv,
    Json,
}

impl FileFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "xlsx" | "xls" => Err(AnalystError::ingestion_message(format!(
                "Spreadsheet files are not supported: {}",
                path.display()
            ))),
            _ => Err(AnalystError::ingestion_message(format!(
                "Unsupported local file extension: {}",
                path.display()
            ))),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
        }
    }

    fn default_separator(self) -> u8 {
        match self {
            Self::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// Reads a dataset from a local `.csv`, `.tsv` or `.json` file.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
    options: LoadOptions,
}

impl LocalFileSource {
    /// Creates a source for `path`.
    pub fn new(path: impl Into<PathBuf>, options: LoadOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Path this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn separator(&self, format: FileFormat) -> Result<u8> {
        match self.options.sep.as_deref() {
            None => Ok(format.default_separator()),
            Some("\\t") => Ok(b'\t'),
            Some(sep) => match sep.as_bytes() {
                [byte] => Ok(*byte),
                _ => Err(AnalystError::invalid_argument(format!(
                    "separator must be a single byte, got '{}'",
                    sep
                ))),
            },
        }
    }

    fn check_encoding(&self) -> Result<()> {
        match self.options.encoding.as_deref() {
            None => Ok(()),
            Some(encoding) => {
                let normalized = encoding.to_lowercase().replace(['-', '_'], "");
                if normalized == "utf8" || normalized == "utf8sig" {
                    Ok(())
                } else {
                    Err(AnalystError::ingestion_message(format!(
                        "Unsupported encoding '{}': only UTF-8 is accepted",
                        encoding
                    )))
                }
            }
        }
    }

    fn metadata(&self, format: FileFormat) -> SourceMetadata {
        let mut metadata = SourceMetadata::new();
        metadata.insert("type".to_string(), JsonValue::from(self.kind()));
        metadata.insert(
            "path".to_string(),
            JsonValue::from(self.path.display().to_string()),
        );
        metadata.insert("format".to_string(), JsonValue::from(format.as_str()));
        if let Ok(JsonValue::Object(options)) = serde_json::to_value(&self.options) {
            metadata.insert("options".to_string(), JsonValue::Object(options));
        }
        metadata.insert(
            "loaded_at".to_string(),
            JsonValue::from(chrono::Utc::now().to_rfc3339()),
        );
        metadata
    }
}

#[async_trait]
impl DataSource for LocalFileSource {
    async fn load(&self) -> Result<LoadedData> {
        let format = FileFormat::from_path(&self.path)?;
        self.check_encoding()?;

        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            AnalystError::ingestion_failed(
                format!("Failed to read local file {}", self.path.display()),
                e,
            )
        })?;
        let text = String::from_utf8(bytes).map_err(|e| {
            AnalystError::ingestion_failed(
                format!("{} is not valid UTF-8", self.path.display()),
                e,
            )
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let dataset = match format {
            FileFormat::Csv | FileFormat::Tsv => {
                parse_delimited(text, self.separator(format)?, self.options.header)?
            }
            FileFormat::Json => parse_json_records(text)?,
        };

        tracing::info!(
            path = %self.path.display(),
            format = format.as_str(),
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "Loaded local file"
        );

        Ok(LoadedData {
            dataset,
            metadata: self.metadata(format),
        })
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}

/// Parses delimited text.
///
/// With `header = Some(k)`, rows before `k` are skipped and row `k` names
/// the columns. With `None`, every row is data and columns are named
/// `0..n`. Short rows are padded with missing cells.
pub fn parse_delimited(text: &str, separator: u8, header: Option<usize>) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalystError::ingestion_failed("Malformed delimited file", e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let (names, data) = match header {
        Some(index) => {
            if index >= rows.len() {
                return Err(AnalystError::ingestion_message(format!(
                    "Header row {} is beyond the end of the file ({} rows)",
                    index,
                    rows.len()
                )));
            }
            let mut data = rows.split_off(index);
            let names = normalize_headers(data.remove(0));
            (names, data)
        }
        None => {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            ((0..width).map(|i| i.to_string()).collect(), rows)
        }
    };

    let width = names.len();
    if let Some((line, row)) = data.iter().enumerate().find(|(_, row)| row.len() > width) {
        return Err(AnalystError::ingestion_message(format!(
            "Expected {} fields in data row {}, saw {}",
            width,
            line,
            row.len()
        )));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(data.len()); width];
    for row in data {
        let mut fields = row.into_iter();
        for column in &mut cells {
            column.push(fields.next().unwrap_or_default());
        }
    }

    Dataset::from_columns(
        names
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| infer_text_column(name, raw))
            .collect(),
    )
}

/// Parses a JSON array of records.
///
/// Column order is the order in which keys are first seen; absent keys are
/// missing cells.
pub fn parse_json_records(text: &str) -> Result<Dataset> {
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| AnalystError::ingestion_failed("Malformed JSON file", e))?;
    let JsonValue::Array(items) = value else {
        return Err(AnalystError::ingestion_message(
            "JSON file must contain an array of records",
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            JsonValue::Object(record) => records.push(record),
            other => {
                return Err(AnalystError::ingestion_message(format!(
                    "Record {} is not an object: {}",
                    index, other
                )));
            }
        }
    }

    let mut names: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .map(|name| {
            let cells = records.iter().map(|r| json_cell(r.get(&name))).collect();
            infer_json_column(name, cells)
        })
        .collect();

    Dataset::from_columns(columns)
}
