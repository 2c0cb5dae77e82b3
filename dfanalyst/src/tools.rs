//! Tool table and dispatch.
//!
//! Every tool maps one-to-one onto an [`Analyst`] operation. Arguments
//! arrive as a JSON object; results are the operation's natural response
//! with an `ok: true` marker, and failures carry the machine-readable
//! [`ErrorKind`] plus the error message.

use dfanalyst_core::analysis::{
    CorrelationMethod, GroupByRequest, OutlierMethod, OutlierRequest, ProfileRequest,
};
use dfanalyst_core::export::{Destination, ReportFormat, SECTION_NAMES};
use dfanalyst_core::ingest::{LoadOptions, SourceDescriptor};
use dfanalyst_core::{Analyst, AnalystError, ErrorKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

/// Names of every tool, in table order.
pub const TOOL_NAMES: [&str; 8] = [
    "load_data",
    "infer_schema",
    "missing_report",
    "profile",
    "correlation",
    "detect_outliers",
    "groupby",
    "export_report",
];

/// Description of one tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    /// Tool name used in `tools/call`
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// JSON Schema of the arguments object
    pub input_schema: Value,
}

impl ToolSpec {
    fn new(name: &'static str, description: &'static str, input_schema: Value) -> Self {
        Self {
            name,
            description,
            input_schema,
        }
    }

    /// Names listed under `required` in the input schema.
    pub fn required_params(&self) -> Vec<&str> {
        self.input_schema["required"]
            .as_array()
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Names of the properties not listed under `required`.
    pub fn optional_params(&self) -> Vec<&str> {
        let required = self.required_params();
        self.input_schema["properties"]
            .as_object()
            .map(|props| {
                props
                    .keys()
                    .map(String::as_str)
                    .filter(|name| !required.contains(name))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Returns the tool table.
pub fn tool_specs() -> Vec<ToolSpec> {
    let no_params = json!({"type": "object", "properties": {}});

    vec![
        ToolSpec::new(
            "load_data",
            "Load a dataset from a local CSV, TSV or JSON file into the session",
            json!({
                "type": "object",
                "properties": {
                    "source": {
                        "type": "object",
                        "description": "Source descriptor, e.g. {\"type\": \"local\", \"path\": \"data.csv\"}",
                        "properties": {
                            "type": {"type": "string", "enum": ["local"]},
                            "path": {"type": "string"}
                        },
                        "required": ["type", "path"]
                    },
                    "options": {
                        "type": "object",
                        "description": "Ingestion options",
                        "properties": {
                            "sep": {"type": "string"},
                            "header": {"type": ["integer", "null"]},
                            "encoding": {"type": "string"}
                        }
                    }
                },
                "required": ["source"]
            }),
        ),
        ToolSpec::new(
            "infer_schema",
            "Infer column types and nullability for the current dataset",
            no_params.clone(),
        ),
        ToolSpec::new(
            "missing_report",
            "Missing values by column (%)",
            no_params,
        ),
        ToolSpec::new(
            "profile",
            "Basic stats and percentiles for numeric columns",
            json!({
                "type": "object",
                "properties": {
                    "columns": {"type": "array", "items": {"type": "string"}},
                    "percentiles": {
                        "type": "array",
                        "items": {"type": "number", "minimum": 0, "maximum": 1}
                    }
                }
            }),
        ),
        ToolSpec::new(
            "correlation",
            "Correlation matrix across columns",
            json!({
                "type": "object",
                "properties": {
                    "method": {
                        "type": "string",
                        "enum": CorrelationMethod::NAMES,
                        "default": "pearson"
                    }
                }
            }),
        ),
        ToolSpec::new(
            "detect_outliers",
            "Detect outliers in a numeric column (IQR/Z-score)",
            json!({
                "type": "object",
                "properties": {
                    "column": {"type": "string"},
                    "method": {"type": "string", "enum": OutlierMethod::NAMES, "default": "iqr"},
                    "factor": {"type": "number", "default": 1.5},
                    "z": {"type": "number", "default": 3.0}
                },
                "required": ["column"]
            }),
        ),
        ToolSpec::new(
            "groupby",
            "Grouped aggregations",
            json!({
                "type": "object",
                "properties": {
                    "by": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                    "metrics": {
                        "type": "object",
                        "description": "Column name to list of functions (mean, sum, min, max, count, std, median, var, first, last, nunique)",
                        "additionalProperties": {"type": "array", "items": {"type": "string"}}
                    }
                },
                "required": ["by", "metrics"]
            }),
        ),
        ToolSpec::new(
            "export_report",
            "Render a report of the current dataset and save it to a destination",
            json!({
                "type": "object",
                "properties": {
                    "dest": {
                        "type": "object",
                        "description": "Destination descriptor, e.g. {\"type\": \"local\", \"path\": \"report.md\"}",
                        "properties": {
                            "type": {"type": "string", "enum": ["local"]},
                            "path": {"type": "string"}
                        },
                        "required": ["type", "path"]
                    },
                    "format": {"type": "string", "enum": ["md", "json", "html"]},
                    "sections": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": SECTION_NAMES
                        }
                    }
                },
                "required": ["dest", "format", "sections"]
            }),
        ),
    ]
}

/// Failure of a tool call, as surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ToolError {
    /// Machine-readable error kind
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
}

impl From<AnalystError> for ToolError {
    fn from(error: AnalystError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

type ToolResult<T> = std::result::Result<T, ToolError>;

/// Returns true if `name` is a known tool.
pub fn is_tool(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

/// Invokes the tool `name` with a JSON arguments object.
///
/// `arguments` may be `null` for tools without required parameters.
///
/// # Errors
/// The operation's error kind and message; `InvalidMethod` for an unknown
/// tool name and `InvalidArgument` for malformed arguments.
pub async fn call_tool(analyst: &Analyst, name: &str, arguments: Value) -> ToolResult<Value> {
    debug!(tool = name, "Tool call");
    let args = arguments_object(arguments)?;

    let result = match name {
        "load_data" => {
            let source = SourceDescriptor::from_json(required_value(&args, "source")?)?;
            let options = LoadOptions::from_json(args.get("options"))?;
            respond(&analyst.load_data(&source, &options).await?)
        }
        "infer_schema" => respond(&analyst.infer_schema().await?),
        "missing_report" => respond(&analyst.missing_report().await?),
        "profile" => {
            let request = ProfileRequest {
                columns: optional(&args, "columns")?,
                percentiles: optional(&args, "percentiles")?,
            };
            respond(&analyst.profile(&request).await?)
        }
        "correlation" => {
            let method = match optional::<String>(&args, "method")? {
                Some(method) => method.parse::<CorrelationMethod>()?,
                None => CorrelationMethod::default(),
            };
            respond(&analyst.correlation(method).await?)
        }
        "detect_outliers" => {
            let mut request = OutlierRequest::new(required::<String>(&args, "column")?);
            if let Some(method) = optional::<String>(&args, "method")? {
                request = request.with_method(method.parse::<OutlierMethod>()?);
            }
            request.factor = optional(&args, "factor")?;
            request.z = optional(&args, "z")?;
            respond(&analyst.detect_outliers(&request).await?)
        }
        "groupby" => {
            let request: GroupByRequest = serde_json::from_value(Value::Object(args))
                .map_err(|e| AnalystError::invalid_argument(format!("invalid groupby arguments: {}", e)))?;
            respond(&analyst.groupby(&request).await?)
        }
        "export_report" => {
            let dest = Destination::from_json(required_value(&args, "dest")?)?;
            let format = match optional::<String>(&args, "format")? {
                Some(format) => format,
                None => required::<String>(&args, "fmt")?,
            };
            let format = format.parse::<ReportFormat>()?;
            let sections: Vec<String> = required(&args, "sections")?;
            respond(&analyst.export_report(&dest, format, &sections).await?)
        }
        other => Err(AnalystError::invalid_method(other, &TOOL_NAMES).into()),
    };

    if let Err(error) = &result {
        warn!(tool = name, kind = %error.kind, "Tool call failed: {}", error.message);
    }
    result
}

fn arguments_object(arguments: Value) -> ToolResult<Map<String, Value>> {
    match arguments {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(AnalystError::invalid_argument(format!(
            "arguments must be a JSON object, got {}",
            other
        ))
        .into()),
    }
}

fn required_value<'a>(args: &'a Map<String, Value>, key: &str) -> ToolResult<&'a Value> {
    match args.get(key) {
        Some(Value::Null) | None => {
            Err(AnalystError::invalid_argument(format!("missing required argument '{}'", key)).into())
        }
        Some(value) => Ok(value),
    }
}

fn required<T: DeserializeOwned>(args: &Map<String, Value>, key: &str) -> ToolResult<T> {
    let value = required_value(args, key)?;
    decode(key, value)
}

/// Absent and `null` arguments both read as `None`.
fn optional<T: DeserializeOwned>(args: &Map<String, Value>, key: &str) -> ToolResult<Option<T>> {
    match args.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => decode(key, value).map(Some),
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> ToolResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| {
        AnalystError::invalid_argument(format!("invalid argument '{}': {}", key, e)).into()
    })
}

fn respond<T: Serialize>(result: &T) -> ToolResult<Value> {
    let mut value = serde_json::to_value(result).map_err(|e| {
        AnalystError::invalid_argument(format!("result could not be encoded: {}", e))
    })?;
    if let Value::Object(map) = &mut value {
        map.insert("ok".to_string(), Value::Bool(true));
    }
    Ok(value)
}
