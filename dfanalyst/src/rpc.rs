//! JSON-RPC 2.0 transport over stdio.
//!
//! One message per line in each direction. Supported methods:
//! `initialize`, `ping`, `tools/list` and `tools/call`. Notifications (no
//! `id`) are accepted and never answered.

use dfanalyst_core::Analyst;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::tools::{call_tool, tool_specs};

/// Protocol version reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version
pub const JSONRPC_VERSION: &str = "2.0";

/// Request ID (can be string or number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String ID
    String(String),
    /// Number ID
    Number(i64),
}

/// Incoming request or notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Protocol version, always `2.0`
    pub jsonrpc: String,
    /// Absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Outgoing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Protocol version, always `2.0`
    pub jsonrpc: String,
    /// `null` when the request id could not be read
    pub id: Option<RequestId>,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Create a success response
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn failure(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// JSON-RPC error code
    pub code: i32,
    /// Short error description
    pub message: String,
    /// Additional error detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Create a new error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Add data to the error
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    /// Invalid request (-32600)
    pub fn invalid_request() -> Self {
        Self::new(-32600, "Invalid request")
    }

    /// Method not found (-32601)
    pub fn method_not_found() -> Self {
        Self::new(-32601, "Method not found")
    }

    /// Invalid params (-32602)
    pub fn invalid_params() -> Self {
        Self::new(-32602, "Invalid params")
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Handles one line of input.
///
/// Returns `None` for notifications and blank lines.
pub async fn handle_message(analyst: &Analyst, line: &str) -> Option<RpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unparseable message: {}", e);
            return Some(RpcResponse::failure(
                None,
                RpcError::parse_error().with_data(json!(e.to_string())),
            ));
        }
    };

    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Some(RpcResponse::failure(
                None,
                RpcError::invalid_request().with_data(json!(e.to_string())),
            ));
        }
    };

    let Some(id) = request.id.clone() else {
        debug!(method = %request.method, "Notification received");
        return None;
    };

    let outcome = dispatch(analyst, &request.method, request.params).await;
    Some(match outcome {
        Ok(result) => RpcResponse::success(Some(id), result),
        Err(error) => RpcResponse::failure(Some(id), error),
    })
}

async fn dispatch(
    analyst: &Analyst,
    method: &str,
    params: Option<Value>,
) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {"tools": {}},
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tool_specs() })),
        "tools/call" => {
            let params: CallParams = serde_json::from_value(params.unwrap_or(Value::Null))
                .map_err(|e| RpcError::invalid_params().with_data(json!(e.to_string())))?;
            Ok(call_result(analyst, &params.name, params.arguments).await)
        }
        other => {
            debug!(method = other, "Unknown method");
            Err(RpcError::method_not_found().with_data(json!(other)))
        }
    }
}

/// Tool outcomes are always results; failures set `isError`.
async fn call_result(analyst: &Analyst, name: &str, arguments: Value) -> Value {
    match call_tool(analyst, name, arguments).await {
        Ok(value) => json!({
            "content": [{"type": "text", "text": value.to_string()}],
            "structuredContent": value,
            "isError": false,
        }),
        Err(error) => json!({
            "content": [{
                "type": "text",
                "text": format!("[{}] {}", error.kind, error.message),
            }],
            "structuredContent": {"kind": error.kind, "message": error.message},
            "isError": true,
        }),
    }
}

/// Serves requests read from `reader`, writing responses to `writer`,
/// until end of input.
///
/// # Errors
/// I/O errors on either stream.
pub async fn serve_io<R, W>(analyst: &Analyst, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(response) = handle_message(analyst, &line).await {
            let mut encoded = serde_json::to_string(&response)?;
            encoded.push('\n');
            writer.write_all(encoded.as_bytes()).await?;
            writer.flush().await?;
        }
    }
    Ok(())
}

/// Serves requests on the process stdin/stdout.
///
/// # Errors
/// I/O errors on stdin or stdout.
pub async fn serve(analyst: &Analyst) -> std::io::Result<()> {
    info!("Serving JSON-RPC on stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    serve_io(analyst, stdin, tokio::io::stdout()).await?;
    info!("Input closed, shutting down");
    Ok(())
}
