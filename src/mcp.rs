//! MCP server for the execution log tools.
//!
//! Implements the Model Context Protocol over stdin/stdout using
//! JSON-RPC 2.0. Logging goes to stderr so stdout carries only frames.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

use crate::analyzer;
use crate::config::Config;
use crate::download;
use crate::error::{LogsError, Result};
use crate::log_service::LogServiceClient;
use crate::models::{AnalyzeArchiveParams, DownloadLogsParams};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// MCP JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// Tool state shared across requests.
pub struct McpServer {
    cfg: Config,
    client: LogServiceClient,
}

impl McpServer {
    pub fn new(cfg: Config) -> Result<Self> {
        let client = LogServiceClient::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    /// Answer one request. Notifications (no `id`) yield `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.id.is_none() {
            tracing::debug!(method = %request.method, "Ignoring notification");
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                request.id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": "harness-logs",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),

            "ping" => JsonRpcResponse::success(request.id, json!({})),

            "tools/list" => JsonRpcResponse::success(request.id, json!({ "tools": tool_list(&self.cfg) })),

            "tools/call" => {
                let tool_name = request
                    .params
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or("");
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or_else(|| json!({}));

                let outcome = match tool_name {
                    "download_execution_logs" => self.download_execution_logs(arguments).await,
                    "analyze_log_archive" => self.analyze_log_archive(arguments).await,
                    other => {
                        return Some(JsonRpcResponse::failure(
                            request.id,
                            INVALID_PARAMS,
                            format!("Unknown tool: {}", other),
                        ))
                    }
                };

                let result = match outcome {
                    Ok(text) => json!({ "content": [{ "type": "text", "text": text }] }),
                    Err(e) => {
                        tracing::warn!(tool = tool_name, error = %e, "Tool call failed");
                        json!({
                            "content": [{ "type": "text", "text": format!("Error: {}", e) }],
                            "isError": true
                        })
                    }
                };
                JsonRpcResponse::success(request.id, result)
            }

            _ => JsonRpcResponse::failure(request.id, METHOD_NOT_FOUND, "Method not found"),
        };

        Some(response)
    }

    async fn download_execution_logs(&self, arguments: Value) -> Result<String> {
        let params: DownloadLogsParams = parse_arguments(arguments)?;
        let outcome = download::download_execution_logs(&self.client, &self.cfg, &params).await?;
        Ok(outcome.summary())
    }

    async fn analyze_log_archive(&self, arguments: Value) -> Result<String> {
        let params: AnalyzeArchiveParams = parse_arguments(arguments)?;
        let num_lines = self.cfg.lines.clamp(params.num_lines);
        analyzer::analyze_archive_file(PathBuf::from(params.archive_path), num_lines, self.cfg.read)
            .await
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| LogsError::InvalidParameter(e.to_string()))
}

/// Tool definitions advertised by `tools/list`.
pub fn tool_list(cfg: &Config) -> Value {
    let lines_help = format!(
        "Number of most recent log lines to return (default {}, max {})",
        cfg.lines.default, cfg.lines.max
    );

    json!([
        {
            "name": "download_execution_logs",
            "description": "Download the logs of a pipeline execution as a ZIP archive, save it locally and return the most recent log lines across all steps.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "plan_execution_id": { "type": "string", "description": "The plan execution identifier" },
                    "logs_directory": { "type": "string", "description": "Directory the archive is saved under, as logs-<id>/logs.zip" },
                    "num_lines": { "type": "number", "description": lines_help },
                    "log_key": { "type": "string", "description": "Direct log key prefix; skips the execution lookup" },
                    "org_id": { "type": "string", "description": "Organization identifier (defaults to the configured org)" },
                    "project_id": { "type": "string", "description": "Project identifier (defaults to the configured project)" }
                },
                "required": ["plan_execution_id", "logs_directory"]
            }
        },
        {
            "name": "analyze_log_archive",
            "description": "Return the most recent log lines from a previously downloaded log archive.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "archive_path": { "type": "string", "description": "Path to a logs.zip archive" },
                    "num_lines": { "type": "number", "description": lines_help }
                },
                "required": ["archive_path"]
            }
        }
    ])
}

/// Run the MCP server on stdio
pub async fn run_mcp_server(cfg: Config) -> anyhow::Result<()> {
    let server = McpServer::new(cfg)?;

    let stdin = tokio::io::stdin();
    let mut reader = tokio::io::BufReader::new(stdin);
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    tracing::info!("MCP server ready on stdio");

    loop {
        line.clear();
        match reader.read_line(&mut line).await? {
            0 => break,
            _ => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let request: JsonRpcRequest = match serde_json::from_str(line) {
                    Ok(req) => req,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to parse request");
                        continue;
                    }
                };

                if let Some(response) = server.handle_request(request).await {
                    let mut frame = serde_json::to_string(&response)?;
                    frame.push('\n');
                    stdout.write_all(frame.as_bytes()).await?;
                    stdout.flush().await?;
                }
            }
        }
    }

    Ok(())
}
