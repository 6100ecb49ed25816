//! Line-delimited JSON-RPC 2.0 server for the search tools.
//!
//! Each request is one JSON object on one line of input; each response is
//! written as one line of output. Notifications (requests without an `id`)
//! never get a response.

use std::io;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::{handle_list_files, handle_search, tool_descriptors, SearchInput, LIST_FILES, SEARCH_KEYWORDS};
use crate::errors::DocError;
use crate::services::SearchService;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "docshelf";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl Response {
    fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError { code, message: message.into() }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Serves the search tools over any line-oriented byte stream
#[derive(Debug, Clone)]
pub struct ToolServer {
    search: SearchService,
}

impl ToolServer {
    pub fn new(search: SearchService) -> Self {
        Self { search }
    }

    /// Serve requests from stdin until it closes
    pub async fn serve_stdio(&self) -> io::Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await
    }

    /// Serve requests from `reader`, writing responses to `writer`, until EOF
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Tool server ready");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let encoded = serde_json::to_string(&response).map_err(io::Error::other)?;
                writer.write_all(encoded.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        info!("Input closed, tool server stopping");
        Ok(())
    }

    /// Handle one raw request line; `None` means nothing is sent back
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle_request(request).await?,
            Err(e) => {
                warn!("Unparseable request: {}", e);
                Response::failure(Value::Null, PARSE_ERROR, format!("Parse error: {e}"))
            }
        };
        serde_json::to_value(response).ok()
    }

    async fn handle_request(&self, request: Request) -> Option<Response> {
        let Some(method) = request.method else {
            return Some(Response::failure(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid request: missing method",
            ));
        };
        let Some(id) = request.id else {
            debug!("Notification '{}'", method);
            return None;
        };
        debug!("Request '{}' (id {})", method, id);

        let response = match method.as_str() {
            "initialize" => Response::success(id, Self::initialize_result(&request.params)),
            "ping" => Response::success(id, json!({})),
            "tools/list" => Response::success(id, json!({ "tools": tool_descriptors() })),
            "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
                Ok(params) => self.call_tool(id, params).await,
                Err(e) => Response::failure(id, INVALID_PARAMS, format!("Invalid params: {e}")),
            },
            other => Response::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        };
        Some(response)
    }

    fn initialize_result(params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") }
        })
    }

    async fn call_tool(&self, id: Value, params: CallParams) -> Response {
        info!("Tool call '{}'", params.name);
        let search = self.search.clone();
        let outcome = match params.name.as_str() {
            SEARCH_KEYWORDS => {
                let input: SearchInput = match serde_json::from_value(params.arguments) {
                    Ok(input) => input,
                    Err(e) => {
                        return Response::failure(id, INVALID_PARAMS, format!("Invalid arguments: {e}"));
                    }
                };
                run_blocking(move || handle_search(&search, input)).await
            }
            LIST_FILES => run_blocking(move || handle_list_files(&search)).await,
            other => {
                return Response::failure(id, INVALID_PARAMS, format!("Unknown tool: {other}"));
            }
        };

        match outcome {
            Ok(structured) => {
                let text = structured.to_string();
                Response::success(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": text }],
                        "structuredContent": structured,
                        "isError": false
                    }),
                )
            }
            Err(ToolFailure::Tool(e)) => {
                warn!("Tool '{}' failed: {}", params.name, e);
                Response::success(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": e.to_string() }],
                        "isError": true
                    }),
                )
            }
            Err(ToolFailure::Internal(message)) => Response::failure(id, INTERNAL_ERROR, message),
        }
    }
}

enum ToolFailure {
    Tool(DocError),
    Internal(String),
}

/// Run a tool on the blocking pool and serialize its output
async fn run_blocking<F, T>(work: F) -> Result<Value, ToolFailure>
where
    F: FnOnce() -> Result<T, DocError> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let output = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ToolFailure::Internal(e.to_string()))?
        .map_err(ToolFailure::Tool)?;
    serde_json::to_value(output).map_err(|e| ToolFailure::Internal(e.to_string()))
}
