pub mod classify;
pub mod generate_id;
pub mod health;
pub mod shatter;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::protocol::{
    ClassifyParams, GenerateIdParams, InitializeParams, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, McpErrorCode, McpErrorResponse, ShatterParams, ToolCallParams, ToolResult,
};

/// Input schema properties shared by `fixtures.shatter` and `fixtures.classify`.
fn generator_properties() -> Value {
    json!({
        "document": {
            "type": "object",
            "description": "Base document to corrupt"
        },
        "component": {
            "type": "string",
            "description": "OpenAPI component whose first example is the base document (requires SHATTER_API_SPEC)"
        },
        "depth": {
            "type": "integer",
            "description": "Levels of nested objects to descend into; 0 = top level only, negative = unlimited"
        },
        "affected": {
            "description": "Keys eligible for removal: \"all\", \"none\", \"same_layer\" or a list of keys / [key, filter] pairs"
        },
        "unaffected": {
            "description": "Keys protected from removal, same forms as affected; overrides affected"
        },
        "attach_id": {
            "type": "string",
            "description": "Field set to a fresh random id on every variant"
        }
    })
}

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(
    req: &JsonRpcRequest,
    config: &ServerConfig,
) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => {
            if let Some(params) = req
                .params
                .as_ref()
                .and_then(|p| serde_json::from_value::<InitializeParams>(p.clone()).ok())
            {
                let client = params.client_info.as_ref();
                tracing::info!(
                    protocol_version = params.protocol_version.as_deref().unwrap_or("unknown"),
                    client = client.and_then(|c| c.name.as_deref()).unwrap_or("unknown"),
                    client_version = client.and_then(|c| c.version.as_deref()).unwrap_or("unknown"),
                    "initialize"
                );
            }

            let result = json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "fixture-shatter",
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "notifications/initialized" => None,

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), json!({}))),

        "tools/list" => {
            let mut classify_properties = generator_properties();
            classify_properties["schema"] = json!({
                "type": "object",
                "description": "JSON Schema judging each variant; defaults to the component's schema"
            });

            let result = json!({
                "tools": [
                    {
                        "name": "fixtures.shatter",
                        "description": "Generate every variant of a document with exactly one field removed",
                        "inputSchema": {
                            "type": "object",
                            "properties": generator_properties()
                        }
                    },
                    {
                        "name": "fixtures.classify",
                        "description": "Generate one-field-removed variants and report which ones a JSON Schema still accepts",
                        "inputSchema": {
                            "type": "object",
                            "properties": classify_properties
                        }
                    },
                    {
                        "name": "fixtures.generate_id",
                        "description": "Generate a random URL-safe document id",
                        "inputSchema": {
                            "type": "object",
                            "properties": {
                                "nbytes": {
                                    "type": "integer",
                                    "description": "Random bytes before encoding (default 32)",
                                    "minimum": 1
                                }
                            }
                        }
                    },
                    {
                        "name": "health",
                        "description": "Liveness check",
                        "inputSchema": {
                            "type": "object",
                            "properties": {}
                        }
                    }
                ]
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "tools/call" => {
            let params: ToolCallParams = match &req.params {
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            req.id.clone(),
                            JsonRpcError::invalid_params(format!(
                                "Invalid tools/call params: {e}"
                            )),
                        ));
                    }
                },
                None => {
                    return Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params("Missing params for tools/call"),
                    ));
                }
            };

            let tool_result = dispatch_tool_call(&params, config).await;
            match serde_json::to_value(&tool_result) {
                Ok(result_json) => Some(JsonRpcResponse::success(req.id.clone(), result_json)),
                Err(e) => {
                    tracing::error!(error = %e, "tool result serialization failed");
                    Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::internal_error("Tool result serialization failed"),
                    ))
                }
            }
        }

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

async fn dispatch_tool_call(params: &ToolCallParams, config: &ServerConfig) -> ToolResult {
    tracing::debug!(tool = %params.name, "tools/call");

    match params.name.as_str() {
        "fixtures.shatter" => match arguments::<ShatterParams>(params) {
            Ok(args) => shatter::handle(args, config).await,
            Err(err) => err,
        },

        "fixtures.classify" => match arguments::<ClassifyParams>(params) {
            Ok(args) => classify::handle(args, config).await,
            Err(err) => err,
        },

        "fixtures.generate_id" => match arguments::<GenerateIdParams>(params) {
            Ok(args) => generate_id::handle(args).await,
            Err(err) => err,
        },

        "health" => health::handle().await,

        _ => ToolResult::error(format!("Unknown tool: {}", params.name)),
    }
}

/// Decode a tool's arguments. Every tool here has only optional arguments,
/// so a missing `arguments` object decodes as `{}`.
fn arguments<T: DeserializeOwned>(params: &ToolCallParams) -> Result<T, ToolResult> {
    let raw = params.arguments.clone().unwrap_or_else(|| json!({}));
    serde_json::from_value(raw).map_err(|e| {
        ToolResult::error(format!("Invalid arguments for {}: {e}", params.name))
    })
}

/// Await a blocking tool task under the configured timeout.
async fn run_bounded(
    task: JoinHandle<Result<String, McpErrorResponse>>,
    config: &ServerConfig,
) -> ToolResult {
    let timeout = config.tool_timeout;
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(json))) => ToolResult::text(json),
        Ok(Ok(Err(mcp_err))) => mcp_err.into(),
        Ok(Err(join_err)) => {
            tracing::error!(error = %join_err, "task join error");
            McpErrorResponse::canonical(McpErrorCode::InternalError).into()
        }
        Err(_) => {
            tracing::error!(timeout_secs = timeout.as_secs(), "operation timed out");
            McpErrorResponse::canonical(McpErrorCode::InternalError).into()
        }
    }
}
