use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 ID: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    Str(String),
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<RpcId>,
    pub method: String,
    pub params: Option<Value>,
}

/// Parameters for the `fixtures.shatter` tool.
///
/// Filters stay raw JSON here so that a malformed filter surfaces as an
/// `invalid_filter` error rather than a generic argument error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShatterParams {
    /// Base document (JSON object).
    pub document: Option<Value>,
    /// OpenAPI component whose first example serves as the base document.
    pub component: Option<String>,
    /// Accepts any i64; negative means unlimited.
    #[serde(default)]
    pub depth: i64,
    pub affected: Option<Value>,
    pub unaffected: Option<Value>,
    /// Field that receives a fresh id on every variant.
    pub attach_id: Option<String>,
}

/// Parameters for the `fixtures.classify` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifyParams {
    #[serde(flatten)]
    pub shatter: ShatterParams,
    /// JSON Schema to judge variants by; defaults to the component's schema.
    pub schema: Option<Value>,
}

/// Parameters for the `fixtures.generate_id` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateIdParams {
    /// Accepts i64 so we can detect negative values before casting to usize.
    pub nbytes: Option<i64>,
}

/// MCP `initialize` params.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information sent during `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<Value>,
}
