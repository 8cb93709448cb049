pub mod request;
pub mod response;

pub use request::{
    ClassifyParams, ClientInfo, GenerateIdParams, InitializeParams, JsonRpcRequest, RpcId,
    ShatterParams, ToolCallParams,
};
pub use response::{
    JsonRpcError, JsonRpcResponse, McpError, McpErrorCode, McpErrorResponse, ToolResult,
    ToolResultContent,
};
