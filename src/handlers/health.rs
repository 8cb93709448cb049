use crate::protocol::ToolResult;

/// Liveness check.
pub async fn handle() -> ToolResult {
    ToolResult::text(r#"{"status":"ok"}"#)
}
