use serde::Serialize;

use crate::fixtures::{generate_id, DEFAULT_ID_BYTES};
use crate::protocol::{GenerateIdParams, McpErrorCode, McpErrorResponse, ToolResult};

/// Upper bound on random bytes per id.
const MAX_ID_BYTES: usize = 1024;

#[derive(Debug, Serialize)]
struct GenerateIdResponse {
    id: String,
}

/// Handle a `fixtures.generate_id` tool call.
pub async fn handle(params: GenerateIdParams) -> ToolResult {
    let nbytes = match params.nbytes {
        None => DEFAULT_ID_BYTES,
        Some(n) if n >= 1 && n as u64 <= MAX_ID_BYTES as u64 => n as usize,
        Some(_) => {
            return McpErrorResponse::new(
                McpErrorCode::InvalidArgument,
                format!("nbytes must be between 1 and {MAX_ID_BYTES}"),
            )
            .into();
        }
    };

    let payload = GenerateIdResponse {
        id: generate_id(nbytes),
    };
    match serde_json::to_string(&payload) {
        Ok(json) => ToolResult::text(json),
        Err(e) => {
            tracing::error!(error = %e, "serialization failed");
            McpErrorResponse::canonical(McpErrorCode::InternalError).into()
        }
    }
}
