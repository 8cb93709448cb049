use serde::Serialize;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::corruption::Variant;
use crate::protocol::{ClassifyParams, McpErrorCode, McpErrorResponse, ToolResult};
use crate::schema::{classify, ClassifiedVariant, SchemaValidationError};

use super::shatter::{collect_variants, prepare, render, spec_error, Budget, Prepared};

#[derive(Debug, Serialize)]
struct ClassifyResponse {
    count: usize,
    /// Variants the schema rejects.
    rejected: usize,
    variants: Vec<ClassifiedVariant>,
}

/// Handle a `fixtures.classify` tool call.
///
/// Generates the same variants as `fixtures.shatter` and runs each one
/// through a JSON Schema: either the `schema` argument or, for component
/// requests, the component's own schema with references inlined.
pub async fn handle(params: ClassifyParams, config: &ServerConfig) -> ToolResult {
    let budget = Budget::new(config);
    let owned = config.clone();
    let task = tokio::task::spawn_blocking(move || {
        let explicit_schema = params.schema;
        let prepared = prepare(params.shatter, &owned)?;
        let schema = schema_for(explicit_schema, &prepared)?;
        let variants = collect_variants(&prepared, &budget)?;
        let classified = judge(&schema, variants)?;
        render(&ClassifyResponse {
            count: classified.len(),
            rejected: classified.iter().filter(|v| !v.valid).count(),
            variants: classified,
        })
    });

    super::run_bounded(task, config).await
}

fn schema_for(explicit: Option<Value>, prepared: &Prepared) -> Result<Value, McpErrorResponse> {
    match (explicit, &prepared.component) {
        (Some(schema), _) => Ok(schema),
        (None, Some((spec, name))) => spec.component_schema(name).map_err(spec_error),
        (None, None) => Err(McpErrorResponse::new(
            McpErrorCode::InvalidArgument,
            "Missing schema (required unless component is given)",
        )),
    }
}

fn judge(
    schema: &Value,
    variants: Vec<Variant>,
) -> Result<Vec<ClassifiedVariant>, McpErrorResponse> {
    classify(schema, variants).map_err(|e| match e {
        SchemaValidationError::SchemaCompile(msg) => {
            McpErrorResponse::new(McpErrorCode::SchemaInvalid, format!("Schema compile error: {msg}"))
        }
        other => {
            tracing::error!(error = %other, "unexpected schema failure");
            McpErrorResponse::canonical(McpErrorCode::InternalError)
        }
    })
}
