use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ServerConfig;
use crate::corruption::{shatter, ShatterFilter, ShatterOptions, Variant};
use crate::fixtures::attach_id;
use crate::openapi::{ApiSpec, SpecError};
use crate::protocol::{McpErrorCode, McpErrorResponse, ShatterParams, ToolResult};

#[derive(Debug, Serialize)]
struct ShatterResponse {
    count: usize,
    variants: Vec<Variant>,
}

/// A generator request with its base document and filters resolved.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    pub document: Map<String, Value>,
    pub options: ShatterOptions,
    pub attach_id: Option<String>,
    /// Loaded when the base document came from an OpenAPI component.
    pub component: Option<(ApiSpec, String)>,
}

/// Handle a `fixtures.shatter` tool call.
pub async fn handle(params: ShatterParams, config: &ServerConfig) -> ToolResult {
    let budget = Budget::new(config);
    let owned = config.clone();
    let task = tokio::task::spawn_blocking(move || {
        let prepared = prepare(params, &owned)?;
        let variants = collect_variants(&prepared, &budget)?;
        render(&ShatterResponse {
            count: variants.len(),
            variants,
        })
    });

    super::run_bounded(task, config).await
}

/// Limits a blocking generator run must stay within.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    max_variants: usize,
    max_output_bytes: usize,
    /// `None` when the timeout is too large to represent.
    deadline: Option<Instant>,
}

impl Budget {
    pub(crate) fn new(config: &ServerConfig) -> Self {
        Self {
            max_variants: config.max_variants,
            max_output_bytes: config.max_output_bytes,
            deadline: Instant::now().checked_add(config.tool_timeout),
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Resolve the base document, filters and depth of a generator request.
pub(crate) fn prepare(params: ShatterParams, config: &ServerConfig) -> Result<Prepared, McpErrorResponse> {
    let (document, component) = match (params.document, params.component) {
        (Some(_), Some(_)) => {
            return Err(McpErrorResponse::new(
                McpErrorCode::InvalidArgument,
                "Provide either document or component, not both",
            ));
        }
        (Some(Value::Object(map)), None) => (map, None),
        (Some(_), None) => {
            return Err(McpErrorResponse::new(
                McpErrorCode::InvalidDocument,
                "Document must be a JSON object",
            ));
        }
        (None, Some(name)) => {
            let spec = load_spec(config)?;
            let example = spec.component_example(&name).map_err(spec_error)?;
            let Value::Object(map) = example else {
                return Err(McpErrorResponse::new(
                    McpErrorCode::InvalidDocument,
                    format!("Example of component {name} is not a JSON object"),
                ));
            };
            (map, Some((spec, name)))
        }
        (None, None) => {
            return Err(McpErrorResponse::new(
                McpErrorCode::InvalidDocument,
                "Missing document or component",
            ));
        }
    };

    let options = ShatterOptions::default()
        .depth(params.depth)
        .affected(parse_filter("affected", params.affected, ShatterFilter::AllowAll)?)
        .unaffected(parse_filter("unaffected", params.unaffected, ShatterFilter::DenyAll)?);

    if matches!(params.attach_id.as_deref(), Some("")) {
        return Err(McpErrorResponse::new(
            McpErrorCode::InvalidArgument,
            "attach_id must be a non-empty field name",
        ));
    }

    Ok(Prepared {
        document,
        options,
        attach_id: params.attach_id,
        component,
    })
}

/// Run the generator within `budget`: at most `max_variants` variants, at
/// most `max_output_bytes` of serialized variants, and never past the
/// deadline. The blocking task outlives a timed-out call, so the deadline is
/// checked here.
pub(crate) fn collect_variants(
    prepared: &Prepared,
    budget: &Budget,
) -> Result<Vec<Variant>, McpErrorResponse> {
    let mut variants = Vec::new();
    let mut output = ByteCount(0);

    for mut variant in shatter(&prepared.document, &prepared.options) {
        if budget.expired() {
            tracing::warn!(generated = variants.len(), "deadline passed, abandoning generation");
            return Err(McpErrorResponse::new(
                McpErrorCode::InternalError,
                "Operation timed out",
            ));
        }
        if variants.len() == budget.max_variants {
            tracing::warn!(max_variants = budget.max_variants, "variant limit exceeded");
            return Err(McpErrorResponse::new(
                McpErrorCode::VariantLimitExceeded,
                format!("Document produces more than {} variants", budget.max_variants),
            ));
        }
        if let Some(field) = &prepared.attach_id {
            attach_id(&mut variant.document, field);
        }

        serde_json::to_writer(&mut output, &variant).map_err(|e| {
            tracing::error!(error = %e, "serialization failed");
            McpErrorResponse::canonical(McpErrorCode::InternalError)
        })?;
        if output.0 > budget.max_output_bytes {
            tracing::warn!(
                max_output_bytes = budget.max_output_bytes,
                generated = variants.len(),
                "output limit exceeded"
            );
            return Err(McpErrorResponse::new(
                McpErrorCode::VariantLimitExceeded,
                format!("Variants exceed {} bytes of output", budget.max_output_bytes),
            ));
        }
        variants.push(variant);
    }

    tracing::debug!(count = variants.len(), bytes = output.0, "variants generated");
    Ok(variants)
}

/// Counts serialized bytes without keeping them.
struct ByteCount(usize);

impl std::io::Write for ByteCount {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub(crate) fn render<T: Serialize>(payload: &T) -> Result<String, McpErrorResponse> {
    let json = serde_json::to_string(payload).map_err(|e| {
        tracing::error!(error = %e, "serialization failed");
        McpErrorResponse::canonical(McpErrorCode::InternalError)
    })?;
    Ok(format!("{json}\n"))
}

pub(crate) fn load_spec(config: &ServerConfig) -> Result<ApiSpec, McpErrorResponse> {
    let path = config
        .api_spec
        .as_ref()
        .ok_or_else(|| McpErrorResponse::canonical(McpErrorCode::SpecMissing))?;
    ApiSpec::load(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "cannot load API spec");
        spec_error(e)
    })
}

pub(crate) fn spec_error(err: SpecError) -> McpErrorResponse {
    let code = match &err {
        SpecError::Io(_) => McpErrorCode::IoError,
        SpecError::Parse(_) => McpErrorCode::SpecInvalid,
        SpecError::ComponentMissing(_) => McpErrorCode::ComponentMissing,
        SpecError::ExampleMissing(_) => McpErrorCode::InvalidDocument,
        SpecError::UnresolvedRef(_) | SpecError::CyclicRef(_) => McpErrorCode::SchemaInvalid,
    };
    McpErrorResponse::new(code, err.to_string())
}

fn parse_filter(
    name: &str,
    raw: Option<Value>,
    default: ShatterFilter,
) -> Result<ShatterFilter, McpErrorResponse> {
    match raw {
        None => Ok(default),
        Some(value) => ShatterFilter::from_value(&value).map_err(|e| {
            McpErrorResponse::new(McpErrorCode::InvalidFilter, format!("Invalid {name} filter: {e}"))
        }),
    }
}
