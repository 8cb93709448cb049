use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for tool operations (30 seconds).
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Default cap on variants returned by a single tool call.
const DEFAULT_MAX_VARIANTS: usize = 10_000;

/// Default cap on serialized variant bytes per tool call (64 MiB).
const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024 * 1024;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tool_timeout: Duration,
    pub max_variants: usize,
    pub max_output_bytes: usize,
    pub api_spec: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment.
    ///
    /// - `SHATTER_TOOL_TIMEOUT_SECS` (optional, default 30): max seconds per tool call
    /// - `SHATTER_MAX_VARIANTS` (optional, default 10000): max variants per tool call
    /// - `SHATTER_MAX_OUTPUT_BYTES` (optional, default 64 MiB): max serialized variant bytes per tool call
    /// - `SHATTER_API_SPEC` (optional): OpenAPI JSON document for `component` lookups
    pub fn from_env() -> Result<Self, String> {
        let tool_timeout_secs = match std::env::var("SHATTER_TOOL_TIMEOUT_SECS") {
            Ok(val) => val
                .parse::<u64>()
                .map_err(|_| "SHATTER_TOOL_TIMEOUT_SECS must be a positive integer".to_string())?,
            Err(_) => DEFAULT_TOOL_TIMEOUT_SECS,
        };

        let max_variants = match std::env::var("SHATTER_MAX_VARIANTS") {
            Ok(val) => match val.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err("SHATTER_MAX_VARIANTS must be a positive integer".to_string()),
            },
            Err(_) => DEFAULT_MAX_VARIANTS,
        };

        let max_output_bytes = match std::env::var("SHATTER_MAX_OUTPUT_BYTES") {
            Ok(val) => match val.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err("SHATTER_MAX_OUTPUT_BYTES must be a positive integer".to_string()),
            },
            Err(_) => DEFAULT_MAX_OUTPUT_BYTES,
        };

        let api_spec = std::env::var_os("SHATTER_API_SPEC").map(PathBuf::from);

        Ok(Self {
            tool_timeout: Duration::from_secs(tool_timeout_secs),
            max_variants,
            max_output_bytes,
            api_spec,
        })
    }
}
