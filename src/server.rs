use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

use crate::config::ServerConfig;
use crate::handlers;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// Maximum bytes per JSON-RPC message (1 MiB).
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Tool server that communicates over stdio using newline-delimited JSON-RPC 2.0.
pub struct ShatterServer {
    config: ServerConfig,
    initialized: bool,
}

impl ShatterServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            initialized: false,
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut raw = Vec::new();

        tracing::info!(
            max_variants = self.config.max_variants,
            max_output_bytes = self.config.max_output_bytes,
            timeout_secs = self.config.tool_timeout.as_secs(),
            api_spec = ?self.config.api_spec,
            "serving on stdio"
        );

        loop {
            match read_message(&mut reader, &mut raw).await? {
                Incoming::Closed => break,
                Incoming::Message => {}
                Incoming::TooLarge(bytes) => {
                    tracing::warn!(bytes, limit = MAX_MESSAGE_BYTES, "message too large");
                    write_response(
                        &mut stdout,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    ).await?;
                    continue;
                }
            }

            let trimmed = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim(),
                Err(_) => {
                    write_response(
                        &mut stdout,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    ).await?;
                    continue;
                }
            };

            if trimmed.is_empty() {
                continue;
            }

            let req: JsonRpcRequest = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "parse error");
                    write_response(
                        &mut stdout,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    ).await?;
                    continue;
                }
            };

            if req.jsonrpc != "2.0" {
                write_response(
                    &mut stdout,
                    &JsonRpcResponse::error(req.id.clone(), JsonRpcError::invalid_request()),
                ).await?;
                continue;
            }

            // Only `initialize` is allowed before the handshake completes
            if !self.initialized && req.method != "initialize" {
                if req.id.is_none() {
                    continue;
                }
                write_response(
                    &mut stdout,
                    &JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_request_with("Server not initialized"),
                    ),
                ).await?;
                continue;
            }

            if let Some(resp) = handlers::dispatch(&req, &self.config).await {
                write_response(&mut stdout, &resp).await?;
            }

            if req.method == "initialize" {
                self.initialized = true;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }
}

enum Incoming {
    Closed,
    /// `raw` holds one line of at most `MAX_MESSAGE_BYTES`.
    Message,
    /// An oversized line was skipped; carries its length in bytes.
    TooLarge(usize),
}

/// Read one newline-delimited message into `raw`, buffering no more than
/// `MAX_MESSAGE_BYTES + 1` bytes. The rest of an oversized line is drained
/// from `reader` without being kept.
async fn read_message<R>(reader: &mut R, raw: &mut Vec<u8>) -> std::io::Result<Incoming>
where
    R: AsyncBufRead + Unpin,
{
    raw.clear();
    let n = (&mut *reader)
        .take(MAX_MESSAGE_BYTES as u64 + 1)
        .read_until(b'\n', raw)
        .await?;
    if n == 0 {
        return Ok(Incoming::Closed);
    }
    if n <= MAX_MESSAGE_BYTES {
        return Ok(Incoming::Message);
    }

    let mut skipped = n;
    if raw.last() != Some(&b'\n') {
        skipped += skip_line(reader).await?;
    }
    raw.clear();
    Ok(Incoming::TooLarge(skipped))
}

/// Consume input up to and including the next newline (or EOF).
async fn skip_line<R>(reader: &mut R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(skipped);
        }
        let (used, done) = match buf.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (buf.len(), false),
        };
        reader.consume(used);
        skipped += used;
        if done {
            return Ok(skipped);
        }
    }
}

async fn write_response(
    stdout: &mut tokio::io::Stdout,
    resp: &JsonRpcResponse,
) -> Result<(), Box<dyn std::error::Error>> {
    let out = serde_json::to_string(resp)?;
    stdout.write_all(out.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
