use jsonschema::validator_for;
use serde_json::Value;

use fixture_shatter::protocol::{JsonRpcError, McpErrorCode, McpErrorResponse, ToolResult};

// Schema (v0), frozen
const ERROR_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "$id": "https://fixture-shatter.dev/schemas/error-v0.json",
  "title": "Tool Error Response v0",
  "type": "object",
  "required": ["error"],
  "additionalProperties": false,
  "properties": {
    "error": {
      "type": "object",
      "required": ["code", "message"],
      "additionalProperties": false,
      "properties": {
        "code": {
          "type": "string",
          "enum": [
            "invalid_document",
            "invalid_filter",
            "invalid_argument",
            "variant_limit_exceeded",
            "schema_invalid",
            "spec_missing",
            "spec_invalid",
            "component_missing",
            "io_error",
            "internal_error"
          ]
        },
        "message": {
          "type": "string",
          "minLength": 1
        }
      }
    }
  }
}"#;

const ALL_CODES: [McpErrorCode; 10] = [
    McpErrorCode::InvalidDocument,
    McpErrorCode::InvalidFilter,
    McpErrorCode::InvalidArgument,
    McpErrorCode::VariantLimitExceeded,
    McpErrorCode::SchemaInvalid,
    McpErrorCode::SpecMissing,
    McpErrorCode::SpecInvalid,
    McpErrorCode::ComponentMissing,
    McpErrorCode::IoError,
    McpErrorCode::InternalError,
];

#[test]
fn golden_error_schema_validation() {
    let response = McpErrorResponse::new(McpErrorCode::InvalidFilter, "Filter is invalid");

    let json_str = serde_json::to_string_pretty(&response).unwrap();
    let json_value: Value = serde_json::from_str(&json_str).unwrap();

    let schema_json: Value = serde_json::from_str(ERROR_SCHEMA).unwrap();
    let validator = validator_for(&schema_json).unwrap();
    assert!(validator.is_valid(&json_value), "error JSON must satisfy v0 schema");

    // Golden snapshot (byte-identical, stable)
    let expected = r#"{
  "error": {
    "code": "invalid_filter",
    "message": "Filter is invalid"
  }
}"#;

    assert_eq!(json_str.trim(), expected.trim(), "error JSON snapshot mismatch");
}

#[test]
fn every_canonical_error_satisfies_schema() {
    let schema_json: Value = serde_json::from_str(ERROR_SCHEMA).unwrap();
    let validator = validator_for(&schema_json).unwrap();

    for code in ALL_CODES {
        let value = serde_json::to_value(McpErrorResponse::canonical(code.clone())).unwrap();
        assert!(validator.is_valid(&value), "canonical {code:?} violates schema: {value}");
    }
}

#[test]
fn error_converts_to_tool_result_and_json_rpc_error() {
    let response = McpErrorResponse::canonical(McpErrorCode::VariantLimitExceeded);

    let tool_result: ToolResult = response.clone().into();
    assert!(tool_result.is_error);
    let text = &tool_result.content[0].text;
    assert!(text.ends_with('\n'));
    let parsed: McpErrorResponse = serde_json::from_str(text.trim_end()).unwrap();
    assert_eq!(parsed, response);

    let rpc: JsonRpcError = response.into();
    assert_eq!(rpc.code, -32602);
    assert_eq!(rpc.message, "Too many variants");
    assert_eq!(rpc.data.unwrap()["error"]["code"], "variant_limit_exceeded");

    let server_side: JsonRpcError = McpErrorResponse::canonical(McpErrorCode::IoError).into();
    assert_eq!(server_side.code, -32603);
}
