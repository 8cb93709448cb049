use fixture_shatter::corruption::{shatter, ShatterOptions};
use fixture_shatter::schema::{classify, validate_json, validate_value, SchemaValidationError};
use serde_json::{json, Value};

const USER_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "type": "object",
  "required": ["_id", "username"],
  "properties": {
    "_id": { "type": "string", "minLength": 1 },
    "username": { "type": "string" },
    "rating": { "type": "number" },
    "stats": {
      "type": "object",
      "required": ["questionsPlayed"],
      "properties": {
        "questionsPlayed": { "type": "integer" },
        "buzzRate": { "type": "number" }
      }
    }
  }
}"#;

fn user() -> Value {
    json!({
        "_id": "dev",
        "username": "John Doe",
        "rating": 0.5,
        "stats": {"questionsPlayed": 10, "buzzRate": 0.25}
    })
}

#[test]
fn json_schema_harness_validates_instance() {
    let instance = serde_json::to_string(&user()).unwrap();
    validate_json(USER_SCHEMA, &instance).expect("schema validation failed");
}

#[test]
fn validation_failure_lists_messages() {
    let schema: Value = serde_json::from_str(USER_SCHEMA).unwrap();
    let err = validate_value(&schema, &json!({"_id": 7})).unwrap_err();

    match err {
        SchemaValidationError::ValidationFailed(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unparsable_input_is_a_parse_error() {
    let err = validate_json(USER_SCHEMA, "{not json").unwrap_err();
    assert!(matches!(err, SchemaValidationError::SchemaParse(_)));
}

#[test]
fn classify_flags_required_removals() {
    let schema: Value = serde_json::from_str(USER_SCHEMA).unwrap();
    let Value::Object(doc) = user() else { unreachable!() };
    let options = ShatterOptions::default().depth(-1);

    let verdicts = classify(&schema, shatter(&doc, &options)).unwrap();
    let summary: Vec<(Vec<&str>, bool)> = verdicts
        .iter()
        .map(|v| (v.removed.iter().map(String::as_str).collect(), v.valid))
        .collect();

    assert_eq!(
        summary,
        vec![
            (vec!["_id"], false),
            (vec!["username"], false),
            (vec!["rating"], true),
            (vec!["stats", "questionsPlayed"], false),
            (vec!["stats", "buzzRate"], true),
            (vec!["stats"], true),
        ]
    );
    assert!(verdicts.iter().filter(|v| v.valid).all(|v| v.errors.is_empty()));
    assert!(verdicts.iter().filter(|v| !v.valid).all(|v| !v.errors.is_empty()));
}

#[test]
fn classify_rejects_uncompilable_schema() {
    let schema = json!({"type": "no-such-type"});
    let Value::Object(doc) = user() else { unreachable!() };
    let options = ShatterOptions::default();

    let err = classify(&schema, shatter(&doc, &options)).unwrap_err();
    assert!(matches!(err, SchemaValidationError::SchemaCompile(_)));
}
