use jsonschema::validator_for;
use serde::Serialize;
use serde_json::Value;

use crate::corruption::Variant;

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema parse error: {0}")]
    SchemaParse(#[from] serde_json::Error),
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("Instance validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
}

/// A variant together with the schema's verdict on it.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedVariant {
    pub removed: Vec<String>,
    pub document: Value,
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Validate a JSON instance against a JSON Schema (draft 2020-12).
/// Returns Ok(()) if valid, Err otherwise.
pub fn validate_json(schema_str: &str, instance_str: &str) -> Result<(), SchemaValidationError> {
    let schema_json: Value = serde_json::from_str(schema_str)?;
    let instance_json: Value = serde_json::from_str(instance_str)?;
    validate_value(&schema_json, &instance_json)
}

/// Same as [`validate_json`] for already parsed values. Collects every
/// validator message on failure.
pub fn validate_value(schema: &Value, instance: &Value) -> Result<(), SchemaValidationError> {
    let validator = validator_for(schema)
        .map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;

    let errors: Vec<String> = validator.iter_errors(instance).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaValidationError::ValidationFailed(errors))
    }
}

/// Run every variant through `schema`, compiling it once.
///
/// Variants the schema still accepts point at fields the schema does not
/// require; rejected ones are the inputs an endpoint must refuse.
pub fn classify<I>(schema: &Value, variants: I) -> Result<Vec<ClassifiedVariant>, SchemaValidationError>
where
    I: IntoIterator<Item = Variant>,
{
    let validator = validator_for(schema)
        .map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;

    Ok(variants
        .into_iter()
        .map(|variant| {
            let document = Value::Object(variant.document);
            let errors: Vec<String> = validator.iter_errors(&document).map(|e| e.to_string()).collect();
            ClassifiedVariant {
                removed: variant.removed,
                document,
                valid: errors.is_empty(),
                errors,
            }
        })
        .collect())
}
