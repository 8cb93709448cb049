//! Read-only access to an OpenAPI document's component schemas.
//!
//! Backend contracts publish their models under `components.schemas`; tests
//! take a model's first example as a known-good base fixture and its schema
//! (with local `$ref`s inlined) as the oracle for corrupted variants.

use std::path::Path;

use serde_json::Value;

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("Cannot read API spec: {0}")]
    Io(#[from] std::io::Error),
    #[error("API spec is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Component schema not found: {0}")]
    ComponentMissing(String),
    #[error("Component schema {0} has no example")]
    ExampleMissing(String),
    #[error("Unresolvable reference: {0}")]
    UnresolvedRef(String),
    #[error("Cyclic reference through component schema {0}")]
    CyclicRef(String),
}

/// A parsed OpenAPI document.
#[derive(Debug, Clone)]
pub struct ApiSpec {
    api: Value,
}

impl ApiSpec {
    pub fn from_value(api: Value) -> Self {
        Self { api }
    }

    /// Load a JSON OpenAPI document from disk.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let file = std::fs::File::open(path)?;
        let api = serde_json::from_reader(file)?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &Value {
        &self.api
    }

    /// `components.schemas.<name>` with every local schema reference inlined.
    pub fn component_schema(&self, name: &str) -> Result<Value, SpecError> {
        let raw = self.raw_component(name)?;
        let mut visiting = vec![name.to_string()];
        self.inline_refs(raw, &mut visiting)
    }

    /// The component's first `examples` entry, falling back to `example`.
    pub fn component_example(&self, name: &str) -> Result<Value, SpecError> {
        let raw = self.raw_component(name)?;
        raw.get("examples")
            .and_then(|examples| examples.get(0))
            .or_else(|| raw.get("example"))
            .cloned()
            .ok_or_else(|| SpecError::ExampleMissing(name.to_string()))
    }

    fn raw_component(&self, name: &str) -> Result<&Value, SpecError> {
        let pointer = format!("/components/schemas/{}", escape_pointer(name));
        self.api
            .pointer(&pointer)
            .ok_or_else(|| SpecError::ComponentMissing(name.to_string()))
    }

    fn inline_refs(&self, value: &Value, visiting: &mut Vec<String>) -> Result<Value, SpecError> {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    let name = reference
                        .strip_prefix(SCHEMA_REF_PREFIX)
                        .map(unescape_pointer)
                        .ok_or_else(|| SpecError::UnresolvedRef(reference.clone()))?;
                    if visiting.contains(&name) {
                        return Err(SpecError::CyclicRef(name));
                    }
                    let target = self
                        .raw_component(&name)
                        .map_err(|_| SpecError::UnresolvedRef(reference.clone()))?;

                    visiting.push(name);
                    let resolved = self.inline_refs(target, visiting)?;
                    visiting.pop();
                    return Ok(resolved);
                }

                map.iter()
                    .map(|(k, v)| Ok((k.clone(), self.inline_refs(v, visiting)?)))
                    .collect::<Result<serde_json::Map<_, _>, SpecError>>()
                    .map(Value::Object)
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.inline_refs(item, visiting))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }
}

/// RFC 6901 escaping for a single pointer segment.
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Inverse of [`escape_pointer`]; `~1` is decoded before `~0`.
fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
