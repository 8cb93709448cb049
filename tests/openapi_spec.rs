use std::io::Write;

use fixture_shatter::openapi::{ApiSpec, SpecError};
use fixture_shatter::schema::validate_value;
use serde_json::{json, Value};

fn quiz_api() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {"title": "Quiz API", "version": "1.0.0"},
        "paths": {},
        "components": {
            "schemas": {
                "User": {
                    "type": "object",
                    "required": ["_id", "username", "stats"],
                    "properties": {
                        "_id": {"type": "string"},
                        "username": {"type": "string"},
                        "stats": {"$ref": "#/components/schemas/Stats"}
                    },
                    "examples": [
                        {"_id": "dev", "username": "John Doe", "stats": {"played": 3}},
                        {"_id": "other", "username": "Jane Doe", "stats": {"played": 0}}
                    ]
                },
                "Stats": {
                    "type": "object",
                    "required": ["played"],
                    "properties": {"played": {"type": "integer"}}
                },
                "Node": {
                    "type": "object",
                    "properties": {"next": {"$ref": "#/components/schemas/Node"}}
                },
                "Audio": {
                    "type": "object",
                    "example": {"vtt": "WEBVTT"}
                },
                "Broken": {
                    "type": "object",
                    "properties": {"x": {"$ref": "other.json#/Thing"}}
                }
            }
        }
    })
}

#[test]
fn component_schema_inlines_references() {
    let spec = ApiSpec::from_value(quiz_api());
    let schema = spec.component_schema("User").unwrap();

    assert_eq!(
        schema["properties"]["stats"],
        json!({
            "type": "object",
            "required": ["played"],
            "properties": {"played": {"type": "integer"}}
        })
    );

    let example = spec.component_example("User").unwrap();
    validate_value(&schema, &example).expect("first example must satisfy its schema");
    validate_value(&schema, &json!({"_id": "dev", "username": "x", "stats": {}}))
        .expect_err("nested required field comes from the inlined reference");
}

#[test]
fn component_example_prefers_first_of_examples() {
    let spec = ApiSpec::from_value(quiz_api());
    assert_eq!(spec.component_example("User").unwrap()["_id"], json!("dev"));
    assert_eq!(spec.component_example("Audio").unwrap(), json!({"vtt": "WEBVTT"}));
    assert!(matches!(
        spec.component_example("Stats"),
        Err(SpecError::ExampleMissing(name)) if name == "Stats"
    ));
}

#[test]
fn missing_component_is_reported() {
    let spec = ApiSpec::from_value(quiz_api());
    assert!(matches!(
        spec.component_schema("Question"),
        Err(SpecError::ComponentMissing(name)) if name == "Question"
    ));
}

#[test]
fn cyclic_references_are_rejected() {
    let spec = ApiSpec::from_value(quiz_api());
    assert!(matches!(
        spec.component_schema("Node"),
        Err(SpecError::CyclicRef(name)) if name == "Node"
    ));
}

#[test]
fn external_references_are_rejected() {
    let spec = ApiSpec::from_value(quiz_api());
    assert!(matches!(
        spec.component_schema("Broken"),
        Err(SpecError::UnresolvedRef(reference)) if reference == "other.json#/Thing"
    ));
}

#[test]
fn loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&quiz_api()).unwrap().as_bytes())
        .unwrap();

    let spec = ApiSpec::load(file.path()).unwrap();
    assert_eq!(spec.api()["info"]["title"], json!("Quiz API"));

    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(
        ApiSpec::load(&tmp.path().join("missing.json")),
        Err(SpecError::Io(_))
    ));

    let garbage = tmp.path().join("garbage.json");
    std::fs::write(&garbage, "openapi: 3.0.3").unwrap();
    assert!(matches!(ApiSpec::load(&garbage), Err(SpecError::Parse(_))));
}

#[test]
fn escaped_reference_names_resolve() {
    let api = ApiSpec::from_value(json!({
        "components": {
            "schemas": {
                "Quiz": {
                    "type": "object",
                    "properties": {
                        "round": {"$ref": "#/components/schemas/rounds~1Round"},
                        "score": {"$ref": "#/components/schemas/score~0v2"}
                    }
                },
                "rounds/Round": {"type": "integer"},
                "score~v2": {"type": "number"}
            }
        }
    }));

    let schema = api.component_schema("Quiz").unwrap();
    assert_eq!(schema["properties"]["round"], json!({"type": "integer"}));
    assert_eq!(schema["properties"]["score"], json!({"type": "number"}));
}
