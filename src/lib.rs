//! Corrupted-fixture generation for negative-path API tests.
//!
//! [`corruption::shatter`] yields every variant of a JSON document that is
//! missing exactly one field, optionally reaching into nested objects and
//! narrowed by `affected` / `unaffected` filters. Around it sit fixture
//! helpers (random ids, status matching), JSON Schema checks and OpenAPI
//! component lookup, all of which are also served as `fixtures.*` tools over
//! JSON-RPC 2.0 stdio by the `fixture-shatter` binary.

pub mod config;
pub mod corruption;
pub mod fixtures;
pub mod handlers;
pub mod openapi;
pub mod protocol;
pub mod server;

pub mod schema;
