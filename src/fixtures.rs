use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde_json::{Map, Value};

/// Random bytes behind a generated id; encodes to 43 characters.
pub const DEFAULT_ID_BYTES: usize = 32;

/// Random URL-safe token suitable as a document `_id`.
pub fn generate_id(nbytes: usize) -> String {
    let mut bytes = vec![0u8; nbytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Set `field` on `document` to a fresh id and return the id.
pub fn attach_id(document: &mut Map<String, Value>, field: &str) -> String {
    let id = generate_id(DEFAULT_ID_BYTES);
    document.insert(field.to_string(), Value::String(id.clone()));
    id
}

/// Give every document its own fresh id under `field`.
pub fn attach_ids<I>(documents: I, field: &str) -> impl Iterator<Item = Map<String, Value>>
where
    I: IntoIterator<Item = Map<String, Value>>,
{
    let field = field.to_string();
    documents.into_iter().map(move |mut document| {
        attach_id(&mut document, &field);
        document
    })
}

/// Whether a status line such as `"404 NOT FOUND"` carries `expected`.
pub fn match_status(expected: u16, actual: &str) -> bool {
    let code = expected.to_string();
    actual == code || actual.contains(&code)
}
