//! Shared pieces of the restriction wire schemas.

use jsonschema::{Draft, JSONSchema};
use serde_json::{Value, json};

/// Normalized project name: lowercase alphanumeric runs joined by single
/// hyphens.
pub(super) const PROJECT_NAME_PATTERN: &str = "^[a-z0-9]+(-[a-z0-9]+)*$";

/// Lowercase hyphenated UUID. Uppercase hex digits are rejected.
pub(super) const UUID_PATTERN: &str =
    "^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$";

/// Compile an embedded schema.
pub(super) fn compile(schema: Value) -> JSONSchema {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("embedded restriction schema must compile")
}

/// A compact caveat: an array of exactly `1 + fields.len()` items whose
/// first item is the integer `tag`.
pub(super) fn tagged(tag: u64, fields: &[Value]) -> Value {
    let mut items = vec![json!({ "type": "integer", "const": tag })];
    items.extend_from_slice(fields);
    let size = items.len();

    json!({
        "type": "array",
        "items": items,
        "additionalItems": false,
        "minItems": size,
        "maxItems": size,
    })
}

pub(super) fn string_matching(pattern: &str) -> Value {
    json!({ "type": "string", "pattern": pattern })
}

pub(super) fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}
