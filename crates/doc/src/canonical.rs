//! Deterministic serialization used everywhere a document needs to become a
//! stable byte string: source hashing and key extraction both go through
//! this module so that the two notions of "the same bytes" never diverge.
//!
//! This relies on `serde_json::Map` *not* enabling the `preserve_order`
//! feature, so that serializing a `Value::Object` always walks its fields in
//! sorted-key (`BTreeMap`) order. Do not add `preserve_order` to the
//! workspace's `serde_json` dependency; doing so silently breaks every hash
//! and key derived here.

use serde_json::Value;

/// Serializes `value` with sorted object keys and no insignificant
/// whitespace. Arrays keep their given order; only object key order is
/// normalized.
pub fn to_canonical_string(value: &Value) -> String {
    serde_json::to_string(value).expect("Value serialization is infallible")
}
