//! Shape predicates shared by the Annotator and the Merger: recognizing an
//! already-annotated node and recognizing a classified array, per §3's
//! definitions.

use serde_json::Value;

/// A node is annotated iff it is an object with exactly two fields named
/// `value` and `source`.
pub fn is_annotated(node: &Value) -> bool {
    match node.as_object() {
        Some(map) => map.len() == 2 && map.contains_key("value") && map.contains_key("source"),
        None => false,
    }
}

pub fn leaf_value(node: &Value) -> &Value {
    &node["value"]
}

pub fn leaf_source_hash(node: &Value) -> Option<&str> {
    node["source"].as_str()
}

/// The `classification` field of an array element, whether the element is
/// still raw or has already been annotated (in which case the field lives
/// one level down, under `value`).
pub fn classification_of(element: &Value) -> Option<&Value> {
    if is_annotated(element) {
        leaf_value(element).get("classification")
    } else {
        element.get("classification")
    }
}

/// An array is classified if at least one element carries a `classification`
/// field; a fully non-classified array has none. A mix of the two is a
/// malformed classified array, surfaced by the caller as `BadClassification`.
pub fn is_classified_array(elements: &[Value]) -> bool {
    elements.iter().any(|e| classification_of(e).is_some())
}
