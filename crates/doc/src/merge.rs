//! The Merger (§4.2): a pure, associative and commutative binary operation
//! on annotated documents.
//!
//! Mirrors the shape of the teacher's `doc::reduce` module: a flat
//! `thiserror` enum of named failures, a recursive node-at-a-time walk, and
//! `itertools` joins for merging the two sides of an object or array.

use crate::shape::{classification_of, is_annotated, is_classified_array, leaf_source_hash};
use itertools::{EitherOrBoth, Itertools};
use serde_json::{Map, Value};

#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    #[error("cannot merge an empty set of documents")]
    EmptyMerge,
    #[error("documents are incoherent: {0}")]
    Incoherent(&'static str),
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// Resolves leaf source-hash references against the two documents' top-level
/// source maps. A leaf produced by either side can only resolve against its
/// own side's map, but since both are threaded through every recursive call
/// we look in both without needing to track provenance explicitly.
pub(crate) struct SourceMaps<'a> {
    left: &'a Map<String, Value>,
    right: &'a Map<String, Value>,
}

impl<'a> SourceMaps<'a> {
    fn resolve(&self, hash: &str) -> Option<&'a Value> {
        self.left.get(hash).or_else(|| self.right.get(hash))
    }

    /// A source map with a single entry, for merging fragments (e.g.
    /// classified array elements during annotation) that all trace back to
    /// one source stamp.
    pub(crate) fn single(map: &'a Map<String, Value>) -> Self {
        SourceMaps {
            left: map,
            right: map,
        }
    }
}

/// Merges two document fragments (not whole documents — no `$schema`/
/// `classification` coherence check) node-by-node. Exposed for the
/// Annotator's classified-array deduplication, which merges array elements
/// rather than whole documents.
pub(crate) fn merge_fragment(maps: &SourceMaps, a: Value, b: Value) -> Result<Value> {
    merge_node(maps, a, b)
}

/// Merges two whole annotated documents. The caller must ensure `a` and `b`
/// describe the same schema and classification; this function verifies it
/// and fails with `Incoherent` if not.
pub fn merge_documents(a: Value, b: Value) -> Result<Value> {
    let a = a
        .as_object()
        .ok_or(MergeError::Incoherent("document is not an object"))?;
    let b = b
        .as_object()
        .ok_or(MergeError::Incoherent("document is not an object"))?;

    let schema_a = a
        .get("$schema")
        .ok_or(MergeError::Incoherent("missing $schema"))?;
    let schema_b = b
        .get("$schema")
        .ok_or(MergeError::Incoherent("missing $schema"))?;
    if leaf_or_raw(schema_a) != leaf_or_raw(schema_b) {
        return Err(MergeError::Incoherent("mismatched $schema"));
    }

    let classification_a = a
        .get("classification")
        .ok_or(MergeError::Incoherent("missing classification"))?;
    let classification_b = b
        .get("classification")
        .ok_or(MergeError::Incoherent("missing classification"))?;
    if leaf_or_raw(classification_a) != leaf_or_raw(classification_b) {
        return Err(MergeError::Incoherent("mismatched classification"));
    }

    let source_a = a
        .get("source")
        .and_then(Value::as_object)
        .ok_or(MergeError::Incoherent("missing source map"))?;
    let source_b = b
        .get("source")
        .and_then(Value::as_object)
        .ok_or(MergeError::Incoherent("missing source map"))?;

    let maps = SourceMaps {
        left: source_a,
        right: source_b,
    };

    let mut merged_source = source_a.clone();
    for (hash, stamp) in source_b {
        merged_source.entry(hash.clone()).or_insert_with(|| stamp.clone());
    }

    let mut out = Map::new();
    for eob in a.iter().merge_join_by(b.iter(), |x, y| x.0.cmp(y.0)) {
        let (k, merged) = match eob {
            EitherOrBoth::Left((k, v)) => (k, v.clone()),
            EitherOrBoth::Right((k, v)) => (k, v.clone()),
            EitherOrBoth::Both((k, v1), (_, v2)) if k == "source" => (k, v1.clone()),
            EitherOrBoth::Both((k, v1), (_, v2)) => (k, merge_node(&maps, v1.clone(), v2.clone())?),
        };
        if k != "source" {
            out.insert(k.clone(), merged);
        }
    }
    out.insert("source".to_string(), Value::Object(merged_source));

    Ok(Value::Object(out))
}

/// Left-folds `merge_documents` over a non-empty set of annotated documents.
/// This is the reduction referenced by I5 and by Ingestor step 9.
pub fn reduce_all(mut docs: Vec<Value>) -> Result<Value> {
    if docs.is_empty() {
        return Err(MergeError::EmptyMerge);
    }
    let mut acc = docs.remove(0);
    for doc in docs {
        acc = merge_documents(acc, doc)?;
    }
    Ok(acc)
}

fn leaf_or_raw(v: &Value) -> &Value {
    if is_annotated(v) {
        &v["value"]
    } else {
        v
    }
}

fn merge_node(maps: &SourceMaps, a: Value, b: Value) -> Result<Value> {
    if is_annotated(&a) && is_annotated(&b) {
        return merge_leaves(maps, a, b);
    }

    match (a, b) {
        (Value::Object(a), Value::Object(b)) => merge_objects(maps, a, b),
        (Value::Array(a), Value::Array(b)) => merge_classified_arrays(maps, a, b),
        _ => Err(MergeError::Incoherent(
            "mismatched node shapes at the same path",
        )),
    }
}

fn merge_objects(maps: &SourceMaps, a: Map<String, Value>, b: Map<String, Value>) -> Result<Value> {
    let mut out = Map::new();
    for eob in a.iter().merge_join_by(b.iter(), |x, y| x.0.cmp(y.0)) {
        match eob {
            EitherOrBoth::Left((k, v)) | EitherOrBoth::Right((k, v)) => {
                out.insert(k.clone(), v.clone());
            }
            EitherOrBoth::Both((k, v1), (_, v2)) => {
                out.insert(k.clone(), merge_node(maps, v1.clone(), v2.clone())?);
            }
        }
    }
    Ok(Value::Object(out))
}

fn merge_leaves(maps: &SourceMaps, a: Value, b: Value) -> Result<Value> {
    let hash_a = leaf_source_hash(&a).ok_or(MergeError::Incoherent("leaf source is not a hash"))?;
    let hash_b = leaf_source_hash(&b).ok_or(MergeError::Incoherent("leaf source is not a hash"))?;

    let stamp_a = maps
        .resolve(hash_a)
        .ok_or(MergeError::Incoherent("source hash does not resolve"))?;
    let stamp_b = maps
        .resolve(hash_b)
        .ok_or(MergeError::Incoherent("source hash does not resolve"))?;

    let processed_a = stamp_a
        .get("processedAt")
        .and_then(Value::as_str)
        .ok_or(MergeError::Incoherent("source stamp missing processedAt"))?;
    let processed_b = stamp_b
        .get("processedAt")
        .and_then(Value::as_str)
        .ok_or(MergeError::Incoherent("source stamp missing processedAt"))?;

    let a_wins = match processed_a.cmp(processed_b) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => hash_a >= hash_b,
    };

    Ok(if a_wins { a } else { b })
}

fn merge_classified_arrays(
    maps: &SourceMaps,
    a: Vec<Value>,
    b: Vec<Value>,
) -> Result<Value> {
    if !is_classified_array(&a) && !a.is_empty() || !is_classified_array(&b) && !b.is_empty() {
        return Err(MergeError::Incoherent(
            "array merge expects classified arrays",
        ));
    }

    let mut by_key: Vec<(String, Value)> = Vec::with_capacity(a.len() + b.len());
    for element in a {
        let key = classification_key(&element)?;
        by_key.push((key, element));
    }
    for element in b {
        let key = classification_key(&element)?;
        match by_key.iter().position(|(k, _)| k == &key) {
            Some(i) => {
                let (_, existing) = by_key.remove(i);
                by_key.insert(i, (key, merge_node(maps, existing, element)?));
            }
            None => by_key.push((key, element)),
        }
    }

    Ok(Value::Array(by_key.into_iter().map(|(_, v)| v).collect()))
}

fn classification_key(element: &Value) -> Result<String> {
    let classification = classification_of(element)
        .ok_or(MergeError::Incoherent("array element missing classification"))?;
    Ok(crate::canonical::to_canonical_string(classification))
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn stamped(value: Value, hash: &str) -> Value {
        json!({"value": value, "source": hash})
    }

    fn doc(schema: &str, classification: Value, fields: Value, sources: Value) -> Value {
        let mut obj = fields.as_object().unwrap().clone();
        obj.insert("$schema".to_string(), stamped(json!(schema), "s"));
        obj.insert("classification".to_string(), stamped(classification, "s"));
        obj.insert("source".to_string(), sources);
        Value::Object(obj)
    }

    #[test]
    fn later_processed_at_wins_on_overlapping_field() {
        let a = doc(
            "book.v2",
            json!([{"realm": "isbn", "id": "1"}]),
            json!({"title": stamped(json!("Alpha"), "ha")}),
            json!({"ha": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z"}}),
        );
        let b = doc(
            "book.v2",
            json!([{"realm": "isbn", "id": "1"}]),
            json!({"title": stamped(json!("Alpha!"), "hb")}),
            json!({"hb": {"system": "sB", "processedAt": "2020-01-02T00:00:00Z"}}),
        );

        let merged = merge_documents(a, b).unwrap();
        assert_eq!(merged["title"]["value"], json!("Alpha!"));
        assert_eq!(merged["title"]["source"], json!("hb"));
    }

    #[test]
    fn non_overlapping_fields_both_survive() {
        let a = doc(
            "book.v2",
            json!([{"realm": "isbn", "id": "1"}]),
            json!({"title": stamped(json!("Alpha"), "ha")}),
            json!({"ha": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z"}}),
        );
        let b = doc(
            "book.v2",
            json!([{"realm": "isbn", "id": "1"}]),
            json!({"subtitle": stamped(json!("An Introduction"), "hb")}),
            json!({"hb": {"system": "sB", "processedAt": "2020-01-02T00:00:00Z"}}),
        );

        let merged = merge_documents(a, b).unwrap();
        assert_eq!(merged["title"]["value"], json!("Alpha"));
        assert_eq!(merged["subtitle"]["value"], json!("An Introduction"));
    }

    #[test]
    fn mismatched_classification_is_incoherent() {
        let a = doc(
            "book.v2",
            json!([{"realm": "isbn", "id": "1"}]),
            json!({}),
            json!({}),
        );
        let b = doc(
            "book.v2",
            json!([{"realm": "isbn", "id": "2"}]),
            json!({}),
            json!({}),
        );

        assert!(matches!(
            merge_documents(a, b),
            Err(MergeError::Incoherent(_))
        ));
    }

    #[test]
    fn reduce_all_on_empty_set_fails() {
        assert!(matches!(reduce_all(vec![]), Err(MergeError::EmptyMerge)));
    }

    #[test]
    fn merge_is_idempotent() {
        let a = doc(
            "book.v2",
            json!([{"realm": "isbn", "id": "1"}]),
            json!({"title": stamped(json!("Alpha"), "ha")}),
            json!({"ha": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z"}}),
        );
        let merged = merge_documents(a.clone(), a.clone()).unwrap();
        assert_eq!(merged, a);
    }
}
