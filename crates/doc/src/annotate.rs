//! The Annotator (§4.1): rewrites a raw document so every leaf carries
//! provenance.

use crate::merge::{merge_fragment, MergeError, SourceMaps};
use crate::shape::{classification_of, is_annotated, is_classified_array};
use crate::source_hash::source_hash;
use serde_json::{Map, Value};

#[derive(thiserror::Error, Debug)]
pub enum AnnotateError {
    #[error("document is missing a top-level `source` object")]
    MissingSource,
    #[error("document is not an object")]
    NotAnObject,
    #[error("classified array element is missing its `classification` field")]
    BadClassification,
    #[error("while deduplicating classified array elements: {0}")]
    Dedup(#[source] MergeError),
}

pub type Result<T> = std::result::Result<T, AnnotateError>;

/// Rewrites `raw` into an annotated document (§3 "Annotated document").
pub fn annotate(raw: Value) -> Result<Value> {
    let mut fields = match raw {
        Value::Object(map) => map,
        _ => return Err(AnnotateError::NotAnObject),
    };

    let source = fields.remove("source").ok_or(AnnotateError::MissingSource)?;
    let hash = source_hash(&source);

    let mut source_map = Map::with_capacity(1);
    source_map.insert(hash.clone(), source.clone());

    let had_single_field = fields.len() == 1;
    let mut any_stamped = false;
    let mut rewritten = Map::with_capacity(fields.len());
    for (key, value) in fields {
        rewritten.insert(
            key,
            annotate_node(value, &hash, &source_map, &mut any_stamped)?,
        );
    }

    if had_single_field || any_stamped {
        rewritten.insert("source".to_string(), Value::Object(source_map));
    } else {
        rewritten.insert("source".to_string(), source);
    }

    Ok(Value::Object(rewritten))
}

fn annotate_node(
    node: Value,
    hash: &str,
    source_map: &Map<String, Value>,
    any_stamped: &mut bool,
) -> Result<Value> {
    if is_annotated(&node) {
        return Ok(node);
    }

    match node {
        Value::Object(map) => {
            let mut rewritten = Map::with_capacity(map.len());
            for (key, value) in map {
                rewritten.insert(key, annotate_node(value, hash, source_map, any_stamped)?);
            }
            Ok(Value::Object(rewritten))
        }
        Value::Array(elements) => {
            if is_classified_array(&elements) {
                let mut rewritten = Vec::with_capacity(elements.len());
                for element in elements {
                    rewritten.push(annotate_node(element, hash, source_map, any_stamped)?);
                }
                dedup_classified(rewritten, source_map)
            } else {
                *any_stamped = true;
                Ok(stamp(Value::Array(elements), hash))
            }
        }
        leaf => {
            *any_stamped = true;
            Ok(stamp(leaf, hash))
        }
    }
}

fn stamp(value: Value, hash: &str) -> Value {
    serde_json::json!({ "value": value, "source": hash })
}

/// Merges elements of a classified array that share a classification,
/// keeping first-seen order among the surviving keys.
fn dedup_classified(elements: Vec<Value>, source_map: &Map<String, Value>) -> Result<Value> {
    let maps = SourceMaps::single(source_map);
    let mut by_key: Vec<(String, Value)> = Vec::with_capacity(elements.len());
    for element in elements {
        let classification =
            classification_of(&element).ok_or(AnnotateError::BadClassification)?;
        let key = crate::canonical::to_canonical_string(classification);

        match by_key.iter().position(|(k, _)| k == &key) {
            Some(i) => {
                let (_, existing) = by_key.remove(i);
                let merged =
                    merge_fragment(&maps, existing, element).map_err(AnnotateError::Dedup)?;
                by_key.insert(i, (key, merged));
            }
            None => by_key.push((key, element)),
        }
    }
    Ok(Value::Array(by_key.into_iter().map(|(_, v)| v).collect()))
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_source_fails() {
        let raw = json!({"$schema": "book.v2"});
        assert!(matches!(annotate(raw), Err(AnnotateError::MissingSource)));
    }

    #[test]
    fn leaves_are_stamped_and_resolvable() {
        let raw = json!({
            "$schema": "book.v2",
            "classification": [{"realm": "isbn", "id": "9780000000001"}],
            "source": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z", "role": "publisher"},
            "title": "Alpha",
        });

        let annotated = annotate(raw).unwrap();
        let title_hash = annotated["title"]["source"].as_str().unwrap();
        assert_eq!(annotated["title"]["value"], json!("Alpha"));
        assert!(annotated["source"]
            .as_object()
            .unwrap()
            .contains_key(title_hash));
    }

    #[test]
    fn classified_array_elements_dedup_by_classification() {
        let raw = json!({
            "$schema": "contributor.v2",
            "classification": [{"realm": "viaf", "id": "1"}],
            "source": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z"},
            "names": [
                {"classification": "primary", "display": "Jane Doe"},
                {"classification": "primary", "display": "J. Doe"},
            ],
        });

        let annotated = annotate(raw).unwrap();
        let names = annotated["names"].as_array().unwrap();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn already_annotated_subtree_is_preserved() {
        let raw = json!({
            "$schema": "book.v2",
            "classification": [{"realm": "isbn", "id": "1"}],
            "source": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z"},
            "title": {"value": "Alpha", "source": "existing-hash"},
        });

        let annotated = annotate(raw).unwrap();
        assert_eq!(annotated["title"]["source"], json!("existing-hash"));
    }

    #[test]
    fn non_classified_array_becomes_one_leaf() {
        let raw = json!({
            "$schema": "book.v2",
            "classification": [{"realm": "isbn", "id": "1"}],
            "source": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z"},
            "tags": ["fiction", "classic"],
        });

        let annotated = annotate(raw).unwrap();
        assert_eq!(annotated["tags"]["value"], json!(["fiction", "classic"]));
    }

    #[test]
    fn contributor_names_array_is_one_opaque_leaf() {
        // Per-element ids (e.g. a content hash of the display name) are the
        // producer's concern; the Annotator has no schema-specific
        // knowledge of `contributors` and treats it like any other
        // non-classified array.
        let raw = json!({
            "$schema": "contributor.v2",
            "classification": [{"realm": "viaf", "id": "1"}],
            "source": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z"},
            "contributors": [{"names": {"display": "Jane Doe"}, "ids": {"bbb": "sha1-of-jane-doe"}}],
        });

        let annotated = annotate(raw).unwrap();
        assert_eq!(
            annotated["contributors"]["value"][0]["ids"]["bbb"],
            json!("sha1-of-jane-doe")
        );
    }

    #[test]
    fn empty_object_has_no_leaves() {
        let raw = json!({
            "$schema": "book.v2",
            "classification": [{"realm": "isbn", "id": "1"}],
            "source": {"system": "sA", "processedAt": "2020-01-01T00:00:00Z"},
            "extra": {},
        });

        let annotated = annotate(raw).unwrap();
        assert_eq!(annotated["extra"], json!({}));
    }
}
