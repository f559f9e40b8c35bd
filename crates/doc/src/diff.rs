//! Structural diff between two merged documents, used by the Revisions view
//! (§4.7) to describe what changed between successive per-source merges.

use crate::shape::{is_annotated, leaf_value};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafChange {
    pub path: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Diffs two documents (raw, annotated, or merged — annotation wrapping is
/// stripped before comparing) and returns the leaf paths that were added,
/// removed, or changed.
pub fn diff(before: &Value, after: &Value) -> Vec<LeafChange> {
    let mut changes = Vec::new();
    diff_plain(&plain(before), &plain(after), "", &mut changes);
    changes
}

/// Strips `{value, source}` annotation wrapping, yielding the plain value
/// tree a diff can compare structurally.
fn plain(node: &Value) -> Value {
    if is_annotated(node) {
        return plain(leaf_value(node));
    }
    match node {
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), plain(v))).collect())
        }
        Value::Array(elements) if is_classified(elements) => {
            Value::Array(elements.iter().map(plain).collect())
        }
        other => other.clone(),
    }
}

fn is_classified(elements: &[Value]) -> bool {
    elements
        .iter()
        .any(|e| e.get("classification").is_some())
}

fn diff_plain(before: &Value, after: &Value, path: &str, out: &mut Vec<LeafChange>) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let mut keys: Vec<&String> = b.keys().chain(a.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child_path = join(path, key);
                match (b.get(key), a.get(key)) {
                    (Some(bv), Some(av)) => diff_plain(bv, av, &child_path, out),
                    (Some(bv), None) => out.push(LeafChange {
                        path: child_path,
                        before: Some(bv.clone()),
                        after: None,
                    }),
                    (None, Some(av)) => out.push(LeafChange {
                        path: child_path,
                        before: None,
                        after: Some(av.clone()),
                    }),
                    (None, None) => unreachable!(),
                }
            }
        }
        (Value::Array(b), Value::Array(a)) if is_classified(b) || is_classified(a) => {
            diff_classified_array(b, a, path, out);
        }
        (b, a) if b != a => out.push(LeafChange {
            path: path.to_string(),
            before: Some(b.clone()),
            after: Some(a.clone()),
        }),
        _ => {}
    }
}

fn diff_classified_array(before: &[Value], after: &[Value], path: &str, out: &mut Vec<LeafChange>) {
    let mut seen = Vec::new();
    for (i, b_elem) in before.iter().enumerate() {
        let key = b_elem.get("classification").cloned();
        seen.push(key.clone());
        let child_path = format!("{path}[{i}]");
        match after
            .iter()
            .find(|a_elem| a_elem.get("classification").cloned() == key)
        {
            Some(a_elem) => diff_plain(b_elem, a_elem, &child_path, out),
            None => out.push(LeafChange {
                path: child_path,
                before: Some(b_elem.clone()),
                after: None,
            }),
        }
    }
    for (i, a_elem) in after.iter().enumerate() {
        let key = a_elem.get("classification").cloned();
        if !seen.contains(&key) {
            out.push(LeafChange {
                path: format!("{path}[{i}]"),
                before: None,
                after: Some(a_elem.clone()),
            });
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn changed_leaf_is_reported() {
        let before = json!({"title": {"value": "Alpha", "source": "h1"}});
        let after = json!({"title": {"value": "Alpha!", "source": "h2"}});

        let changes = diff(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "title");
        assert_eq!(changes[0].before, Some(json!("Alpha")));
        assert_eq!(changes[0].after, Some(json!("Alpha!")));
    }

    #[test]
    fn added_field_has_no_before() {
        let before = json!({});
        let after = json!({"subtitle": {"value": "An Introduction", "source": "h1"}});

        let changes = diff(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].before, None);
        assert_eq!(changes[0].after, Some(json!("An Introduction")));
    }

    #[test]
    fn unchanged_document_has_no_diff() {
        let doc = json!({"title": {"value": "Alpha", "source": "h1"}});
        assert!(diff(&doc, &doc).is_empty());
    }
}
