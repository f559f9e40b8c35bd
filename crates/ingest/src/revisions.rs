//! The Revisions view (§4.7): a read-only derived history of per-source
//! changes for one entity, computed from the history store with no side
//! effects.

use doc::{diff, reduce_all, LeafChange, MergeError};
use serde::Serialize;
use serde_json::Value;
use store::HistoryRecord;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub processed_at: String,
    pub system: String,
    pub changes: Vec<LeafChange>,
}

/// Orders `records` by `processedAt` ascending (tie-break `system`
/// lexicographically) and diffs each one against the merge of every
/// record strictly before it.
pub fn revisions(records: Vec<HistoryRecord>) -> Result<Vec<Revision>, MergeError> {
    let mut ordered: Vec<(String, String, Value)> = records
        .into_iter()
        .map(|r| {
            let source = r.document.get("source").cloned().unwrap_or(Value::Null);
            let (processed_at, system) = source
                .as_object()
                .and_then(|stamps| stamps.values().next())
                .and_then(|stamp| {
                    let processed_at = stamp.get("processedAt")?.as_str()?.to_string();
                    let system = stamp.get("system")?.as_str()?.to_string();
                    Some((processed_at, system))
                })
                .unwrap_or_default();
            (processed_at, system, r.document)
        })
        .collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut revisions = Vec::with_capacity(ordered.len());
    let mut preceding: Vec<Value> = Vec::new();
    for (processed_at, system, document) in ordered {
        let before = if preceding.is_empty() {
            Value::Object(Default::default())
        } else {
            reduce_all(preceding.clone())?
        };
        let changes = diff(&before, &document);
        preceding.push(document);
        revisions.push(Revision { processed_at, system, changes });
    }

    Ok(revisions)
}
