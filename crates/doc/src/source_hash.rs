//! Source-stamp hashing (§3 "Source stamp").

use crate::canonical::to_canonical_string;
use serde_json::Value;

/// SHA-1 of a source stamp's canonical serialization, hex-encoded. Used both
/// as the annotated tree's leaf `source` reference and, with `processedAt`
/// and `system` excluded, as an ingredient of the Merger's tie-break.
pub fn source_hash(source: &Value) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(to_canonical_string(source).as_bytes());
    hex::encode(hasher.finalize())
}
