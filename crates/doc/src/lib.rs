//! Pure document model for the reconciliation engine: canonical
//! serialization, source hashing, annotation, merging, key extraction, and
//! structural diffing. Nothing in this crate performs I/O; every function
//! here is a deterministic transformation over `serde_json::Value`.

mod annotate;
mod canonical;
mod diff;
mod key;
mod merge;
mod shape;
mod source_hash;

pub use annotate::{annotate, AnnotateError};
pub use canonical::to_canonical_string;
pub use diff::{diff, LeafChange};
pub use key::{extract_keys, KeyError, Keys, DEFAULT_HISTORY_KEY_EXCLUDED_FIELDS};
pub use merge::{merge_documents, reduce_all, MergeError};
pub use shape::{is_annotated, is_classified_array};
pub use source_hash::source_hash;
