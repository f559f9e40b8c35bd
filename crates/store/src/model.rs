use serde_json::Value;
use uuid::Uuid;

/// One row of `history_documents` (§10): a single per-source annotated
/// document plus the opaque identity the store assigns it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub version: i64,
    pub schema: String,
    pub history_key: String,
    pub classification_key: String,
    pub document: Value,
}

/// One row of `current_documents` (§10): the merged projection for one
/// entity, addressed externally by `entity_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentRecord {
    pub id: Uuid,
    pub version: i64,
    pub schema: String,
    pub current_key: String,
    pub entity_id: Uuid,
    pub document: Value,
}

/// Namespace UUID for deriving a stable `entity_id` from a current key
/// (§10). Fixed so the same current key always produces the same id across
/// process restarts.
pub const ENTITY_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6e, 0x1b, 0x5a, 0x3c, 0x9f, 0x2d, 0x47, 0x8e, 0xa1, 0x0c, 0x3d, 0x4b, 0x2a, 0x7c, 0x91, 0x5f,
]);

pub fn derive_entity_id(current_key: &str) -> Uuid {
    Uuid::new_v5(&ENTITY_ID_NAMESPACE, current_key.as_bytes())
}
