use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One version of a named op or data object as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjSchema {
    pub project_id: String,
    pub object_id: String,
    pub created_at: DateTime<Utc>,
    pub digest: String,
    /// 0-based, strictly increasing across successive digests of one object id.
    pub version_index: i64,
    pub is_op: bool,
    #[serde(default)]
    pub base_object_class: Option<String>,
    /// Object body; backends may omit it in listings.
    #[serde(default)]
    pub val: Value,
}
