use chrono::{DateTime, Utc};
use mods_types::{CallSchema, ObjSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Object body to be published as a new version.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObject {
    pub object_id: String,
    pub val: Value,
    pub is_op: bool,
    pub base_object_class: Option<String>,
    /// Defaults to the insertion time.
    pub created_at: Option<DateTime<Utc>>,
}

impl NewObject {
    pub fn new(object_id: impl Into<String>, val: Value) -> Self {
        Self {
            object_id: object_id.into(),
            val,
            is_op: false,
            base_object_class: None,
            created_at: None,
        }
    }

    pub fn op(object_id: impl Into<String>, val: Value) -> Self {
        Self {
            is_op: true,
            ..Self::new(object_id, val)
        }
    }

    pub fn base_object_class(mut self, class: impl Into<String>) -> Self {
        self.base_object_class = Some(class.into());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Portable snapshot of a project's calls and object versions.
///
/// Objects are imported verbatim, including their digest and version index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDump {
    #[serde(default)]
    pub calls: Vec<CallSchema>,
    #[serde(default)]
    pub objects: Vec<ObjSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub calls: usize,
    pub objects: usize,
}
