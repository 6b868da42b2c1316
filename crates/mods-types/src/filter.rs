use serde::{Deserialize, Serialize};

/// Server-side filter for call queries.
///
/// Unset fields do not constrain the result. All list-valued fields match
/// when any listed value matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallsFilter {
    /// Fully qualified op reference URIs; a `:*` digest matches every version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_names: Option<Vec<String>>,
    /// Calls whose inputs reference any of these URIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_refs: Option<Vec<String>>,
    /// Calls whose output references any of these URIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_refs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_ids: Option<Vec<String>>,
    /// Only calls without a parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_roots_only: Option<bool>,
}

impl CallsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op_names(mut self, op_names: Vec<String>) -> Self {
        self.op_names = Some(op_names);
        self
    }

    pub fn input_refs(mut self, input_refs: Vec<String>) -> Self {
        self.input_refs = Some(input_refs);
        self
    }

    pub fn parent_ids(mut self, parent_ids: Vec<String>) -> Self {
        self.parent_ids = Some(parent_ids);
        self
    }

    pub fn trace_ids(mut self, trace_ids: Vec<String>) -> Self {
        self.trace_ids = Some(trace_ids);
        self
    }

    pub fn call_ids(mut self, call_ids: Vec<String>) -> Self {
        self.call_ids = Some(call_ids);
        self
    }

    pub fn trace_roots_only(mut self, trace_roots_only: bool) -> Self {
        self.trace_roots_only = Some(trace_roots_only);
        self
    }
}

/// Server-side filter for object version queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectVersionFilter {
    /// Restrict to objects whose declared base class is one of these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_object_classes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_ids: Option<Vec<String>>,
    /// `Some(true)` for ops, `Some(false)` for data objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_op: Option<bool>,
    /// Ask the backend to return only the newest version per object id.
    /// Not every backend honors this correctly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_only: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }
}
