//! The trace-store client seam.
//!
//! Adapters only ever talk to a backend through [`TraceStore`]. Backend failures
//! cross this boundary as opaque `anyhow::Error`s and are never interpreted here.

use crate::call::CallSchema;
use crate::filter::{CallsFilter, ObjectVersionFilter, SortBy};
use crate::object::ObjSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallsQueryReq {
    pub project_id: String,
    #[serde(default)]
    pub filter: CallsFilter,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Restrict returned fields; `None` returns full records.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub sort_by: Option<Vec<SortBy>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallsQueryRes {
    pub calls: Vec<CallSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjQueryReq {
    pub project_id: String,
    #[serde(default)]
    pub filter: ObjectVersionFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjQueryRes {
    pub objs: Vec<ObjSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefsReadBatchReq {
    pub refs: Vec<String>,
}

/// Values in the same order as the requested refs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefsReadBatchRes {
    pub vals: Vec<Value>,
}

/// Client handle for a remote trace/object store.
///
/// `calls_query` must honor `offset`/`limit` and return fewer than `limit`
/// records only on the final page.
pub trait TraceStore: Send + Sync {
    /// Composite `entity/project` id this handle is scoped to.
    fn project_id(&self) -> &str;

    fn calls_query(&self, req: &CallsQueryReq) -> anyhow::Result<CallsQueryRes>;

    fn objs_query(&self, req: &ObjQueryReq) -> anyhow::Result<ObjQueryRes>;

    fn refs_read_batch(&self, req: &RefsReadBatchReq) -> anyhow::Result<RefsReadBatchRes>;
}
