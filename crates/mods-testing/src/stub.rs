//! In-process trace store for adapter tests.
//!
//! `StubStore` answers queries from in-memory records and keeps a log of every
//! request, so tests can assert on page counts, filters, and batch contents.
//! By default it ignores `latest_only` like an unreliable backend would.

use anyhow::{Result, anyhow};
use mods_types::{
    CallSchema, CallsFilter, CallsQueryReq, CallsQueryRes, ObjQueryReq, ObjQueryRes, ObjSchema,
    RefsReadBatchReq, RefsReadBatchRes, TraceStore, extract_refs, extract_value_refs,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::fixtures::PROJECT_ID;

pub struct StubStore {
    project_id: String,
    calls: Vec<CallSchema>,
    objs: Vec<ObjSchema>,
    refs: HashMap<String, Value>,
    honor_latest_only: bool,
    fail_calls_on_request: Option<usize>,
    fail_refs: bool,
    calls_requests: Mutex<Vec<CallsQueryReq>>,
    objs_requests: Mutex<Vec<ObjQueryReq>>,
    refs_requests: Mutex<Vec<RefsReadBatchReq>>,
}

impl Default for StubStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StubStore {
    pub fn new() -> Self {
        Self {
            project_id: PROJECT_ID.to_string(),
            calls: Vec::new(),
            objs: Vec::new(),
            refs: HashMap::new(),
            honor_latest_only: false,
            fail_calls_on_request: None,
            fail_refs: false,
            calls_requests: Mutex::new(Vec::new()),
            objs_requests: Mutex::new(Vec::new()),
            refs_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_calls(mut self, calls: impl IntoIterator<Item = CallSchema>) -> Self {
        self.calls.extend(calls);
        self
    }

    pub fn with_objs(mut self, objs: impl IntoIterator<Item = ObjSchema>) -> Self {
        self.objs.extend(objs);
        self
    }

    pub fn with_ref(mut self, uri: &str, value: Value) -> Self {
        self.refs.insert(uri.to_string(), value);
        self
    }

    /// Apply `latest_only` server-side (newest version per object id).
    pub fn honoring_latest_only(mut self) -> Self {
        self.honor_latest_only = true;
        self
    }

    /// Fail the `n`-th (0-based) `calls_query` request.
    pub fn failing_calls_on_request(mut self, n: usize) -> Self {
        self.fail_calls_on_request = Some(n);
        self
    }

    pub fn failing_refs(mut self) -> Self {
        self.fail_refs = true;
        self
    }

    pub fn calls_requests(&self) -> Vec<CallsQueryReq> {
        self.calls_requests.lock().expect("lock").clone()
    }

    pub fn objs_requests(&self) -> Vec<ObjQueryReq> {
        self.objs_requests.lock().expect("lock").clone()
    }

    pub fn refs_requests(&self) -> Vec<RefsReadBatchReq> {
        self.refs_requests.lock().expect("lock").clone()
    }

    pub fn page_requests(&self) -> usize {
        self.calls_requests.lock().expect("lock").len()
    }
}

fn matches_filter(call: &CallSchema, filter: &CallsFilter) -> bool {
    if let Some(op_names) = &filter.op_names {
        let hit = op_names.iter().any(|name| match name.strip_suffix('*') {
            Some(prefix) if prefix.ends_with(':') => call.op_name.starts_with(prefix),
            _ => &call.op_name == name,
        });
        if !hit {
            return false;
        }
    }
    if let Some(refs) = &filter.input_refs
        && !extract_refs(&call.inputs).iter().any(|r| refs.contains(r))
    {
        return false;
    }
    if let Some(refs) = &filter.output_refs
        && !extract_value_refs(&call.output)
            .iter()
            .any(|r| refs.contains(r))
    {
        return false;
    }
    let in_list = |list: &Option<Vec<String>>, value: Option<&String>| match list {
        Some(list) => value.is_some_and(|v| list.contains(v)),
        None => true,
    };
    if !in_list(&filter.parent_ids, call.parent_id.as_ref())
        || !in_list(&filter.trace_ids, Some(&call.trace_id))
        || !in_list(&filter.call_ids, call.id.as_ref())
    {
        return false;
    }
    if filter.trace_roots_only == Some(true) && call.parent_id.is_some() {
        return false;
    }
    true
}

impl TraceStore for StubStore {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn calls_query(&self, req: &CallsQueryReq) -> Result<CallsQueryRes> {
        let request_no = {
            let mut log = self.calls_requests.lock().expect("lock");
            log.push(req.clone());
            log.len() - 1
        };
        if self.fail_calls_on_request == Some(request_no) {
            return Err(anyhow!("stub backend unavailable (request {})", request_no));
        }

        let calls = self
            .calls
            .iter()
            .filter(|c| c.project_id == req.project_id && matches_filter(c, &req.filter))
            .skip(req.offset)
            .take(req.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(CallsQueryRes { calls })
    }

    fn objs_query(&self, req: &ObjQueryReq) -> Result<ObjQueryRes> {
        self.objs_requests.lock().expect("lock").push(req.clone());

        let filter = &req.filter;
        let mut objs: Vec<ObjSchema> = self
            .objs
            .iter()
            .filter(|o| o.project_id == req.project_id)
            .filter(|o| filter.is_op.is_none_or(|is_op| o.is_op == is_op))
            .filter(|o| {
                filter
                    .object_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&o.object_id))
            })
            .filter(|o| {
                filter.base_object_classes.as_ref().is_none_or(|classes| {
                    o.base_object_class
                        .as_ref()
                        .is_some_and(|c| classes.contains(c))
                })
            })
            .cloned()
            .collect();

        if self.honor_latest_only && filter.latest_only == Some(true) {
            let mut latest: HashMap<String, i64> = HashMap::new();
            for o in &objs {
                let entry = latest.entry(o.object_id.clone()).or_insert(o.version_index);
                *entry = (*entry).max(o.version_index);
            }
            objs.retain(|o| latest.get(&o.object_id) == Some(&o.version_index));
        }

        Ok(ObjQueryRes { objs })
    }

    fn refs_read_batch(&self, req: &RefsReadBatchReq) -> Result<RefsReadBatchRes> {
        self.refs_requests.lock().expect("lock").push(req.clone());
        if self.fail_refs {
            return Err(anyhow!("stub refs_read_batch failure"));
        }

        let vals = req
            .refs
            .iter()
            .map(|uri| {
                self.refs
                    .get(uri)
                    .cloned()
                    .ok_or_else(|| anyhow!("ref not found: {}", uri))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RefsReadBatchRes { vals })
    }
}
