use mods_types::{
    CallsQueryReq, CallsQueryRes, ObjQueryReq, ObjQueryRes, RefsReadBatchReq, RefsReadBatchRes,
    TraceStore,
};

use crate::db::SqliteStore;

impl TraceStore for SqliteStore {
    fn project_id(&self) -> &str {
        SqliteStore::project_id(self)
    }

    fn calls_query(&self, req: &CallsQueryReq) -> anyhow::Result<CallsQueryRes> {
        let calls = self.query_calls(req)?;
        tracing::debug!(
            offset = req.offset,
            limit = ?req.limit,
            returned = calls.len(),
            "sqlite calls_query"
        );
        Ok(CallsQueryRes { calls })
    }

    fn objs_query(&self, req: &ObjQueryReq) -> anyhow::Result<ObjQueryRes> {
        let objs = self.query_objects(&req.project_id, &req.filter)?;
        Ok(ObjQueryRes { objs })
    }

    fn refs_read_batch(&self, req: &RefsReadBatchReq) -> anyhow::Result<RefsReadBatchRes> {
        let vals = req
            .refs
            .iter()
            .map(|uri| self.read_ref(uri))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(RefsReadBatchRes { vals })
    }
}
