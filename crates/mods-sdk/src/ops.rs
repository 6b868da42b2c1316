use crate::client::Client;
use crate::latest::latest_versions;
use crate::{Error, Result};
use mods_types::{ObjQueryReq, ObjSchema, ObjectRef, ObjectVersionFilter, REF_PREFIX, RefKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to one version of an op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Op {
    pub project_id: String,
    pub name: String,
    pub digest: String,
    pub version_index: i64,
    /// Calls logged against exactly this version, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_count: Option<usize>,
}

impl Op {
    pub fn from_schema(schema: ObjSchema) -> Self {
        Self {
            project_id: schema.project_id,
            name: schema.object_id,
            digest: schema.digest,
            version_index: schema.version_index,
            call_count: None,
        }
    }

    pub fn object_ref(&self) -> Result<ObjectRef> {
        Ok(ObjectRef::op(&self.project_id, &self.name, &self.digest)?)
    }

    pub fn uri(&self) -> String {
        format!(
            "{}{}/{}/{}:{}",
            REF_PREFIX,
            self.project_id,
            RefKind::Op,
            self.name,
            self.digest
        )
    }

    /// Short label: last dotted segment, at most its final 10 chars, plus `:v{n}`.
    pub fn label(&self) -> String {
        let last = self.name.rsplit('.').next().unwrap_or(&self.name);
        let chars: Vec<char> = last.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(10)..].iter().collect();
        format!("{}:v{}", tail, self.version_index)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl Client {
    fn query_ops(&self, filter: ObjectVersionFilter) -> Result<Vec<ObjSchema>> {
        let latest_only = filter.latest_only == Some(true);
        let req = ObjQueryReq {
            project_id: self.project_id().to_string(),
            filter: ObjectVersionFilter {
                is_op: Some(true),
                ..filter
            },
        };
        let objs = self.store().objs_query(&req).map_err(Error::Backend)?.objs;
        // The backend's latest_only cannot be trusted; always dedup here.
        Ok(if latest_only {
            latest_versions(objs)
        } else {
            objs
        })
    }

    /// Every op in the project; with `latest_only`, one entry per name.
    pub fn get_ops(&self, latest_only: bool) -> Result<Vec<Op>> {
        let objs = self.query_ops(ObjectVersionFilter {
            latest_only: Some(latest_only),
            ..Default::default()
        })?;
        Ok(objs.into_iter().map(Op::from_schema).collect())
    }

    /// All versions of `op`'s name, newest discovered first.
    ///
    /// With `include_call_counts`, each version carries the number of calls
    /// logged against it (0 when none).
    pub fn get_op_versions(&self, op: &Op, include_call_counts: bool) -> Result<Vec<Op>> {
        let objs = self.query_ops(ObjectVersionFilter {
            object_ids: Some(vec![op.name.clone()]),
            latest_only: Some(false),
            ..Default::default()
        })?;
        let mut versions: Vec<Op> = objs.into_iter().map(Op::from_schema).collect();

        if include_call_counts && !versions.is_empty() {
            let uris: Vec<String> = versions.iter().map(Op::uri).collect();
            let calls = self.calls().op(uris).fetch()?;
            let counts = calls.op_name_counts();
            for version in &mut versions {
                version.call_count = Some(counts.get(&version.uri()).copied().unwrap_or(0));
            }
        }

        versions.reverse();
        Ok(versions)
    }
}
