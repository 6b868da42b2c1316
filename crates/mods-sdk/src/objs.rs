use crate::client::Client;
use crate::latest::latest_versions;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use mods_types::{
    ObjQueryReq, ObjSchema, ObjectRef, ObjectVersionFilter, REF_PREFIX, RefKind, RefsReadBatchReq,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Handle to one version of a data object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obj {
    pub project_id: String,
    pub name: String,
    pub digest: String,
    pub version_index: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_object_class: Option<String>,
}

impl Obj {
    pub fn from_schema(schema: ObjSchema) -> Self {
        Self {
            project_id: schema.project_id,
            name: schema.object_id,
            digest: schema.digest,
            version_index: schema.version_index,
            created_at: schema.created_at,
            base_object_class: schema.base_object_class,
        }
    }

    pub fn object_ref(&self) -> Result<ObjectRef> {
        Ok(ObjectRef::object(&self.project_id, &self.name, &self.digest)?)
    }

    pub fn uri(&self) -> String {
        format!(
            "{}{}/{}/{}:{}",
            REF_PREFIX,
            self.project_id,
            RefKind::Object,
            self.name,
            self.digest
        )
    }

    pub fn label(&self) -> String {
        format!("{}:v{}", self.name, self.version_index)
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl Client {
    /// Data objects, optionally restricted to base classes in `types`, newest first.
    pub fn get_objs(&self, types: Option<&[&str]>, latest_only: bool) -> Result<Vec<Obj>> {
        let req = ObjQueryReq {
            project_id: self.project_id().to_string(),
            filter: ObjectVersionFilter {
                base_object_classes: types.map(|t| t.iter().map(|s| s.to_string()).collect()),
                is_op: Some(false),
                latest_only: Some(latest_only),
                ..Default::default()
            },
        };
        let mut objs = self.store().objs_query(&req).map_err(Error::Backend)?.objs;
        // The backend's latest_only cannot be trusted; always dedup here.
        if latest_only {
            objs = latest_versions(objs);
        }

        let mut objs: Vec<Obj> = objs.into_iter().map(Obj::from_schema).collect();
        objs.sort_by_key(|o| o.created_at);
        objs.reverse();
        Ok(objs)
    }

    /// Object body via a one-element batch read.
    pub fn get_obj(&self, obj: &Obj) -> Result<Value> {
        let req = RefsReadBatchReq {
            refs: vec![obj.uri()],
        };
        let res = self.store().refs_read_batch(&req).map_err(Error::Backend)?;
        res.vals.into_iter().next().ok_or_else(|| {
            Error::Backend(anyhow::anyhow!(
                "refs_read_batch returned no value for {}",
                obj.uri()
            ))
        })
    }
}
