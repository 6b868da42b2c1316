use chrono::{DateTime, SecondsFormat, Utc};
use mods_types::{CallSchema, ObjSchema, ObjectRef, extract_refs, extract_value_refs};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::queries::{calls, objects, refs};
use crate::records::{ImportSummary, NewObject, StoreDump};
use crate::schema;
use crate::{Error, Result};

// NOTE: Versioning model
//
// An object version is identified by the SHA-256 of its JSON body. Publishing a
// body whose digest already exists for that object id is a no-op that returns the
// existing ref; anything else gets version_index = max + 1.

/// SQLite-backed trace store scoped to one `entity/project`.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    project_id: String,
}

impl SqliteStore {
    pub fn open(db_path: &Path, project_id: impl Into<String>) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, project_id.into())
    }

    pub fn open_in_memory(project_id: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, project_id.into())
    }

    fn with_connection(conn: Connection, project_id: String) -> Result<Self> {
        mods_types::split_project_id(&project_id)?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            project_id,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Query("connection lock poisoned".to_string()))
    }

    // --- Write path ---

    pub fn insert_call(&self, call: &CallSchema) -> Result<()> {
        let conn = self.conn()?;
        insert_call(&conn, call)
    }

    /// Publish a new object version and return its ref.
    pub fn insert_object(&self, obj: NewObject) -> Result<ObjectRef> {
        let conn = self.conn()?;
        let digest = digest_of(&obj.val)?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT version_index FROM objects
                 WHERE project_id = ?1 AND object_id = ?2 AND digest = ?3",
                params![&self.project_id, &obj.object_id, &digest],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_none() {
            let latest: Option<i64> = conn.query_row(
                "SELECT MAX(version_index) FROM objects WHERE project_id = ?1 AND object_id = ?2",
                params![&self.project_id, &obj.object_id],
                |row| row.get(0),
            )?;
            let record = ObjSchema {
                project_id: self.project_id.clone(),
                object_id: obj.object_id.clone(),
                created_at: obj.created_at.unwrap_or_else(Utc::now),
                digest: digest.clone(),
                version_index: latest.map_or(0, |v| v + 1),
                is_op: obj.is_op,
                base_object_class: obj.base_object_class,
                val: obj.val,
            };
            insert_object(&conn, &record)?;
        }

        let reference = if obj.is_op {
            ObjectRef::op(&self.project_id, &obj.object_id, &digest)?
        } else {
            ObjectRef::object(&self.project_id, &obj.object_id, &digest)?
        };
        Ok(reference)
    }

    /// Load a dump in a single transaction.
    pub fn import(&self, dump: &StoreDump) -> Result<ImportSummary> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for call in &dump.calls {
            insert_call(&tx, call)?;
        }
        for obj in &dump.objects {
            insert_object(&tx, obj)?;
        }
        tx.commit()?;

        Ok(ImportSummary {
            calls: dump.calls.len(),
            objects: dump.objects.len(),
        })
    }

    // --- Read path ---

    pub fn get_call(&self, call_id: &str) -> Result<Option<CallSchema>> {
        let conn = self.conn()?;
        calls::get_call(&conn, &self.project_id, call_id)
    }

    pub(crate) fn read_ref(&self, uri: &str) -> Result<Value> {
        let conn = self.conn()?;
        refs::read_ref(&conn, uri)
    }

    pub(crate) fn query_objects(
        &self,
        project_id: &str,
        filter: &mods_types::ObjectVersionFilter,
    ) -> Result<Vec<ObjSchema>> {
        let conn = self.conn()?;
        objects::query_objects(&conn, project_id, filter)
    }

    pub(crate) fn query_calls(&self, req: &mods_types::CallsQueryReq) -> Result<Vec<CallSchema>> {
        let conn = self.conn()?;
        calls::query_calls(&conn, req)
    }
}

pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Query(format!("invalid timestamp '{}': {}", raw, e)))
}

fn digest_of(val: &Value) -> Result<String> {
    let body = serde_json::to_vec(val)?;
    let hash = Sha256::digest(&body);
    Ok(hash.iter().map(|b| format!("{:02x}", b)).collect())
}

fn insert_call(conn: &Connection, call: &CallSchema) -> Result<()> {
    let id = call
        .id
        .as_deref()
        .ok_or_else(|| Error::Query("Call ID is None".to_string()))?;
    let input_refs = extract_refs(&call.inputs);
    let output_refs = extract_value_refs(&call.output);

    conn.execute(
        r#"
        INSERT OR REPLACE INTO calls (
            id, project_id, op_name, display_name, trace_id, parent_id,
            started_at, ended_at, attributes, inputs, input_refs,
            output, output_refs, exception, summary
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            id,
            &call.project_id,
            &call.op_name,
            &call.display_name,
            &call.trace_id,
            &call.parent_id,
            format_ts(&call.started_at),
            call.ended_at.as_ref().map(format_ts),
            serde_json::to_string(&call.attributes)?,
            serde_json::to_string(&call.inputs)?,
            serde_json::to_string(&input_refs)?,
            serde_json::to_string(&call.output)?,
            serde_json::to_string(&output_refs)?,
            &call.exception,
            call.summary
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        ],
    )?;

    Ok(())
}

fn insert_object(conn: &Connection, obj: &ObjSchema) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO objects (
            project_id, object_id, digest, version_index, is_op,
            base_object_class, created_at, val
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            &obj.project_id,
            &obj.object_id,
            &obj.digest,
            obj.version_index,
            obj.is_op,
            &obj.base_object_class,
            format_ts(&obj.created_at),
            serde_json::to_string(&obj.val)?,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_object_versions_are_monotonic() {
        let store = SqliteStore::open_in_memory("ent/proj").unwrap();

        let v0 = store
            .insert_object(NewObject::new("dataset", json!({"rows": [1]})))
            .unwrap();
        let v1 = store
            .insert_object(NewObject::new("dataset", json!({"rows": [1, 2]})))
            .unwrap();
        let again = store
            .insert_object(NewObject::new("dataset", json!({"rows": [1]})))
            .unwrap();

        assert_ne!(v0.digest, v1.digest);
        assert_eq!(v0, again);
        assert_eq!(v0.digest.len(), 64);

        let objs = store
            .query_objects("ent/proj", &Default::default())
            .unwrap();
        let versions: Vec<i64> = objs.iter().map(|o| o.version_index).collect();
        assert_eq!(versions, vec![0, 1]);
    }

    #[test]
    fn test_insert_call_requires_id() {
        let store = SqliteStore::open_in_memory("ent/proj").unwrap();
        let call = CallSchema {
            id: None,
            project_id: "ent/proj".to_string(),
            op_name: "weave:///ent/proj/op/f:abc".to_string(),
            display_name: None,
            trace_id: "t".to_string(),
            parent_id: None,
            started_at: Utc::now(),
            ended_at: None,
            attributes: Default::default(),
            inputs: Default::default(),
            output: Value::Null,
            exception: None,
            summary: None,
        };
        let err = store.insert_call(&call).unwrap_err();
        assert!(err.to_string().contains("Call ID is None"));
    }

    #[test]
    fn test_open_rejects_bad_project_id() {
        assert!(SqliteStore::open_in_memory("no-slash").is_err());
    }

    #[test]
    fn test_timestamp_roundtrip_keeps_micros() {
        let ts = parse_ts("2025-01-02T03:04:05.123456Z").unwrap();
        assert_eq!(format_ts(&ts), "2025-01-02T03:04:05.123456Z");
    }
}
