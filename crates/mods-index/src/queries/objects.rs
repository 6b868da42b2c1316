use mods_types::{ObjSchema, ObjectVersionFilter};
use rusqlite::{Connection, Row, params};

use crate::Result;
use crate::db::parse_ts;

const SELECT_COLUMNS: &str =
    "project_id, object_id, digest, version_index, is_op, base_object_class, created_at, val";

const LATEST_ONLY_CLAUSE: &str = "version_index = (SELECT MAX(o2.version_index) FROM objects o2 \
     WHERE o2.project_id = objects.project_id AND o2.object_id = objects.object_id)";

struct ObjRow {
    project_id: String,
    object_id: String,
    digest: String,
    version_index: i64,
    is_op: bool,
    base_object_class: Option<String>,
    created_at: String,
    val: String,
}

impl ObjRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            project_id: row.get(0)?,
            object_id: row.get(1)?,
            digest: row.get(2)?,
            version_index: row.get(3)?,
            is_op: row.get(4)?,
            base_object_class: row.get(5)?,
            created_at: row.get(6)?,
            val: row.get(7)?,
        })
    }

    fn into_schema(self) -> Result<ObjSchema> {
        Ok(ObjSchema {
            project_id: self.project_id,
            object_id: self.object_id,
            created_at: parse_ts(&self.created_at)?,
            digest: self.digest,
            version_index: self.version_index,
            is_op: self.is_op,
            base_object_class: self.base_object_class,
            val: serde_json::from_str(&self.val)?,
        })
    }
}

pub fn query_objects(
    conn: &Connection,
    project_id: &str,
    filter: &ObjectVersionFilter,
) -> Result<Vec<ObjSchema>> {
    let mut where_clauses = vec!["project_id = ?".to_string()];
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(project_id.to_string())];

    for (column, values) in [
        ("object_id", &filter.object_ids),
        ("base_object_class", &filter.base_object_classes),
    ] {
        let Some(values) = values else { continue };
        if values.is_empty() {
            where_clauses.push("0".to_string());
            continue;
        }
        where_clauses.push(format!(
            "{} IN ({})",
            column,
            vec!["?"; values.len()].join(", ")
        ));
        for value in values {
            params.push(Box::new(value.clone()));
        }
    }

    if let Some(is_op) = filter.is_op {
        where_clauses.push("is_op = ?".to_string());
        params.push(Box::new(is_op));
    }
    if filter.latest_only == Some(true) {
        where_clauses.push(LATEST_ONLY_CLAUSE.to_string());
    }

    let query = format!(
        "SELECT {} FROM objects WHERE {} ORDER BY object_id ASC, version_index ASC",
        SELECT_COLUMNS,
        where_clauses.join(" AND ")
    );

    let mut stmt = conn.prepare(&query)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), ObjRow::from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    rows.into_iter().map(ObjRow::into_schema).collect()
}

/// One version by digest; `*` and `latest` select the highest version index.
pub fn get_version(
    conn: &Connection,
    project_id: &str,
    object_id: &str,
    digest: &str,
) -> Result<Option<ObjSchema>> {
    let mut rows_out = if digest == "*" || digest == "latest" {
        let query = format!(
            "SELECT {} FROM objects WHERE project_id = ?1 AND object_id = ?2 \
             ORDER BY version_index DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;
        stmt.query_map(params![project_id, object_id], ObjRow::from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?
    } else {
        let query = format!(
            "SELECT {} FROM objects WHERE project_id = ?1 AND object_id = ?2 AND digest = ?3",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;
        stmt.query_map(params![project_id, object_id, digest], ObjRow::from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?
    };

    rows_out.pop().map(ObjRow::into_schema).transpose()
}
