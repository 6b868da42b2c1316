use mods_types::{CallSchema, CallsFilter, CallsQueryReq, SortBy, SortDirection};
use rusqlite::{Connection, Row};
use serde_json::{Map, Value};

use crate::db::parse_ts;
use crate::{Error, Result};

const SELECT_COLUMNS: &str = "id, project_id, op_name, display_name, trace_id, parent_id, \
     started_at, ended_at, attributes, inputs, output, exception, summary";

/// Fields accepted in `sort_by`; anything else is rejected rather than interpolated.
const SORTABLE_FIELDS: &[&str] = &[
    "id",
    "op_name",
    "display_name",
    "trace_id",
    "parent_id",
    "started_at",
    "ended_at",
];

/// Row shape straight out of SQLite; JSON columns are still text.
struct CallRow {
    id: String,
    project_id: String,
    op_name: String,
    display_name: Option<String>,
    trace_id: String,
    parent_id: Option<String>,
    started_at: String,
    ended_at: Option<String>,
    attributes: String,
    inputs: String,
    output: String,
    exception: Option<String>,
    summary: Option<String>,
}

impl CallRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            op_name: row.get(2)?,
            display_name: row.get(3)?,
            trace_id: row.get(4)?,
            parent_id: row.get(5)?,
            started_at: row.get(6)?,
            ended_at: row.get(7)?,
            attributes: row.get(8)?,
            inputs: row.get(9)?,
            output: row.get(10)?,
            exception: row.get(11)?,
            summary: row.get(12)?,
        })
    }

    fn into_schema(self) -> Result<CallSchema> {
        Ok(CallSchema {
            id: Some(self.id),
            project_id: self.project_id,
            op_name: self.op_name,
            display_name: self.display_name,
            trace_id: self.trace_id,
            parent_id: self.parent_id,
            started_at: parse_ts(&self.started_at)?,
            ended_at: self.ended_at.as_deref().map(parse_ts).transpose()?,
            attributes: parse_map(&self.attributes)?,
            inputs: parse_map(&self.inputs)?,
            output: serde_json::from_str(&self.output)?,
            exception: self.exception,
            summary: self.summary.as_deref().map(parse_map).transpose()?,
        })
    }
}

fn parse_map(raw: &str) -> Result<Map<String, Value>> {
    Ok(serde_json::from_str(raw)?)
}

pub fn get_call(conn: &Connection, project_id: &str, call_id: &str) -> Result<Option<CallSchema>> {
    let query = format!(
        "SELECT {} FROM calls WHERE project_id = ?1 AND id = ?2",
        SELECT_COLUMNS
    );
    let mut stmt = conn.prepare(&query)?;
    let mut rows = stmt.query([project_id, call_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(CallRow::from_row(row)?.into_schema()?)),
        None => Ok(None),
    }
}

pub fn query_calls(conn: &Connection, req: &CallsQueryReq) -> Result<Vec<CallSchema>> {
    let mut where_clauses = vec!["project_id = ?".to_string()];
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(req.project_id.clone())];

    push_filter(&req.filter, &mut where_clauses, &mut params);

    let order_clause = order_clause(req.sort_by.as_deref())?;
    let limit = req.limit.map_or(-1, |l| l as i64);
    params.push(Box::new(limit));
    params.push(Box::new(req.offset as i64));

    let query = format!(
        r#"
        SELECT {}
        FROM calls
        WHERE {}
        {}
        LIMIT ? OFFSET ?
        "#,
        SELECT_COLUMNS,
        where_clauses.join(" AND "),
        order_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), CallRow::from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    rows.into_iter()
        .map(|row| {
            let schema = row.into_schema()?;
            Ok(match &req.columns {
                Some(columns) => project_columns(schema, columns),
                None => schema,
            })
        })
        .collect()
}

fn push_filter(
    filter: &CallsFilter,
    where_clauses: &mut Vec<String>,
    params: &mut Vec<Box<dyn rusqlite::ToSql>>,
) {
    if let Some(op_names) = &filter.op_names {
        if op_names.is_empty() {
            where_clauses.push("0".to_string());
        } else {
            let mut alternatives = Vec::with_capacity(op_names.len());
            for name in op_names {
                match name.strip_suffix('*').filter(|prefix| prefix.ends_with(':')) {
                    // LIKE folds ASCII case, so compare the prefix exactly
                    Some(prefix) => {
                        alternatives.push("substr(op_name, 1, length(?)) = ?".to_string());
                        params.push(Box::new(prefix.to_string()));
                        params.push(Box::new(prefix.to_string()));
                    }
                    None => {
                        alternatives.push("op_name = ?".to_string());
                        params.push(Box::new(name.clone()));
                    }
                }
            }
            where_clauses.push(format!("({})", alternatives.join(" OR ")));
        }
    }

    if let Some(refs) = &filter.input_refs {
        push_json_any(where_clauses, params, "input_refs", refs);
    }
    if let Some(refs) = &filter.output_refs {
        push_json_any(where_clauses, params, "output_refs", refs);
    }
    if let Some(ids) = &filter.parent_ids {
        push_in(where_clauses, params, "parent_id", ids);
    }
    if let Some(ids) = &filter.trace_ids {
        push_in(where_clauses, params, "trace_id", ids);
    }
    if let Some(ids) = &filter.call_ids {
        push_in(where_clauses, params, "id", ids);
    }
    if filter.trace_roots_only == Some(true) {
        where_clauses.push("parent_id IS NULL".to_string());
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn push_in(
    where_clauses: &mut Vec<String>,
    params: &mut Vec<Box<dyn rusqlite::ToSql>>,
    column: &str,
    values: &[String],
) {
    if values.is_empty() {
        where_clauses.push("0".to_string());
        return;
    }
    where_clauses.push(format!("{} IN ({})", column, placeholders(values.len())));
    for value in values {
        params.push(Box::new(value.clone()));
    }
}

fn push_json_any(
    where_clauses: &mut Vec<String>,
    params: &mut Vec<Box<dyn rusqlite::ToSql>>,
    column: &str,
    values: &[String],
) {
    if values.is_empty() {
        where_clauses.push("0".to_string());
        return;
    }
    where_clauses.push(format!(
        "EXISTS (SELECT 1 FROM json_each(calls.{}) AS r WHERE r.value IN ({}))",
        column,
        placeholders(values.len())
    ));
    for value in values {
        params.push(Box::new(value.clone()));
    }
}


fn order_clause(sort_by: Option<&[SortBy]>) -> Result<String> {
    let sort_by = match sort_by {
        Some(s) if !s.is_empty() => s,
        _ => return Ok("ORDER BY started_at ASC, id ASC".to_string()),
    };

    let mut terms = Vec::with_capacity(sort_by.len() + 1);
    for sort in sort_by {
        if !SORTABLE_FIELDS.contains(&sort.field.as_str()) {
            return Err(Error::Query(format!(
                "unsupported sort field: {}",
                sort.field
            )));
        }
        let direction = match sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        terms.push(format!("{} {}", sort.field, direction));
    }
    if !sort_by.iter().any(|s| s.field == "id") {
        terms.push("id ASC".to_string());
    }
    Ok(format!("ORDER BY {}", terms.join(", ")))
}

/// Drop payload fields not named in `columns`; identity fields are always kept.
///
/// Dotted names select their top-level field (`inputs.model` keeps `inputs`).
fn project_columns(mut schema: CallSchema, columns: &[String]) -> CallSchema {
    let wants = |field: &str| {
        columns
            .iter()
            .any(|c| c.split('.').next() == Some(field))
    };

    if !wants("display_name") {
        schema.display_name = None;
    }
    if !wants("ended_at") {
        schema.ended_at = None;
    }
    if !wants("attributes") {
        schema.attributes = Map::new();
    }
    if !wants("inputs") {
        schema.inputs = Map::new();
    }
    if !wants("output") {
        schema.output = Value::Null;
    }
    if !wants("exception") {
        schema.exception = None;
    }
    if !wants("summary") {
        schema.summary = None;
    }
    schema
}
