use crate::table::{KEY_SEPARATOR, Table};
use crate::usage::{DEFAULT_USAGE_PREFIX, UsageAggregation, merge_usage_columns};
use crate::{Error, Result};
use mods_types::{Call, split_op_name};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OP_NAME_COLUMN: &str = "op_name";

/// Knobs for turning call records into a flat table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    pub usage_prefix: String,
    pub usage_aggregation: UsageAggregation,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            usage_prefix: DEFAULT_USAGE_PREFIX.to_string(),
            usage_aggregation: UsageAggregation::default(),
        }
    }
}

/// Flatten calls, decompose `op_name`, merge usage columns.
///
/// Returns an empty table without touching any column logic when `calls` is empty.
pub fn normalize_calls(calls: &[Call], options: &NormalizeOptions) -> Result<Table> {
    if calls.is_empty() {
        return Ok(Table::default());
    }
    let records: Vec<Value> = calls.iter().map(Call::to_record).collect();
    let mut table = Table::from_records(&records);
    split_ref_column(&mut table, OP_NAME_COLUMN)?;
    merge_usage_columns(&mut table, &options.usage_prefix, options.usage_aggregation);
    Ok(table)
}

/// Insert `{column}.entity`, `.project`, `.kind`, `.name`, `.version` (and `.path`
/// when any row has a trailing path) right after `column`.
///
/// Null cells stay null in every part. Any other non-reference cell is an error.
pub fn split_ref_column(table: &mut Table, column: &str) -> Result<()> {
    let Some(pos) = table.column_position(column) else {
        return Ok(());
    };

    let mut parts = Vec::with_capacity(table.len());
    for row in table.rows() {
        match &row[pos] {
            Value::Null => parts.push(None),
            Value::String(s) => parts.push(Some(split_op_name(s)?)),
            other => return Err(Error::InvalidReference(other.to_string())),
        }
    }

    let has_path = parts.iter().flatten().any(|p| p.path.is_some());
    let text = |v: Option<&String>| v.cloned().map(Value::String).unwrap_or(Value::Null);

    let mut new_columns: Vec<(&str, Vec<Value>)> = vec![
        ("entity", parts.iter().map(|p| text(p.as_ref().map(|p| &p.entity))).collect()),
        ("project", parts.iter().map(|p| text(p.as_ref().map(|p| &p.project))).collect()),
        ("kind", parts.iter().map(|p| text(p.as_ref().map(|p| &p.kind))).collect()),
        ("name", parts.iter().map(|p| text(p.as_ref().map(|p| &p.name))).collect()),
        ("version", parts.iter().map(|p| text(p.as_ref().map(|p| &p.version))).collect()),
    ];
    if has_path {
        new_columns.push((
            "path",
            parts
                .iter()
                .map(|p| text(p.as_ref().and_then(|p| p.path.as_ref())))
                .collect(),
        ));
    }

    for (offset, (suffix, values)) in new_columns.into_iter().enumerate() {
        let name = format!("{}{}{}", column, KEY_SEPARATOR, suffix);
        table.insert_column(pos + 1 + offset, name, values)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_ref_column_inserts_after_source() {
        let mut table = Table::from_records(&[
            json!({"id": "a", "op_name": "weave:///e/p/op/predict:d1", "x": 1}),
            json!({"id": "b", "op_name": "weave:///e/p/op/score:d2/attr/fn", "x": 2}),
        ]);
        split_ref_column(&mut table, "op_name").unwrap();

        assert_eq!(
            table.columns(),
            &[
                "id",
                "op_name",
                "op_name.entity",
                "op_name.project",
                "op_name.kind",
                "op_name.name",
                "op_name.version",
                "op_name.path",
                "x"
            ]
        );
        assert_eq!(table.get(0, "op_name.name"), Some(&json!("predict")));
        assert_eq!(table.get(1, "op_name.version"), Some(&json!("d2")));
        assert_eq!(table.get(0, "op_name.path"), Some(&Value::Null));
        assert_eq!(table.get(1, "op_name.path"), Some(&json!("attr/fn")));
    }

    #[test]
    fn test_split_ref_column_without_paths() {
        let mut table = Table::from_records(&[json!({"op_name": "weave:///e/p/op/predict:d1"})]);
        split_ref_column(&mut table, "op_name").unwrap();
        assert!(!table.has_column("op_name.path"));
        assert_eq!(table.width(), 6);
    }

    #[test]
    fn test_split_ref_column_rejects_plain_names() {
        let mut table = Table::from_records(&[json!({"op_name": "predict"})]);
        let err = split_ref_column(&mut table, "op_name").unwrap_err();
        assert_eq!(err.to_string(), "Invalid reference: predict");

        let mut table = Table::from_records(&[json!({"op_name": 7})]);
        assert!(matches!(
            split_ref_column(&mut table, "op_name"),
            Err(Error::InvalidReference(_))
        ));
    }

    #[test]
    fn test_normalize_empty_calls() {
        let table = normalize_calls(&[], &NormalizeOptions::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.width(), 0);
    }
}
