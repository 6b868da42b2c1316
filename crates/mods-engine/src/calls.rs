use crate::dtype::{ColumnType, friendly_dtypes};
use crate::normalize::{NormalizeOptions, OP_NAME_COLUMN, normalize_calls};
use crate::table::Table;
use crate::Result;
use mods_types::Call;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Column name and inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

/// Immutable tabular projection of call records, one row per call in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calls {
    table: Table,
}

impl Calls {
    pub fn new(table: Table) -> Self {
        Self { table }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_calls(calls: &[Call], options: &NormalizeOptions) -> Result<Self> {
        Ok(Self::new(normalize_calls(calls, options)?))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Columns with their friendly type, optionally restricted to `types`.
    pub fn columns(&self, types: Option<&[ColumnType]>) -> Vec<Column> {
        friendly_dtypes(&self.table)
            .into_iter()
            .filter(|(_, dtype)| types.is_none_or(|t| t.contains(dtype)))
            .map(|(name, dtype)| Column { name, dtype })
            .collect()
    }

    pub fn columns_sorted_by<K, F>(&self, types: Option<&[ColumnType]>, key: F) -> Vec<Column>
    where
        K: Ord,
        F: FnMut(&Column) -> K,
    {
        let mut columns = self.columns(types);
        columns.sort_by_key(key);
        columns
    }

    /// Number of calls per fully qualified op name.
    pub fn op_name_counts(&self) -> HashMap<String, usize> {
        self.table.value_counts(OP_NAME_COLUMN)
    }
}

impl fmt::Display for Calls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col_info: Vec<String> = friendly_dtypes(&self.table)
            .into_iter()
            .filter(|(_, dtype)| *dtype != ColumnType::Empty)
            .map(|(name, dtype)| describe_column(&self.table, &name, dtype))
            .collect();
        write!(
            f,
            "Calls(rows={}, columns=[\n  {}\n])",
            self.table.len(),
            col_info.join(",\n  ")
        )
    }
}

fn describe_column(table: &Table, name: &str, dtype: ColumnType) -> String {
    if dtype != ColumnType::Object {
        return format!("{}: {}", name, dtype);
    }
    let sample = table
        .column(name)
        .and_then(|mut cells| cells.find(|v| !v.is_null()));
    match sample {
        Some(Value::Object(map)) => format!(
            "{}: dict[{} keys: {}]",
            name,
            map.len(),
            key_preview(map)
        ),
        Some(Value::Array(items)) => match items.first() {
            Some(Value::Object(first)) => format!(
                "{}: list[{} items, first item: dict({})]",
                name,
                items.len(),
                key_preview(first)
            ),
            _ => format!("{}: list[{} items]", name, items.len()),
        },
        Some(other) => format!("{}: {}", name, value_type_name(other)),
        None => format!("{}: {}", name, dtype),
    }
}

fn key_preview(map: &Map<String, Value>) -> String {
    let mut keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    let mut preview = keys.iter().take(3).copied().collect::<Vec<_>>().join(", ");
    if keys.len() > 3 {
        preview.push_str(", ...");
    }
    preview
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
