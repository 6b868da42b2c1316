use crate::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Column type as seen by a dashboard, inferred from non-null cell values.
///
/// Nulls never decide the type, so a column of `true`/`false`/null reads as
/// `Bool` and a column of strings with gaps reads as `Str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Bool,
    Str,
    Int,
    Float,
    Object,
    /// No non-null values at all.
    Empty,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Bool => "bool",
            ColumnType::Str => "str",
            ColumnType::Int => "int64",
            ColumnType::Float => "float64",
            ColumnType::Object => "object",
            ColumnType::Empty => "empty",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn detect_dtype<'a>(cells: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let mut saw_null = false;
    let mut non_null = 0usize;
    let (mut bools, mut strs, mut ints, mut floats) = (0usize, 0usize, 0usize, 0usize);

    for cell in cells {
        match cell {
            Value::Null => saw_null = true,
            Value::Bool(_) => bools += 1,
            Value::String(_) => strs += 1,
            Value::Number(n) if n.is_f64() => floats += 1,
            Value::Number(_) => ints += 1,
            _ => {}
        }
        if !cell.is_null() {
            non_null += 1;
        }
    }

    if non_null == 0 {
        ColumnType::Empty
    } else if bools == non_null {
        ColumnType::Bool
    } else if strs == non_null {
        ColumnType::Str
    } else if ints == non_null && !saw_null {
        ColumnType::Int
    } else if ints + floats == non_null {
        // integers with gaps widen to float, as a dataframe would store them
        ColumnType::Float
    } else {
        ColumnType::Object
    }
}

/// `(column, type)` for every column, in column order.
pub fn friendly_dtypes(table: &Table) -> Vec<(String, ColumnType)> {
    table
        .columns()
        .iter()
        .map(|name| {
            let dtype = table
                .column(name)
                .map(|cells| detect_dtype(cells))
                .unwrap_or(ColumnType::Empty);
            (name.clone(), dtype)
        })
        .collect()
}
