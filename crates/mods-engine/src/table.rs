use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Separator joining nested keys into flat column names.
pub const KEY_SEPARATOR: char = '.';

/// Column name used for records that are not JSON objects.
pub const SCALAR_COLUMN: &str = "value";

/// Row-major table of JSON values with ordered, named columns.
///
/// Every row is exactly as wide as `columns`; missing cells are `Value::Null`.
/// An optional string index labels rows and may contain duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            index: None,
        }
    }

    /// Flatten nested records into dotted-key columns.
    ///
    /// Columns appear in first-seen order across records. Nested objects are
    /// expanded (empty ones contribute no column); arrays and scalars are kept
    /// as cell values. Row order equals record order.
    pub fn from_records(records: &[Value]) -> Self {
        let flattened: Vec<Vec<(String, Value)>> = records.iter().map(flatten_record).collect();

        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for record in &flattened {
            for (key, _) in record {
                if !positions.contains_key(key) {
                    positions.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let rows = flattened
            .into_iter()
            .map(|record| {
                let mut row = vec![Value::Null; columns.len()];
                for (key, value) in record {
                    row[positions[&key]] = value;
                }
                row
            })
            .collect();

        Self {
            columns,
            rows,
            index: None,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(move |row| &row[pos]))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let pos = self.column_position(column)?;
        self.rows.get(row).map(|r| &r[pos])
    }

    pub fn row(&self, row: usize) -> Option<&[Value]> {
        self.rows.get(row).map(|r| r.as_slice())
    }

    pub fn index(&self) -> Option<&[String]> {
        self.index.as_deref()
    }

    pub fn set_index(&mut self, index: Vec<String>) -> Result<()> {
        if index.len() != self.rows.len() {
            return Err(Error::Shape(format!(
                "index has {} labels but table has {} rows",
                index.len(),
                self.rows.len()
            )));
        }
        self.index = Some(index);
        Ok(())
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Shape(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a column at the right edge.
    pub fn push_column(&mut self, name: String, values: Vec<Value>) -> Result<()> {
        let at = self.columns.len();
        self.insert_column(at, name, values)
    }

    pub fn insert_column(&mut self, at: usize, name: String, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::Shape(format!(
                "column '{}' has {} cells but table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.insert(at, name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(at, value);
        }
        Ok(())
    }

    pub fn drop_columns(&mut self, names: &[String]) {
        let keep: Vec<bool> = self.columns.iter().map(|c| !names.contains(c)).collect();
        retain_by_mask(&mut self.columns, &keep);
        for row in &mut self.rows {
            retain_by_mask(row, &keep);
        }
    }

    /// Number of rows per distinct string value of `column`; nulls are skipped.
    pub fn value_counts(&self, column: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        if let Some(cells) = self.column(column) {
            for cell in cells {
                if let Value::String(s) = cell {
                    *counts.entry(s.clone()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Rows as flat JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

fn retain_by_mask<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    items.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
}

fn flatten_record(record: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    match record {
        Value::Object(map) => flatten_into(None, map, &mut out),
        other => out.push((SCALAR_COLUMN.to_string(), other.clone())),
    }
    out
}

fn flatten_into(prefix: Option<&str>, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let name = match prefix {
            Some(p) => format!("{}{}{}", p, KEY_SEPARATOR, key),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(Some(&name), nested, out),
            other => out.push((name, other.clone())),
        }
    }
}
