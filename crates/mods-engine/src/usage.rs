//! Usage-metric column merging.
//!
//! A call that fans out to several models reports usage per model, which flattens
//! into columns like `summary.usage.gpt-4o.total_tokens` and
//! `summary.usage.claude-3.total_tokens`. Merging keeps only the trailing metric
//! name and folds colliding columns into one per row.

use crate::table::{KEY_SEPARATOR, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

pub const DEFAULT_USAGE_PREFIX: &str = "summary.usage";

/// How colliding usage columns are folded into one value per row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageAggregation {
    /// Numeric sum; nulls count as zero, so an all-null group yields 0.
    #[default]
    Sum,
    /// Largest numeric value; null when no value is present.
    Max,
    /// Right-most non-null value in column order.
    Last,
}

/// Rename every `{prefix}.….{metric}` column to `{prefix}.{metric}` and fold
/// collisions with `how`.
///
/// Merged columns replace the originals and are appended after all other
/// columns, sorted by name. Non-numeric cells are ignored by `Sum` and `Max`.
pub fn merge_usage_columns(table: &mut Table, prefix: &str, how: UsageAggregation) {
    let nested_prefix = format!("{}{}", prefix, KEY_SEPARATOR);
    let usage_columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| c.starts_with(&nested_prefix))
        .cloned()
        .collect();
    if usage_columns.is_empty() {
        return;
    }

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for name in &usage_columns {
        let metric = name.rsplit(KEY_SEPARATOR).next().unwrap_or(name.as_str());
        let merged = format!("{}{}", nested_prefix, metric);
        if let Some(pos) = table.column_position(name) {
            groups.entry(merged).or_default().push(pos);
        }
    }

    let merged: Vec<(String, Vec<Value>)> = groups
        .into_iter()
        .map(|(name, positions)| {
            let values = table
                .rows()
                .iter()
                .map(|row| {
                    let cells = positions.iter().map(|&p| &row[p]);
                    aggregate(cells, how)
                })
                .collect();
            (name, values)
        })
        .collect();

    table.drop_columns(&usage_columns);
    for (name, values) in merged {
        // lengths come from the same rows, so this cannot fail
        let _ = table.push_column(name, values);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn from_value(value: &Value) -> Option<Self> {
        let Value::Number(n) = value else {
            return None;
        };
        match n.as_i64() {
            Some(i) => Some(Num::Int(i)),
            None => n.as_f64().map(Num::Float),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn add(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => match a.checked_add(b) {
                Some(sum) => Num::Int(sum),
                None => Num::Float(a as f64 + b as f64),
            },
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        }
    }

    fn max(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a.max(b)),
            (a, b) => Num::Float(a.as_f64().max(b.as_f64())),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::from(i),
            Num::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

fn aggregate<'a>(cells: impl Iterator<Item = &'a Value>, how: UsageAggregation) -> Value {
    match how {
        UsageAggregation::Sum => cells
            .filter_map(Num::from_value)
            .fold(Num::Int(0), Num::add)
            .into_value(),
        UsageAggregation::Max => cells
            .filter_map(Num::from_value)
            .reduce(Num::max)
            .map(Num::into_value)
            .unwrap_or(Value::Null),
        UsageAggregation::Last => cells
            .filter(|v| !v.is_null())
            .last()
            .cloned()
            .unwrap_or(Value::Null),
    }
}
