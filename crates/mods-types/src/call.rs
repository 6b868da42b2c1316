use crate::reference::{is_ref, split_project_id};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Call record as stored by the trace backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSchema {
    /// Store-assigned id; only absent on records that were never persisted.
    #[serde(default)]
    pub id: Option<String>,
    pub project_id: String,
    /// Fully qualified op reference URI.
    pub op_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub trace_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub exception: Option<String>,
    /// Derived metrics such as latency and per-model token usage.
    #[serde(default)]
    pub summary: Option<Map<String, Value>>,
}

/// Read-side view of one logged invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub project_id: String,
    pub op_name: String,
    pub trace_id: String,
    pub parent_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Inputs with reference values kept as their URI strings.
    pub inputs: Map<String, Value>,
    /// Every distinct reference URI found anywhere in `inputs`, in first-seen order.
    pub input_refs: Vec<String>,
    pub output: Value,
    pub exception: Option<String>,
    pub summary: Option<Map<String, Value>>,
    pub attributes: Map<String, Value>,
}

impl Call {
    pub fn from_schema(schema: CallSchema) -> Result<Self> {
        let id = schema
            .id
            .ok_or_else(|| Error::InvalidInput("Call ID is None".to_string()))?;
        let input_refs = extract_refs(&schema.inputs);

        Ok(Self {
            id,
            project_id: schema.project_id,
            op_name: schema.op_name,
            trace_id: schema.trace_id,
            parent_id: schema.parent_id,
            started_at: schema.started_at,
            ended_at: schema.ended_at,
            inputs: schema.inputs,
            input_refs,
            output: schema.output,
            exception: schema.exception,
            summary: schema.summary,
            attributes: schema.attributes,
        })
    }

    /// `(entity, project)` from the composite project id.
    pub fn entity_project(&self) -> Result<(&str, &str)> {
        split_project_id(&self.project_id)
    }

    pub fn is_trace_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Nested record handed to the table normalizer.
    ///
    /// Timestamps are rendered as RFC 3339 strings so the resulting column is textual.
    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("id".into(), Value::String(self.id.clone()));
        record.insert("trace_id".into(), Value::String(self.trace_id.clone()));
        record.insert("parent_id".into(), opt_string(&self.parent_id));
        record.insert("started_at".into(), timestamp(Some(&self.started_at)));
        record.insert("op_name".into(), Value::String(self.op_name.clone()));
        record.insert("inputs".into(), Value::Object(self.inputs.clone()));
        record.insert(
            "input_refs".into(),
            Value::Array(
                self.input_refs
                    .iter()
                    .map(|r| Value::String(r.clone()))
                    .collect(),
            ),
        );
        record.insert("output".into(), self.output.clone());
        record.insert("exception".into(), opt_string(&self.exception));
        record.insert("attributes".into(), Value::Object(self.attributes.clone()));
        record.insert(
            "summary".into(),
            self.summary
                .as_ref()
                .map(|s| Value::Object(s.clone()))
                .unwrap_or(Value::Null),
        );
        record.insert("ended_at".into(), timestamp(self.ended_at.as_ref()));
        Value::Object(record)
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn timestamp(ts: Option<&DateTime<Utc>>) -> Value {
    ts.map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::Micros, true)))
        .unwrap_or(Value::Null)
}

/// Collect reference URIs from arbitrarily nested values.
pub fn extract_refs(values: &Map<String, Value>) -> Vec<String> {
    let mut refs = Vec::new();
    for value in values.values() {
        collect_refs(value, &mut refs);
    }
    refs
}

/// Collect reference URIs from a single value (e.g. a call output).
pub fn extract_value_refs(value: &Value) -> Vec<String> {
    let mut refs = Vec::new();
    collect_refs(value, &mut refs);
    refs
}

fn collect_refs(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::String(s) if is_ref(s) => {
            if !refs.iter().any(|r| r == s) {
                refs.push(s.clone());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_refs(v, refs)),
        Value::Object(map) => map.values().for_each(|v| collect_refs(v, refs)),
        _ => {}
    }
}
