//! Fixtures for call and object records.
//!
//! All timestamps are anchored at 2025-03-01T12:00:00Z so ordering in tests
//! is driven by explicit minute offsets.

use chrono::{DateTime, Duration, TimeZone, Utc};
use mods_types::{CallSchema, ObjSchema};
use serde_json::{Map, Value, json};

/// Project every fixture lives in.
pub const PROJECT_ID: &str = "ent/proj";

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// `weave:///ent/proj/op/{name}:{digest}`
pub fn op_uri(name: &str, digest: &str) -> String {
    format!("weave:///{}/op/{}:{}", PROJECT_ID, name, digest)
}

/// `weave:///ent/proj/object/{name}:{digest}`
pub fn obj_uri(name: &str, digest: &str) -> String {
    format!("weave:///{}/object/{}:{}", PROJECT_ID, name, digest)
}

/// Builder for `CallSchema` records.
///
/// # Example
/// ```
/// use mods_testing::CallBuilder;
///
/// let call = CallBuilder::new("c1")
///     .op("predict", "d1")
///     .minute(3)
///     .input("question", "hi")
///     .usage("gpt-4o", 7, 3)
///     .build();
/// assert_eq!(call.id.as_deref(), Some("c1"));
/// ```
#[derive(Debug, Clone)]
pub struct CallBuilder {
    schema: CallSchema,
}

impl CallBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            schema: CallSchema {
                id: Some(id.to_string()),
                project_id: PROJECT_ID.to_string(),
                op_name: op_uri("predict", "d1"),
                display_name: None,
                trace_id: format!("trace-{}", id),
                parent_id: None,
                started_at: base_time(),
                ended_at: None,
                attributes: Map::new(),
                inputs: Map::new(),
                output: Value::Null,
                exception: None,
                summary: None,
            },
        }
    }

    pub fn op(mut self, name: &str, digest: &str) -> Self {
        self.schema.op_name = op_uri(name, digest);
        self
    }

    pub fn op_uri(mut self, uri: impl Into<String>) -> Self {
        self.schema.op_name = uri.into();
        self
    }

    pub fn trace(mut self, trace_id: &str) -> Self {
        self.schema.trace_id = trace_id.to_string();
        self
    }

    /// Child of `parent_id`, sharing the caller-supplied trace.
    pub fn parent(mut self, parent_id: &str) -> Self {
        self.schema.parent_id = Some(parent_id.to_string());
        self
    }

    /// Start `minute` minutes after the fixture epoch; ends 30 seconds later.
    pub fn minute(mut self, minute: i64) -> Self {
        self.schema.started_at = base_time() + Duration::minutes(minute);
        self.schema.ended_at = Some(self.schema.started_at + Duration::seconds(30));
        self
    }

    pub fn input(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.schema.inputs.insert(key.to_string(), value.into());
        self
    }

    pub fn output(mut self, value: Value) -> Self {
        self.schema.output = value;
        self
    }

    pub fn exception(mut self, message: &str) -> Self {
        self.schema.exception = Some(message.to_string());
        self
    }

    pub fn attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.schema.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn summary_field(mut self, key: &str, value: Value) -> Self {
        self.schema
            .summary
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        self
    }

    /// Per-model token usage under `summary.usage.{model}`.
    pub fn usage(mut self, model: &str, prompt_tokens: i64, completion_tokens: i64) -> Self {
        let summary = self.schema.summary.get_or_insert_with(Map::new);
        let usage = summary
            .entry("usage")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(models) = usage {
            models.insert(
                model.to_string(),
                json!({
                    "requests": 1,
                    "prompt_tokens": prompt_tokens,
                    "completion_tokens": completion_tokens,
                    "total_tokens": prompt_tokens + completion_tokens
                }),
            );
        }
        self
    }

    pub fn without_id(mut self) -> Self {
        self.schema.id = None;
        self
    }

    pub fn build(self) -> CallSchema {
        self.schema
    }
}

/// One object version; the digest is derived from name and version so it is
/// unique and parses as a reference digest.
pub fn obj_version(object_id: &str, version_index: i64, is_op: bool) -> ObjSchema {
    ObjSchema {
        project_id: PROJECT_ID.to_string(),
        object_id: object_id.to_string(),
        created_at: base_time() + Duration::minutes(version_index),
        digest: format!("{}v{}", object_id.replace(['.', '_', '-'], ""), version_index),
        version_index,
        is_op,
        base_object_class: None,
        val: json!({"name": object_id, "version": version_index}),
    }
}
