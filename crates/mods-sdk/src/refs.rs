use crate::cache::{CacheKey, QueryCache};
use crate::client::Client;
use crate::{Error, Result};
use mods_engine::Table;
use mods_types::{RefsReadBatchReq, parse_uri};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Key under which stored values expose their own reference URI.
pub const REF_KEY: &str = "_ref";

/// Replace every object that carries its own reference with that URI string.
///
/// Maps and arrays are walked recursively; everything else is returned as is.
pub fn simple_val(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(uri)) = map.get(REF_KEY)
                && parse_uri(uri).is_ok()
            {
                return Value::String(uri.clone());
            }
            Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, simple_val(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(simple_val).collect()),
        other => other,
    }
}

impl Client {
    /// Resolve `refs` with one batch read and flatten the values into a table.
    ///
    /// Duplicates are read once but produce one row each; the row index is
    /// `refs` exactly as given.
    pub fn resolve_refs<S: AsRef<str>>(&self, refs: &[S]) -> Result<Table> {
        let refs: Vec<String> = refs.iter().map(|r| r.as_ref().to_string()).collect();
        if refs.is_empty() {
            let mut table = Table::default();
            table.set_index(Vec::new())?;
            return Ok(table);
        }

        let mut unique: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for r in &refs {
            if seen.insert(r.as_str()) {
                unique.push(r.clone());
            }
        }

        let req = RefsReadBatchReq {
            refs: unique.clone(),
        };
        let res = self.store().refs_read_batch(&req).map_err(Error::Backend)?;
        if res.vals.len() != unique.len() {
            return Err(Error::Backend(anyhow::anyhow!(
                "refs_read_batch returned {} values for {} refs",
                res.vals.len(),
                unique.len()
            )));
        }

        let resolved: HashMap<String, Value> = unique
            .into_iter()
            .zip(res.vals.into_iter().map(simple_val))
            .collect();
        let records: Vec<Value> = refs
            .iter()
            .map(|r| resolved.get(r).cloned().unwrap_or(Value::Null))
            .collect();

        let mut table = Table::from_records(&records);
        table.set_index(refs)?;
        Ok(table)
    }

    /// [`resolve_refs`](Self::resolve_refs) through `cache`.
    pub fn resolve_refs_cached<S: AsRef<str>>(
        &self,
        refs: &[S],
        cache: &QueryCache,
    ) -> Result<Table> {
        let params: Vec<&str> = refs.iter().map(|r| r.as_ref()).collect();
        let key = CacheKey::new("refs", self.project_id(), &params)?;
        cache.get_or_compute(&key, || self.resolve_refs(refs))
    }
}
