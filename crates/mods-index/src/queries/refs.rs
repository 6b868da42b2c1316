use mods_types::{ObjectRef, RefKind, parse_uri};
use rusqlite::Connection;
use serde_json::Value;

use super::{calls, objects};
use crate::{Error, Result};

/// Resolve one reference URI to its stored value, following any extra path.
pub fn read_ref(conn: &Connection, uri: &str) -> Result<Value> {
    let reference = parse_uri(uri)?;
    let root = read_base(conn, &reference)?;
    descend(root, &reference)
}

fn read_base(conn: &Connection, reference: &ObjectRef) -> Result<Value> {
    let project_id = reference.project_id();
    match reference.kind {
        RefKind::Object | RefKind::Op => {
            objects::get_version(conn, &project_id, &reference.name, &reference.digest)?
                .map(|obj| obj.val)
                .ok_or_else(|| Error::NotFound(reference.base().uri()))
        }
        RefKind::Call => {
            let call = calls::get_call(conn, &project_id, &reference.name)?
                .ok_or_else(|| Error::NotFound(reference.base().uri()))?;
            Ok(serde_json::to_value(call)?)
        }
        RefKind::Table => Err(Error::Query(format!(
            "table refs are not supported: {}",
            reference.uri()
        ))),
    }
}

// Extra pairs: `key`/`attr` index a mapping, `index` an array position,
// `id` the array element whose `id` (or `digest`) equals the value.
fn descend(mut current: Value, reference: &ObjectRef) -> Result<Value> {
    let missing = || Error::NotFound(reference.uri());

    for (edge, part) in reference.extra_pairs() {
        current = match (edge, current) {
            ("key" | "attr", Value::Object(mut map)) => map.remove(part).ok_or_else(missing)?,
            ("index", Value::Array(mut items)) => {
                let idx: usize = part
                    .parse()
                    .map_err(|_| Error::Query(format!("invalid index '{}'", part)))?;
                if idx >= items.len() {
                    return Err(missing());
                }
                items.swap_remove(idx)
            }
            ("id", Value::Array(items)) => items
                .into_iter()
                .find(|item| {
                    ["id", "digest"]
                        .iter()
                        .any(|k| item.get(*k).and_then(Value::as_str) == Some(part))
                })
                .ok_or_else(missing)?,
            ("key" | "attr" | "index" | "id", _) => return Err(missing()),
            (other, _) => {
                return Err(Error::Query(format!("unsupported ref edge '{}'", other)));
            }
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descend_uri(value: Value, uri: &str) -> Result<Value> {
        descend(value, &parse_uri(uri).unwrap())
    }

    #[test]
    fn test_descend_key_index_id() {
        let value = json!({
            "rows": [
                {"id": "r1", "text": "a"},
                {"id": "r2", "text": "b"}
            ]
        });
        let base = "weave:///e/p/object/ds:abc";

        assert_eq!(
            descend_uri(value.clone(), &format!("{}/key/rows/index/1", base)).unwrap(),
            json!({"id": "r2", "text": "b"})
        );
        assert_eq!(
            descend_uri(value.clone(), &format!("{}/attr/rows/id/r1/key/text", base)).unwrap(),
            json!("a")
        );
        assert!(matches!(
            descend_uri(value, &format!("{}/key/rows/index/5", base)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_descend_unknown_edge() {
        let err = descend_uri(json!({}), "weave:///e/p/object/ds:abc/weird/x").unwrap_err();
        assert!(err.to_string().contains("unsupported ref edge"));
    }
}
