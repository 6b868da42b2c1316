use crate::client_with_pages;
use mods_sdk::{Error, ObjectRef};
use mods_testing::{StubStore, obj_uri};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_duplicate_refs_resolved_once_and_broadcast() {
    let r1 = obj_uri("Model", "m1");
    let r2 = obj_uri("Prompt", "p1");
    let store = Arc::new(
        StubStore::new()
            .with_ref(&r1, json!({"name": "gpt", "params": {"temperature": 0.2}}))
            .with_ref(&r2, json!({"text": "hi"})),
    );
    let client = client_with_pages(&store, 50);

    let table = client
        .resolve_refs(&[r1.clone(), r1.clone(), r2.clone()])
        .unwrap();

    let batches = store.refs_requests();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].refs, vec![r1.clone(), r2.clone()]);

    assert_eq!(table.len(), 3);
    assert_eq!(table.index().unwrap(), &[r1.clone(), r1.clone(), r2.clone()]);
    assert_eq!(table.row(0), table.row(1));
    assert_eq!(table.get(0, "params.temperature"), Some(&json!(0.2)));
    assert_eq!(table.get(2, "text"), Some(&json!("hi")));
    assert_eq!(table.get(2, "name"), Some(&json!(null)));
}

#[test]
fn test_nested_refs_are_simplified_to_uris() {
    let outer = obj_uri("Evaluation", "e1");
    let inner = obj_uri("Dataset", "d1");
    let store = Arc::new(StubStore::new().with_ref(
        &outer,
        json!({"dataset": {"_ref": inner, "rows": 100}, "scorers": [{"_ref": inner}]}),
    ));
    let client = client_with_pages(&store, 50);

    let table = client.resolve_refs(&[outer.as_str()]).unwrap();

    assert_eq!(table.get(0, "dataset"), Some(&json!(inner)));
    assert_eq!(table.get(0, "scorers"), Some(&json!([inner])));
}

#[test]
fn test_scalar_values_land_in_value_column() {
    let r = obj_uri("threshold", "t1");
    let store = Arc::new(StubStore::new().with_ref(&r, json!(0.75)));
    let client = client_with_pages(&store, 50);

    let table = client.resolve_refs(&[r.as_str()]).unwrap();

    assert_eq!(table.columns(), &["value".to_string()]);
    assert_eq!(table.get(0, "value"), Some(&json!(0.75)));
}

#[test]
fn test_parsed_ref_reserializes_to_resolvable_uri() {
    let uri = "weave:///e/p/object/foo:abc123";
    let parsed: ObjectRef = uri.parse().unwrap();
    assert_eq!(parsed.name, "foo");
    assert!(parsed.digest.starts_with("abc123"));

    let store = Arc::new(StubStore::new().with_ref(uri, json!({"ok": true})));
    let client = client_with_pages(&store, 50);

    let table = client.resolve_refs(&[parsed.uri()]).unwrap();
    assert_eq!(table.get(0, "ok"), Some(&json!(true)));
}

#[test]
fn test_empty_input_makes_no_request() {
    let store = Arc::new(StubStore::new());
    let client = client_with_pages(&store, 50);

    let table = client.resolve_refs::<&str>(&[]).unwrap();

    assert!(table.is_empty());
    assert!(store.refs_requests().is_empty());
}

#[test]
fn test_backend_failure_propagates() {
    let store = Arc::new(StubStore::new().failing_refs());
    let client = client_with_pages(&store, 50);

    let err = client.resolve_refs(&[obj_uri("a", "b")]).unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
}
