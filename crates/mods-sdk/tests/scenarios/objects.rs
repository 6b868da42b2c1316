use crate::client_with_pages;
use mods_testing::{CallBuilder, StubStore, obj_uri, obj_version, op_uri};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_latest_only_dedups_even_when_backend_does_not() {
    let store = Arc::new(StubStore::new().with_objs([
        obj_version("a", 0, true),
        obj_version("a", 2, true),
        obj_version("a", 1, true),
        obj_version("b", 0, true),
    ]));
    let client = client_with_pages(&store, 50);

    let ops = client.get_ops(true).unwrap();

    let got: Vec<(&str, i64)> = ops
        .iter()
        .map(|o| (o.name.as_str(), o.version_index))
        .collect();
    assert_eq!(got, vec![("a", 2), ("b", 0)]);

    let sent = &store.objs_requests()[0].filter;
    assert_eq!(sent.is_op, Some(true));
    assert_eq!(sent.latest_only, Some(true));
}

#[test]
fn test_get_ops_without_latest_only_keeps_all_versions() {
    let store = Arc::new(
        StubStore::new().with_objs([obj_version("a", 0, true), obj_version("a", 1, true)]),
    );
    let client = client_with_pages(&store, 50);

    assert_eq!(client.get_ops(false).unwrap().len(), 2);
}

#[test]
fn test_op_versions_reversed_with_call_counts() {
    let v0 = obj_version("predict", 0, true);
    let v1 = obj_version("predict", 1, true);
    let v2 = obj_version("predict", 2, true);
    let store = Arc::new(
        StubStore::new()
            .with_objs([v0.clone(), v1.clone(), v2.clone(), obj_version("other", 0, true)])
            .with_calls([
                CallBuilder::new("c1").op("predict", &v0.digest).build(),
                CallBuilder::new("c2").op("predict", &v0.digest).build(),
                CallBuilder::new("c3").op("predict", &v2.digest).build(),
            ]),
    );
    let client = client_with_pages(&store, 50);
    let latest = client.get_ops(true).unwrap().remove(0);

    let versions = client.get_op_versions(&latest, true).unwrap();

    let got: Vec<(i64, Option<usize>)> = versions
        .iter()
        .map(|o| (o.version_index, o.call_count))
        .collect();
    assert_eq!(got, vec![(2, Some(1)), (1, Some(0)), (0, Some(2))]);

    let count_query = store.calls_requests()[0].filter.op_names.clone().unwrap();
    assert_eq!(count_query.len(), 3);
    assert!(count_query.contains(&op_uri("predict", &v1.digest)));
}

#[test]
fn test_op_versions_without_calls_all_zero() {
    let store = Arc::new(
        StubStore::new().with_objs([obj_version("f", 0, true), obj_version("f", 1, true)]),
    );
    let client = client_with_pages(&store, 50);
    let op = client.get_ops(true).unwrap().remove(0);

    let versions = client.get_op_versions(&op, true).unwrap();

    assert!(versions.iter().all(|v| v.call_count == Some(0)));
    assert_eq!(versions[0].label(), "f:v1");
}

#[test]
fn test_objs_newest_first_and_type_filter() {
    let mut dataset = obj_version("eval_set", 1, false);
    dataset.base_object_class = Some("Dataset".to_string());
    let mut older = obj_version("eval_set", 0, false);
    older.base_object_class = Some("Dataset".to_string());
    let mut model = obj_version("model", 3, false);
    model.base_object_class = Some("Model".to_string());

    let store = Arc::new(StubStore::new().with_objs([older, dataset, model]));
    let client = client_with_pages(&store, 50);

    let all = client.get_objs(None, true).unwrap();
    let labels: Vec<String> = all.iter().map(|o| o.label()).collect();
    assert_eq!(labels, vec!["model:v3", "eval_set:v1"]);

    let datasets = client.get_objs(Some(&["Dataset"]), false).unwrap();
    let labels: Vec<String> = datasets.iter().map(|o| o.label()).collect();
    assert_eq!(labels, vec!["eval_set:v1", "eval_set:v0"]);
    assert_eq!(
        store.objs_requests()[1].filter.base_object_classes,
        Some(vec!["Dataset".to_string()])
    );
}

#[test]
fn test_get_obj_reads_body() {
    let obj = obj_version("eval_set", 0, false);
    let uri = obj_uri(&obj.object_id, &obj.digest);
    let store = Arc::new(
        StubStore::new()
            .with_objs([obj])
            .with_ref(&uri, json!({"rows": [1, 2, 3]})),
    );
    let client = client_with_pages(&store, 50);
    let listed = client.get_objs(None, true).unwrap().remove(0);

    assert_eq!(listed.uri(), uri);
    assert_eq!(client.get_obj(&listed).unwrap(), json!({"rows": [1, 2, 3]}));
    assert_eq!(store.refs_requests()[0].refs, vec![uri]);
}
