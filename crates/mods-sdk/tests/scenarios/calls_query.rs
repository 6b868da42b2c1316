use crate::client_with_pages;
use mods_sdk::{CallsFilter, Op, OpSelector, SortBy};
use mods_testing::{CallBuilder, PROJECT_ID, StubStore, obj_uri, op_uri};
use serde_json::json;
use std::sync::Arc;

fn fixture() -> Arc<StubStore> {
    Arc::new(StubStore::new().with_calls([
        CallBuilder::new("root")
            .op("evaluate", "e1")
            .minute(0)
            .input("dataset", obj_uri("dataset", "d1"))
            .build(),
        CallBuilder::new("p1")
            .op("predict", "d1")
            .trace("trace-root")
            .parent("root")
            .minute(1)
            .input("model", obj_uri("Model", "m1"))
            .usage("gpt-4o", 7, 3)
            .usage("claude-3.5", 4, 1)
            .build(),
        CallBuilder::new("p2")
            .op("predict", "d2")
            .trace("trace-root")
            .parent("root")
            .minute(2)
            .usage("gpt-4o", 1, 1)
            .build(),
    ]))
}

#[test]
fn test_bare_name_matches_every_version() {
    let store = fixture();
    let client = client_with_pages(&store, 50);

    let calls = client.get_calls("predict").unwrap();

    assert_eq!(calls.len(), 2);
    let sent = &store.calls_requests()[0];
    assert_eq!(sent.project_id, PROJECT_ID);
    assert_eq!(sent.filter.op_names, Some(vec![op_uri("predict", "*")]));
}

#[test]
fn test_names_with_version_and_full_refs() {
    let store = fixture();
    let client = client_with_pages(&store, 50);

    let calls = client
        .get_calls(vec!["predict:d2", "weave:///ent/proj/op/evaluate:e1"])
        .unwrap();

    assert_eq!(calls.len(), 2);
    assert_eq!(
        store.calls_requests()[0].filter.op_names,
        Some(vec![
            op_uri("predict", "d2"),
            "weave:///ent/proj/op/evaluate:e1".to_string()
        ])
    );
}

#[test]
fn test_op_handles_select_exact_versions() {
    let store = fixture();
    let client = client_with_pages(&store, 50);
    let op = Op {
        project_id: PROJECT_ID.to_string(),
        name: "predict".to_string(),
        digest: "d1".to_string(),
        version_index: 0,
        call_count: None,
    };

    let calls = client.calls().op(vec![op]).fetch().unwrap();

    assert_eq!(calls.len(), 1);
    assert_eq!(calls.table().get(0, "id"), Some(&json!("p1")));
}

#[test]
fn test_explicit_filter_takes_precedence() {
    let store = fixture();
    let client = client_with_pages(&store, 50);

    let calls = client
        .calls()
        .op("evaluate")
        .input_ref(obj_uri("dataset", "d1"))
        .trace_roots_only(true)
        .filter(CallsFilter::new().call_ids(vec!["p2".to_string()]))
        .fetch()
        .unwrap();

    assert_eq!(calls.len(), 1);
    let sent = &store.calls_requests()[0].filter;
    assert_eq!(sent.op_names, None);
    assert_eq!(sent.input_refs, None);
    assert_eq!(sent.trace_roots_only, None);
}

#[test]
fn test_input_refs_and_trace_roots() {
    let store = fixture();
    let client = client_with_pages(&store, 50);

    let by_model = client
        .calls()
        .input_refs([obj_uri("Model", "m1")])
        .fetch()
        .unwrap();
    assert_eq!(by_model.table().get(0, "id"), Some(&json!("p1")));

    let roots = client.calls().trace_roots_only(true).fetch().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots.table().get(0, "id"), Some(&json!("root")));
}

#[test]
fn test_empty_result_short_circuits() {
    let store = fixture();
    let client = client_with_pages(&store, 50);

    let calls = client.get_calls("nonexistent").unwrap();

    assert!(calls.is_empty());
    assert!(calls.table().columns().is_empty());
    assert_eq!(calls.to_string(), "Calls(rows=0, columns=[\n  \n])");
}

#[test]
fn test_usage_is_merged_per_metric() {
    let store = fixture();
    let client = client_with_pages(&store, 50);

    let calls = client.get_calls(OpSelector::All).unwrap();
    let table = calls.table();

    assert_eq!(table.get(1, "summary.usage.total_tokens"), Some(&json!(15)));
    assert_eq!(table.get(1, "summary.usage.requests"), Some(&json!(2)));
    assert_eq!(table.get(2, "summary.usage.total_tokens"), Some(&json!(2)));
    assert_eq!(table.get(0, "summary.usage.total_tokens"), Some(&json!(0)));
    assert_eq!(table.get(1, "op_name.name"), Some(&json!("predict")));
    assert_eq!(table.get(1, "op_name.version"), Some(&json!("d1")));
}

#[test]
fn test_children_of_call() {
    let store = fixture();
    let client = client_with_pages(&store, 50);
    let root = client
        .calls()
        .trace_roots_only(true)
        .iter()
        .unwrap()
        .nth_call(0)
        .unwrap();

    let children: Vec<String> = client
        .children(&root)
        .map(|c| c.unwrap().id)
        .collect();

    assert_eq!(children, vec!["p1", "p2"]);
    assert_eq!(
        store.calls_requests().last().unwrap().filter.parent_ids,
        Some(vec!["root".to_string()])
    );
}

#[test]
fn test_columns_and_sort_are_forwarded() {
    let store = fixture();
    let client = client_with_pages(&store, 50);

    client
        .calls()
        .columns(["inputs", "summary"])
        .sort_by(vec![SortBy::desc("started_at")])
        .fetch()
        .unwrap();

    let sent = &store.calls_requests()[0];
    assert_eq!(
        sent.columns,
        Some(vec!["inputs".to_string(), "summary".to_string()])
    );
    assert_eq!(sent.sort_by, Some(vec![SortBy::desc("started_at")]));
}
