use crate::client_with_pages;
use mods_testing::{CallBuilder, StubStore};
use std::cell::RefCell;
use std::sync::Arc;

fn store_with(n: usize) -> Arc<StubStore> {
    Arc::new(StubStore::new().with_calls(
        (0..n).map(|i| CallBuilder::new(&format!("c{:03}", i)).minute(i as i64).build()),
    ))
}

#[test]
fn test_returns_min_of_records_and_limit() {
    for (records, limit, expected) in [(25, 100, 25), (25, 10, 10), (20, 20, 20), (0, 5, 0)] {
        let store = store_with(records);
        let client = client_with_pages(&store, 5);
        let progress = RefCell::new(Vec::new());

        let calls = client
            .calls()
            .limit(limit)
            .on_progress(|total| progress.borrow_mut().push(total))
            .fetch()
            .unwrap();

        assert_eq!(calls.len(), expected, "records={} limit={}", records, limit);
        assert_eq!(progress.borrow().last().copied(), Some(expected));
    }
}

#[test]
fn test_pages_use_increasing_offsets_and_stop_on_short_page() {
    let store = store_with(12);
    let client = client_with_pages(&store, 5);

    client.calls().fetch().unwrap();

    let offsets: Vec<(usize, Option<usize>)> = store
        .calls_requests()
        .iter()
        .map(|r| (r.offset, r.limit))
        .collect();
    assert_eq!(offsets, vec![(0, Some(5)), (5, Some(5)), (10, Some(5))]);
}

#[test]
fn test_limit_on_page_boundary_makes_no_extra_request() {
    let store = store_with(30);
    let client = client_with_pages(&store, 5);

    let calls = client.calls().limit(10).fetch().unwrap();

    assert_eq!(calls.len(), 10);
    assert_eq!(store.page_requests(), 2);
}

#[test]
fn test_progress_reports_running_total_per_page() {
    let store = store_with(12);
    let client = client_with_pages(&store, 5);
    let progress = RefCell::new(Vec::new());

    client
        .calls()
        .on_progress(|total| progress.borrow_mut().push(total))
        .fetch()
        .unwrap();

    assert_eq!(*progress.borrow(), vec![5, 10, 12]);
}

#[test]
fn test_iterator_is_lazy() {
    let store = store_with(50);
    let client = client_with_pages(&store, 5);

    let mut iter = client.calls().iter().unwrap();
    assert_eq!(store.page_requests(), 0);

    let first_three: Vec<_> = iter.by_ref().take(3).collect();
    assert_eq!(first_three.len(), 3);
    assert_eq!(store.page_requests(), 1);

    let sixth = iter.nth_call(2).unwrap();
    assert_eq!(sixth.id, "c005");
    assert_eq!(store.page_requests(), 2);
}

#[test]
fn test_nth_call_out_of_range() {
    let store = store_with(3);
    let client = client_with_pages(&store, 5);

    let err = client.calls().iter().unwrap().nth_call(7).unwrap_err();
    assert!(matches!(err, mods_sdk::Error::InvalidInput(_)));
}

#[test]
fn test_backend_error_propagates_unchanged() {
    let store = Arc::new(
        StubStore::new()
            .with_calls((0..20).map(|i| CallBuilder::new(&format!("c{}", i)).build()))
            .failing_calls_on_request(1),
    );
    let client = client_with_pages(&store, 5);

    let err = client.calls().fetch().unwrap_err();
    assert!(matches!(err, mods_sdk::Error::Backend(_)));
    assert!(err.to_string().contains("stub backend unavailable"));
    assert_eq!(store.page_requests(), 2);
}

#[test]
fn test_call_without_id_is_rejected() {
    let store = Arc::new(StubStore::new().with_calls([CallBuilder::new("x").without_id().build()]));
    let client = client_with_pages(&store, 5);

    let err = client.calls().fetch().unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: Call ID is None");
}
