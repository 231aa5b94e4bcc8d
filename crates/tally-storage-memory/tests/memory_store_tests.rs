use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tally_core::{CoreError, DocumentStore, Filter, Query};
use tally_storage_memory::MemoryStore;

#[test]
fn create_then_get_round_trips_the_document() {
    let store = MemoryStore::new();
    let id = store
        .create("things", json!({"name": "a", "rank": 1}))
        .expect("create");

    let doc = store.get("things", &id).expect("get");
    assert_eq!(doc.id, id);
    assert_eq!(doc.data["name"], "a");
}

#[test]
fn get_missing_document_is_not_found() {
    let store = MemoryStore::new();
    let err = store.get("things", "nope").expect_err("must fail");
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[test]
fn update_merges_top_level_fields() {
    let store = MemoryStore::new();
    let id = store
        .create("things", json!({"name": "a", "rank": 1}))
        .expect("create");

    store
        .update("things", &id, json!({"rank": 2, "extra": true}))
        .expect("update");

    let doc = store.get("things", &id).expect("get");
    assert_eq!(doc.data["name"], "a", "untouched field survives");
    assert_eq!(doc.data["rank"], 2);
    assert_eq!(doc.data["extra"], true);
}

#[test]
fn replace_overwrites_the_whole_body() {
    let store = MemoryStore::new();
    let id = store
        .create("things", json!({"name": "a", "rank": 1}))
        .expect("create");

    store
        .replace("things", &id, json!({"name": "b"}))
        .expect("replace");

    let doc = store.get("things", &id).expect("get");
    assert_eq!(doc.data, json!({"name": "b"}));
}

#[test]
fn delete_is_permanent() {
    let store = MemoryStore::new();
    let id = store.create("things", json!({})).expect("create");
    store.delete("things", &id).expect("delete");
    assert!(store.is_empty("things"));
    assert!(matches!(
        store.delete("things", &id),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn query_applies_filters_order_and_limit() {
    let store = MemoryStore::new();
    for (user, timestamp) in [("u1", 10), ("u2", 20), ("u1", 30), ("u1", 5)] {
        store
            .create("rows", json!({"userId": user, "timestamp": timestamp}))
            .expect("create");
    }

    let query = Query::new()
        .filter(Filter::equals("userId", "u1"))
        .filter(Filter::greater_or_equal("timestamp", 10))
        .order_by_desc("timestamp")
        .limit(1);
    let result = store.query("rows", &query).expect("query");
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].data["timestamp"], 30);
}

#[test]
fn subscribe_delivers_immediately_and_after_every_mutation() {
    let store = MemoryStore::new();
    store.create("rows", json!({"n": 1})).expect("seed");

    let sizes = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&sizes);
    let subscription = store
        .subscribe(
            "rows",
            Query::new(),
            Box::new(move |docs| seen.lock().unwrap().push(docs.len())),
        )
        .expect("subscribe");

    store.create("rows", json!({"n": 2})).expect("create");
    let id = store.create("rows", json!({"n": 3})).expect("create");
    store.delete("rows", &id).expect("delete");

    drop(subscription);
    assert_eq!(*sizes.lock().unwrap(), vec![1, 2, 3, 2]);
}

#[test]
fn snapshots_stop_after_the_guard_is_dropped() {
    let store = MemoryStore::new();
    let deliveries = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&deliveries);
    let subscription = store
        .subscribe(
            "rows",
            Query::new(),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .expect("subscribe");
    assert_eq!(deliveries.load(Ordering::SeqCst), 1, "initial snapshot");

    drop(subscription);
    store.create("rows", json!({})).expect("create");
    assert_eq!(
        deliveries.load(Ordering::SeqCst),
        1,
        "no delivery after teardown"
    );
}

#[test]
fn subscriptions_only_see_their_own_collection() {
    let store = MemoryStore::new();
    let deliveries = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&deliveries);
    let _subscription = store
        .subscribe(
            "rows",
            Query::new(),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .expect("subscribe");

    store.create("other", json!({})).expect("create");
    assert_eq!(deliveries.load(Ordering::SeqCst), 1);
}

#[test]
fn upsert_creates_then_updates_in_place() {
    let store = MemoryStore::new();
    let key = vec![Filter::equals("slug", "food")];

    let first = store
        .upsert("rows", &key, json!({"slug": "food", "limit": 100}))
        .expect("insert");
    let second = store
        .upsert("rows", &key, json!({"slug": "food", "limit": 250}))
        .expect("update");

    assert_eq!(first, second, "incumbent id preserved");
    assert_eq!(store.len("rows"), 1);
    let doc = store.get("rows", &first).expect("get");
    assert_eq!(doc.data["limit"], 250);
}

#[test]
fn concurrent_upserts_on_one_key_never_duplicate() {
    let store = MemoryStore::new();
    let handles: Vec<_> = (0..8)
        .map(|limit| {
            let store = store.clone();
            std::thread::spawn(move || {
                let key = vec![Filter::equals("slug", "food")];
                store
                    .upsert("rows", &key, json!({"slug": "food", "limit": limit}))
                    .expect("upsert");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }
    assert_eq!(store.len("rows"), 1, "check-then-act race is closed");
}
