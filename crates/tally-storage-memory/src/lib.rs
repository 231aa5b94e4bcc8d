//! In-process reference implementation of the store and identity contracts.
//!
//! Stands in for the cloud document database and auth service in tests and
//! local tooling: collections of JSON documents, one-shot queries, live
//! full-snapshot subscriptions, and an atomic natural-key upsert. All
//! mutations and the upsert's check-then-write run under a single lock, so
//! the duplicate-budget race of a client-side query-then-branch upsert
//! cannot occur here.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use tally_core::{
    CoreError, CoreResult, Direction, Document, DocumentStore, Filter, Identity, Observer, Query,
    Subscription,
};

fn lock(mutex: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Subscriber {
    id: u64,
    collection: String,
    query: Query,
    observer: Arc<Observer>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    subscribers: Vec<Subscriber>,
    next_subscriber: u64,
}

impl Inner {
    fn docs(&self, collection: &str) -> &[Document] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn docs_mut(&mut self, collection: &str) -> &mut Vec<Document> {
        self.collections.entry(collection.to_string()).or_default()
    }

    fn position(&self, collection: &str, id: &str) -> Option<usize> {
        self.docs(collection).iter().position(|doc| doc.id == id)
    }

    /// Snapshots to deliver after a mutation of `collection`. Computed under
    /// the lock; invoked by the caller after releasing it.
    fn pending_deliveries(&self, collection: &str) -> Vec<(Arc<Observer>, Vec<Document>)> {
        self.subscribers
            .iter()
            .filter(|sub| sub.collection == collection)
            .map(|sub| {
                let snapshot = run_query(self.docs(collection), &sub.query);
                (Arc::clone(&sub.observer), snapshot)
            })
            .collect()
    }
}

/// Thread-safe in-memory document store with live subscriptions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection.
    pub fn len(&self, collection: &str) -> usize {
        lock(&self.inner).docs(collection).len()
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn deliver(deliveries: Vec<(Arc<Observer>, Vec<Document>)>) {
        for (observer, snapshot) in deliveries {
            (*observer)(&snapshot);
        }
    }
}

impl DocumentStore for MemoryStore {
    fn create(&self, collection: &str, data: Value) -> CoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let deliveries = {
            let mut inner = lock(&self.inner);
            inner.docs_mut(collection).push(Document::new(id.clone(), data));
            inner.pending_deliveries(collection)
        };
        debug!(collection, %id, "document created");
        Self::deliver(deliveries);
        Ok(id)
    }

    fn get(&self, collection: &str, id: &str) -> CoreResult<Document> {
        let inner = lock(&self.inner);
        inner
            .docs(collection)
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
            .ok_or_else(|| not_found(collection, id))
    }

    fn update(&self, collection: &str, id: &str, fields: Value) -> CoreResult<()> {
        let Value::Object(fields) = fields else {
            return Err(CoreError::Store(
                "partial update requires an object of fields".into(),
            ));
        };
        let deliveries = {
            let mut inner = lock(&self.inner);
            let position = inner
                .position(collection, id)
                .ok_or_else(|| not_found(collection, id))?;
            let doc = &mut inner.docs_mut(collection)[position];
            match doc.data.as_object_mut() {
                Some(body) => {
                    for (field, value) in fields {
                        body.insert(field, value);
                    }
                }
                None => {
                    return Err(CoreError::Store(format!(
                        "document {collection}/{id} is not an object"
                    )))
                }
            }
            inner.pending_deliveries(collection)
        };
        debug!(collection, id, "document updated");
        Self::deliver(deliveries);
        Ok(())
    }

    fn replace(&self, collection: &str, id: &str, data: Value) -> CoreResult<()> {
        let deliveries = {
            let mut inner = lock(&self.inner);
            let position = inner
                .position(collection, id)
                .ok_or_else(|| not_found(collection, id))?;
            inner.docs_mut(collection)[position].data = data;
            inner.pending_deliveries(collection)
        };
        debug!(collection, id, "document replaced");
        Self::deliver(deliveries);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> CoreResult<()> {
        let deliveries = {
            let mut inner = lock(&self.inner);
            let position = inner
                .position(collection, id)
                .ok_or_else(|| not_found(collection, id))?;
            inner.docs_mut(collection).remove(position);
            inner.pending_deliveries(collection)
        };
        debug!(collection, id, "document deleted");
        Self::deliver(deliveries);
        Ok(())
    }

    fn query(&self, collection: &str, query: &Query) -> CoreResult<Vec<Document>> {
        let inner = lock(&self.inner);
        Ok(run_query(inner.docs(collection), query))
    }

    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        observer: Observer,
    ) -> CoreResult<Subscription> {
        let observer = Arc::new(observer);
        let (subscriber_id, initial) = {
            let mut inner = lock(&self.inner);
            let subscriber_id = inner.next_subscriber;
            inner.next_subscriber += 1;
            let initial = run_query(inner.docs(collection), &query);
            inner.subscribers.push(Subscriber {
                id: subscriber_id,
                collection: collection.to_string(),
                query,
                observer: Arc::clone(&observer),
            });
            (subscriber_id, initial)
        };
        debug!(collection, subscriber_id, "subscription opened");

        // First delivery happens outside the lock, like every later one.
        (*observer)(&initial);

        let inner = Arc::clone(&self.inner);
        Ok(Subscription::new(move || {
            let mut guard = lock(&inner);
            guard.subscribers.retain(|sub| sub.id != subscriber_id);
            debug!(subscriber_id, "subscription closed");
        }))
    }

    fn upsert(&self, collection: &str, key: &[Filter], data: Value) -> CoreResult<String> {
        let (id, deliveries) = {
            let mut inner = lock(&self.inner);
            let incumbent = inner
                .docs(collection)
                .iter()
                .find(|doc| key.iter().all(|filter| filter.matches(&doc.data)))
                .map(|doc| doc.id.clone());
            let id = match incumbent {
                Some(id) => {
                    let position = inner
                        .position(collection, &id)
                        .unwrap_or_else(|| unreachable!("incumbent was just found"));
                    inner.docs_mut(collection)[position].data = data;
                    id
                }
                None => {
                    let id = Uuid::new_v4().to_string();
                    inner
                        .docs_mut(collection)
                        .push(Document::new(id.clone(), data));
                    id
                }
            };
            (id, inner.pending_deliveries(collection))
        };
        debug!(collection, %id, "document upserted");
        Self::deliver(deliveries);
        Ok(id)
    }
}

fn not_found(collection: &str, id: &str) -> CoreError {
    CoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn run_query(docs: &[Document], query: &Query) -> Vec<Document> {
    let mut result: Vec<Document> = docs
        .iter()
        .filter(|doc| query.matches(&doc.data))
        .cloned()
        .collect();
    if let Some(order) = &query.order_by {
        result.sort_by(|a, b| {
            compare_fields(
                a.data.get(&order.field),
                b.data.get(&order.field),
                order.direction,
            )
        });
    }
    if let Some(limit) = query.limit {
        result.truncate(limit);
    }
    result
}

/// Missing fields sort last in either direction.
fn compare_fields(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    match (a, b) {
        (Some(lhs), Some(rhs)) => {
            let ordering = compare_values(lhs, rhs);
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Mismatched types order by type rank, keeping the comparator total even
/// over hand-edited documents.
fn compare_values(lhs: &Value, rhs: &Value) -> Ordering {
    if let (Some(lhs), Some(rhs)) = (lhs.as_f64(), rhs.as_f64()) {
        return lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal);
    }
    if let (Some(lhs), Some(rhs)) = (lhs.as_str(), rhs.as_str()) {
        return lhs.cmp(rhs);
    }
    type_rank(lhs).cmp(&type_rank(rhs))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Fixed-session identity provider for tests and local tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    /// An identity with an active session for `user_id`.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// An identity with no session; every call fails `Unauthenticated`.
    pub fn signed_out() -> Self {
        Self::default()
    }
}

impl Identity for StaticIdentity {
    fn current_user_id(&self) -> CoreResult<String> {
        self.user_id.clone().ok_or(CoreError::Unauthenticated)
    }
}
