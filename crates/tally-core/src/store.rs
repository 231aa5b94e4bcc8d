//! Collaborator contracts: the document store and the identity provider.
//!
//! The application delegates all persistence and authentication to a cloud
//! backend. This module pins down the minimum surface the core needs from
//! it, so tests and the in-memory reference backend can stand in for the
//! real thing.

use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Collection name for transaction documents.
pub const TRANSACTIONS: &str = "transactions";
/// Collection name for budget documents.
pub const BUDGETS: &str = "budgets";

/// Comparison operators the store is required to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equals,
    GreaterOrEqual,
}

/// One `(field, op, value)` predicate against top-level document fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Equals,
            value: value.into(),
        }
    }

    pub fn greater_or_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::GreaterOrEqual,
            value: value.into(),
        }
    }

    /// Evaluates the predicate against a document body.
    ///
    /// Missing fields never match. `GreaterOrEqual` compares numbers
    /// numerically and strings lexicographically; mismatched types never
    /// match.
    pub fn matches(&self, data: &Value) -> bool {
        let Some(actual) = data.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Equals => actual == &self.value,
            FilterOp::GreaterOrEqual => match (actual.as_f64(), self.value.as_f64()) {
                (Some(lhs), Some(rhs)) => lhs >= rhs,
                _ => match (actual.as_str(), self.value.as_str()) {
                    (Some(lhs), Some(rhs)) => lhs >= rhs,
                    _ => false,
                },
            },
        }
    }
}

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field ordering clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A filtered, optionally ordered and limited read against one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Descending,
        });
        self
    }

    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when every filter matches the document body.
    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(data))
    }
}

/// A stored record: the store-assigned id paired with the document body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Callback receiving a complete result set on every delivery.
pub type Observer = Box<dyn Fn(&[Document]) + Send + Sync>;

/// Guard for a live query. Dropping it tears the subscription down, and any
/// snapshot computed after the drop is discarded instead of delivered.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Minimum persistence contract the core requires from the backend.
///
/// Each subscription delivers the current result set immediately, then a
/// fresh full snapshot after every mutation of the collection. Snapshots
/// replace prior state wholesale; there is no delta protocol.
pub trait DocumentStore: Send + Sync {
    /// Persists a new document and returns the assigned id.
    fn create(&self, collection: &str, data: Value) -> CoreResult<String>;

    /// Fetches one document by id. `NotFound` when it is gone.
    fn get(&self, collection: &str, id: &str) -> CoreResult<Document>;

    /// Merges the given top-level fields into an existing document.
    fn update(&self, collection: &str, id: &str, fields: Value) -> CoreResult<()>;

    /// Overwrites a document wholesale, keeping its id.
    fn replace(&self, collection: &str, id: &str, data: Value) -> CoreResult<()>;

    /// Permanently removes a document. No soft-delete.
    fn delete(&self, collection: &str, id: &str) -> CoreResult<()>;

    /// One-shot filtered read.
    fn query(&self, collection: &str, query: &Query) -> CoreResult<Vec<Document>>;

    /// Live variant of [`DocumentStore::query`].
    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        observer: Observer,
    ) -> CoreResult<Subscription>;

    /// Atomic conditional write on a natural key.
    ///
    /// When exactly the documents matching `key` exist, the first match is
    /// overwritten in place (id preserved); otherwise a new document is
    /// created. The check and the write happen under one store-side critical
    /// section, which is what closes the check-then-act duplicate race a
    /// client-side query-then-branch upsert would have.
    fn upsert(&self, collection: &str, key: &[Filter], data: Value) -> CoreResult<String>;
}

/// Identity collaborator: the session owner, when there is one.
pub trait Identity: Send + Sync {
    /// Current user id, or `Unauthenticated` when no session exists.
    fn current_user_id(&self) -> CoreResult<String>;
}

/// Fails closed for anonymous contexts; handy default for tests.
pub struct NoSession;

impl Identity for NoSession {
    fn current_user_id(&self) -> CoreResult<String> {
        Err(CoreError::Unauthenticated)
    }
}
