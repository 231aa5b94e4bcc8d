//! Store-backed CRUD and live-query helpers for transactions.

use serde_json::Value;
use tracing::{debug, warn};

use tally_domain::{Transaction, TransactionKind};

use crate::error::{CoreError, CoreResult};
use crate::store::{Document, DocumentStore, Filter, Identity, Query, Subscription, TRANSACTIONS};

/// Validated transaction operations over the collaborator store.
///
/// Edits replace the whole record rather than patching fields, and deletes
/// are permanent — both per the original application's semantics.
pub struct TransactionService;

impl TransactionService {
    /// Persists a new transaction and returns the store-assigned id.
    pub fn add(store: &dyn DocumentStore, transaction: &Transaction) -> CoreResult<String> {
        validate(transaction)?;
        let id = store.create(TRANSACTIONS, encode(transaction)?)?;
        debug!(%id, kind = %transaction.kind, amount = transaction.amount, "transaction added");
        Ok(id)
    }

    /// Fetches one transaction by id.
    pub fn get(store: &dyn DocumentStore, id: &str) -> CoreResult<Transaction> {
        let doc = store.get(TRANSACTIONS, id)?;
        decode(&doc)
    }

    /// Overwrites the stored record wholesale, keeping its id.
    pub fn replace(
        store: &dyn DocumentStore,
        id: &str,
        transaction: &Transaction,
    ) -> CoreResult<()> {
        validate(transaction)?;
        store.replace(TRANSACTIONS, id, encode(transaction)?)?;
        debug!(id, "transaction replaced");
        Ok(())
    }

    /// Permanently removes a transaction.
    pub fn delete(store: &dyn DocumentStore, id: &str) -> CoreResult<()> {
        store.delete(TRANSACTIONS, id)?;
        debug!(id, "transaction deleted");
        Ok(())
    }

    /// All of a user's transactions, newest first.
    pub fn list_for_user(store: &dyn DocumentStore, user_id: &str) -> CoreResult<Vec<Transaction>> {
        let query = Query::new()
            .filter(Filter::equals("userId", user_id))
            .order_by_desc("timestamp");
        let docs = store.query(TRANSACTIONS, &query)?;
        Ok(decode_all(&docs))
    }

    /// Resolves the session owner and lists their transactions, newest
    /// first. `Unauthenticated` before the store is ever touched when no
    /// session exists.
    pub fn list_for_current(
        store: &dyn DocumentStore,
        identity: &dyn Identity,
    ) -> CoreResult<Vec<Transaction>> {
        let user_id = identity.current_user_id()?;
        Self::list_for_user(store, &user_id)
    }

    /// The user's most recent transactions (dashboard list).
    pub fn recent(
        store: &dyn DocumentStore,
        user_id: &str,
        limit: usize,
    ) -> CoreResult<Vec<Transaction>> {
        let query = Query::new()
            .filter(Filter::equals("userId", user_id))
            .order_by_desc("timestamp")
            .limit(limit);
        let docs = store.query(TRANSACTIONS, &query)?;
        Ok(decode_all(&docs))
    }

    /// Client-side kind filter for the list screen's All/Income/Expense chips.
    pub fn filter_by_kind(
        transactions: &[Transaction],
        kind: Option<TransactionKind>,
    ) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|txn| kind.map_or(true, |wanted| txn.kind == wanted))
            .cloned()
            .collect()
    }

    /// Query for a user's transactions with `timestamp >= start_millis`.
    pub fn since_query(user_id: &str, start_millis: i64) -> Query {
        Query::new()
            .filter(Filter::equals("userId", user_id))
            .filter(Filter::greater_or_equal("timestamp", start_millis))
    }

    /// Live snapshots of the user's transactions from `start_millis` onward.
    pub fn watch_since(
        store: &dyn DocumentStore,
        user_id: &str,
        start_millis: i64,
        on_snapshot: impl Fn(Vec<Transaction>) + Send + Sync + 'static,
    ) -> CoreResult<Subscription> {
        let query = Self::since_query(user_id, start_millis);
        store.subscribe(
            TRANSACTIONS,
            query,
            Box::new(move |docs| on_snapshot(decode_all(docs))),
        )
    }

    /// Live snapshots of the user's latest `limit` transactions.
    pub fn watch_recent(
        store: &dyn DocumentStore,
        user_id: &str,
        limit: usize,
        on_snapshot: impl Fn(Vec<Transaction>) + Send + Sync + 'static,
    ) -> CoreResult<Subscription> {
        let query = Query::new()
            .filter(Filter::equals("userId", user_id))
            .order_by_desc("timestamp")
            .limit(limit);
        store.subscribe(
            TRANSACTIONS,
            query,
            Box::new(move |docs| on_snapshot(decode_all(docs))),
        )
    }
}

fn validate(transaction: &Transaction) -> CoreResult<()> {
    if !transaction.amount.is_finite() || transaction.amount <= 0.0 {
        return Err(CoreError::Validation(
            "Amount must be greater than 0".into(),
        ));
    }
    if transaction.category.trim().is_empty() {
        return Err(CoreError::Validation("Category is required".into()));
    }
    if transaction.user_id.trim().is_empty() {
        return Err(CoreError::Validation("Owner is required".into()));
    }
    Ok(())
}

fn encode(transaction: &Transaction) -> CoreResult<Value> {
    let mut value = serde_json::to_value(transaction)?;
    // The id travels next to the document, never inside it.
    if let Some(body) = value.as_object_mut() {
        body.remove("id");
    }
    Ok(value)
}

pub(crate) fn decode(doc: &Document) -> CoreResult<Transaction> {
    let mut transaction: Transaction = serde_json::from_value(doc.data.clone())
        .map_err(|err| CoreError::Store(format!("malformed transaction {}: {err}", doc.id)))?;
    transaction.id = Some(doc.id.clone());
    Ok(transaction)
}

/// Decodes a snapshot, dropping malformed documents instead of failing the
/// whole delivery.
pub(crate) fn decode_all(docs: &[Document]) -> Vec<Transaction> {
    docs.iter()
        .filter_map(|doc| match decode(doc) {
            Ok(transaction) => Some(transaction),
            Err(err) => {
                warn!(id = %doc.id, %err, "skipping malformed transaction document");
                None
            }
        })
        .collect()
}
