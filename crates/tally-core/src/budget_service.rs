//! Store-backed helpers enforcing the one-budget-per-(user, category, month)
//! rule.

use serde_json::Value;
use tracing::{debug, warn};

use tally_domain::{Budget, MonthKey, Transaction};

use crate::error::{CoreError, CoreResult};
use crate::store::{Document, DocumentStore, Filter, Identity, Query, Subscription, BUDGETS};
use crate::summary_service::SummaryService;

/// Budget operations over the collaborator store.
pub struct BudgetService;

impl BudgetService {
    /// Idempotent upsert on the (user, category, month) natural key.
    ///
    /// Delegates to the store's atomic conditional write, so two concurrent
    /// upserts for the same key can never produce duplicate rows — the
    /// incumbent's id is preserved and only its limit changes.
    pub fn upsert(store: &dyn DocumentStore, budget: &Budget) -> CoreResult<String> {
        validate(budget)?;
        let key = natural_key(budget);
        let id = store.upsert(BUDGETS, &key, encode(budget)?)?;
        debug!(
            %id,
            category = %budget.category,
            month = %budget.month,
            limit = budget.limit,
            "budget upserted"
        );
        Ok(id)
    }

    /// Permanently removes a budget.
    pub fn delete(store: &dyn DocumentStore, id: &str) -> CoreResult<()> {
        store.delete(BUDGETS, id)?;
        debug!(id, "budget deleted");
        Ok(())
    }

    /// The user's budgets for one month. `spent` is left at zero; combine
    /// with [`BudgetService::with_spent`] once a transaction snapshot is at
    /// hand.
    pub fn list_for_month(
        store: &dyn DocumentStore,
        user_id: &str,
        month: MonthKey,
    ) -> CoreResult<Vec<Budget>> {
        let docs = store.query(BUDGETS, &Self::month_query(user_id, month))?;
        Ok(decode_all(&docs))
    }

    /// Resolves the session owner and lists their budgets for one month.
    pub fn list_for_current_month(
        store: &dyn DocumentStore,
        identity: &dyn Identity,
        month: MonthKey,
    ) -> CoreResult<Vec<Budget>> {
        let user_id = identity.current_user_id()?;
        Self::list_for_month(store, &user_id, month)
    }

    /// Populates the transient `spent` view for every budget from the given
    /// expense snapshot. Pure; order of budgets is preserved.
    pub fn with_spent(budgets: &[Budget], transactions: &[Transaction]) -> Vec<Budget> {
        budgets
            .iter()
            .map(|budget| SummaryService::budget_usage(budget, transactions))
            .collect()
    }

    /// Query for a user's budgets in one month.
    pub fn month_query(user_id: &str, month: MonthKey) -> Query {
        Query::new()
            .filter(Filter::equals("userId", user_id))
            .filter(Filter::equals("month", month.to_string()))
    }

    /// Live snapshots of the user's budgets for one month.
    pub fn watch_month(
        store: &dyn DocumentStore,
        user_id: &str,
        month: MonthKey,
        on_snapshot: impl Fn(Vec<Budget>) + Send + Sync + 'static,
    ) -> CoreResult<Subscription> {
        store.subscribe(
            BUDGETS,
            Self::month_query(user_id, month),
            Box::new(move |docs| on_snapshot(decode_all(docs))),
        )
    }
}

fn validate(budget: &Budget) -> CoreResult<()> {
    if !budget.limit.is_finite() || budget.limit <= 0.0 {
        return Err(CoreError::Validation("Limit must be greater than 0".into()));
    }
    if budget.category.trim().is_empty() {
        return Err(CoreError::Validation("Category is required".into()));
    }
    if budget.user_id.trim().is_empty() {
        return Err(CoreError::Validation("Owner is required".into()));
    }
    Ok(())
}

fn natural_key(budget: &Budget) -> Vec<Filter> {
    vec![
        Filter::equals("userId", budget.user_id.clone()),
        Filter::equals("category", budget.category.clone()),
        Filter::equals("month", budget.month.to_string()),
    ]
}

fn encode(budget: &Budget) -> CoreResult<Value> {
    let mut value = serde_json::to_value(budget)?;
    if let Some(body) = value.as_object_mut() {
        body.remove("id");
    }
    Ok(value)
}

pub(crate) fn decode(doc: &Document) -> CoreResult<Budget> {
    let mut budget: Budget = serde_json::from_value(doc.data.clone())
        .map_err(|err| CoreError::Store(format!("malformed budget {}: {err}", doc.id)))?;
    budget.id = Some(doc.id.clone());
    Ok(budget)
}

pub(crate) fn decode_all(docs: &[Document]) -> Vec<Budget> {
    docs.iter()
        .filter_map(|doc| match decode(doc) {
            Ok(budget) => Some(budget),
            Err(err) => {
                warn!(id = %doc.id, %err, "skipping malformed budget document");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use tally_domain::TransactionKind;

    fn june() -> MonthKey {
        MonthKey::new(2024, 6).unwrap()
    }

    fn sample() -> Budget {
        Budget::new("u1", "Food", 100.0, june())
    }

    #[test]
    fn validation_rejects_non_positive_limits() {
        let mut budget = sample();
        budget.limit = 0.0;
        assert!(matches!(validate(&budget), Err(CoreError::Validation(_))));
        budget.limit = -10.0;
        assert!(matches!(validate(&budget), Err(CoreError::Validation(_))));
    }

    #[test]
    fn natural_key_covers_user_category_and_month() {
        let key = natural_key(&sample());
        assert_eq!(key.len(), 3);
        let body = json!({"userId": "u1", "category": "Food", "month": "2024-06"});
        assert!(key.iter().all(|filter| filter.matches(&body)));
        let other_month = json!({"userId": "u1", "category": "Food", "month": "2024-07"});
        assert!(!key.iter().all(|filter| filter.matches(&other_month)));
    }

    #[test]
    fn with_spent_populates_every_budget() {
        let when = NaiveDate::from_ymd_opt(2024, 6, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let transactions = vec![
            Transaction::new("u1", TransactionKind::Expense, 30.0, "Food", "", when),
            Transaction::new("u1", TransactionKind::Expense, 25.0, "Bills", "", when),
        ];
        let budgets = vec![
            sample(),
            Budget::new("u1", "Bills", 50.0, june()),
            Budget::new("u1", "Travel", 300.0, june()),
        ];
        let board = BudgetService::with_spent(&budgets, &transactions);
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].spent, 30.0);
        assert_eq!(board[1].spent, 25.0);
        assert_eq!(board[2].spent, 0.0, "no matching activity");
        assert_eq!(board[1].percentage_used(), 50);
    }

    #[test]
    fn decode_injects_the_store_id() {
        let doc = Document::new("b-1", encode(&sample()).unwrap());
        let budget = decode(&doc).unwrap();
        assert_eq!(budget.id.as_deref(), Some("b-1"));
        assert_eq!(budget.spent, 0.0);
    }

    #[test]
    fn decode_all_skips_malformed_documents() {
        let good = Document::new("ok", encode(&sample()).unwrap());
        let bad = Document::new("broken", json!({"month": "not-a-month"}));
        let decoded = decode_all(&[bad, good]);
        assert_eq!(decoded.len(), 1);
    }
}
