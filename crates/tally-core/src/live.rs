//! Screen-scoped live views over store subscriptions.
//!
//! Each view owns its subscription guards and an in-memory snapshot of the
//! latest delivery. Every delivery replaces the previous snapshot wholesale
//! and triggers a full recomputation; there is no incremental update. The
//! full O(budgets × transactions) recompute on every delivery is accepted at
//! personal-finance scale. Dropping a view drops its guards, after which
//! late deliveries are discarded by the store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tally_domain::{Budget, MonthKey, Transaction, TransactionKind};

use crate::budget_service::BudgetService;
use crate::error::CoreResult;
use crate::store::{DocumentStore, Filter, Subscription};
use crate::summary_service::{MonthlyTotals, SummaryService};
use crate::transaction_service::TransactionService;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live income/expense/balance for one calendar month (the dashboard view).
pub struct LiveMonthlySummary {
    totals: Arc<Mutex<MonthlyTotals>>,
    _subscription: Subscription,
}

impl LiveMonthlySummary {
    /// Subscribes to the user's transactions for `month` and keeps totals
    /// current until the view is dropped.
    pub fn open(
        store: &dyn DocumentStore,
        user_id: &str,
        month: MonthKey,
    ) -> CoreResult<Self> {
        let start = month.start_timestamp_millis();
        let end = month.succ().start_timestamp_millis();
        let totals = Arc::new(Mutex::new(MonthlyTotals::default()));
        let shared = Arc::clone(&totals);
        let subscription =
            TransactionService::watch_since(store, user_id, start, move |transactions| {
                *lock(&shared) = SummaryService::monthly_totals(&transactions, start, end);
            })?;
        Ok(Self {
            totals,
            _subscription: subscription,
        })
    }

    /// The latest recomputed totals.
    pub fn totals(&self) -> MonthlyTotals {
        *lock(&self.totals)
    }
}

#[derive(Default)]
struct BoardState {
    budgets: Vec<Budget>,
    expenses: Vec<Transaction>,
    board: Vec<Budget>,
}

impl BoardState {
    fn recompute(&mut self) {
        self.board = BudgetService::with_spent(&self.budgets, &self.expenses);
    }
}

/// Live budget list with `spent` kept current (the budget-settings view).
///
/// Combines two independent subscriptions — the month's budgets and the
/// month's expense transactions — and re-runs the usage aggregation for
/// every budget whenever either one delivers.
pub struct LiveBudgetBoard {
    state: Arc<Mutex<BoardState>>,
    _budgets: Subscription,
    _expenses: Subscription,
}

impl LiveBudgetBoard {
    pub fn open(
        store: &dyn DocumentStore,
        user_id: &str,
        month: MonthKey,
    ) -> CoreResult<Self> {
        let state = Arc::new(Mutex::new(BoardState::default()));

        let budgets_state = Arc::clone(&state);
        let budgets = BudgetService::watch_month(store, user_id, month, move |snapshot| {
            let mut state = lock(&budgets_state);
            state.budgets = snapshot;
            state.recompute();
        })?;

        // Expense feed: the month's expenses only, matching the usage window.
        let expenses_query = TransactionService::since_query(
            user_id,
            month.start_timestamp_millis(),
        )
        .filter(Filter::equals("type", TransactionKind::Expense.wire()));
        let expenses_state = Arc::clone(&state);
        let expenses = store.subscribe(
            crate::store::TRANSACTIONS,
            expenses_query,
            Box::new(move |docs| {
                let mut state = lock(&expenses_state);
                state.expenses = crate::transaction_service::decode_all(docs);
                state.recompute();
            }),
        )?;

        Ok(Self {
            state,
            _budgets: budgets,
            _expenses: expenses,
        })
    }

    /// The latest budgets with their transient `spent` views populated.
    pub fn budgets(&self) -> Vec<Budget> {
        lock(&self.state).board.clone()
    }
}
