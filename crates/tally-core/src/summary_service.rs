//! Monthly aggregation over in-memory transaction snapshots.
//!
//! Everything here is pure and synchronous: the collaborator store hands a
//! screen its snapshot, and these functions fold it into totals, category
//! breakdowns, budget consumption, and chart series. There is no error
//! channel — unknown categories pass through verbatim, empty snapshots
//! yield zero totals, and a zero budget limit reports 0% usage.

use std::collections::HashMap;

use tally_domain::{Budget, MonthKey, Transaction, TransactionKind};

/// Income and expense sums for one calendar-month window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthlyTotals {
    pub income: f64,
    pub expense: f64,
}

impl MonthlyTotals {
    /// The balance reported to the user: income minus expense.
    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// One entry of the income/expense time series, labeled by calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBucket {
    pub month: MonthKey,
    pub income: f64,
    pub expense: f64,
}

/// Stateless aggregation over transaction (and budget) snapshots.
pub struct SummaryService;

impl SummaryService {
    /// Sums amounts by kind over `timestamp ∈ [start_millis, end_millis)`.
    ///
    /// Window boundaries are epoch-millis of local midnights; callers own
    /// timezone normalization.
    pub fn monthly_totals(
        transactions: &[Transaction],
        start_millis: i64,
        end_millis: i64,
    ) -> MonthlyTotals {
        let mut totals = MonthlyTotals::default();
        for txn in transactions {
            if txn.timestamp() < start_millis || txn.timestamp() >= end_millis {
                continue;
            }
            match txn.kind {
                TransactionKind::Income => totals.income += txn.amount,
                TransactionKind::Expense => totals.expense += txn.amount,
            }
        }
        totals
    }

    /// [`SummaryService::monthly_totals`] over one whole calendar month.
    pub fn totals_for_month(transactions: &[Transaction], month: MonthKey) -> MonthlyTotals {
        Self::monthly_totals(
            transactions,
            month.start_timestamp_millis(),
            month.succ().start_timestamp_millis(),
        )
    }

    /// Per-category sums for one kind since `period_start_millis`.
    ///
    /// Categories with no matching transaction are absent from the map;
    /// consumers treat a missing key as zero. Iteration order is
    /// unspecified — chart renderers re-sort.
    pub fn category_totals(
        transactions: &[Transaction],
        kind: TransactionKind,
        period_start_millis: i64,
    ) -> HashMap<String, f64> {
        let mut totals = HashMap::new();
        for txn in transactions {
            if txn.kind != kind || txn.timestamp() < period_start_millis {
                continue;
            }
            *totals.entry(txn.category.clone()).or_insert(0.0) += txn.amount;
        }
        totals
    }

    /// Income/expense series of exactly `month_count` calendar months,
    /// oldest first, ending at `anchor` inclusive.
    ///
    /// Months without activity contribute `(0, 0)` entries. Bucketing keys
    /// off the calendar month of `occurred_at`; since the millis mirror is
    /// derived from the same wall-clock value, range filters and buckets
    /// can never disagree.
    pub fn monthly_series(
        transactions: &[Transaction],
        month_count: usize,
        anchor: MonthKey,
    ) -> Vec<MonthlyBucket> {
        let mut months = Vec::with_capacity(month_count);
        let mut cursor = anchor;
        for _ in 0..month_count {
            months.push(cursor);
            cursor = cursor.pred();
        }
        months.reverse();

        let mut index: HashMap<MonthKey, (f64, f64)> =
            months.iter().map(|month| (*month, (0.0, 0.0))).collect();
        for txn in transactions {
            let Some(slot) = index.get_mut(&txn.month_key()) else {
                continue;
            };
            match txn.kind {
                TransactionKind::Income => slot.0 += txn.amount,
                TransactionKind::Expense => slot.1 += txn.amount,
            }
        }

        months
            .into_iter()
            .map(|month| {
                let (income, expense) = index[&month];
                MonthlyBucket {
                    month,
                    income,
                    expense,
                }
            })
            .collect()
    }

    /// Returns a copy of the budget with its transient `spent` view
    /// populated from matching expense transactions.
    ///
    /// A transaction counts when its category equals the budget's, its kind
    /// is Expense, and its timestamp falls inside the budget's calendar
    /// month. The upper bound is deliberate: the original only bounded the
    /// window below, which let stale months bleed into the figure when the
    /// caller's query was wider than one month.
    pub fn budget_usage(budget: &Budget, transactions: &[Transaction]) -> Budget {
        let start = budget.month.start_timestamp_millis();
        let end = budget.month.succ().start_timestamp_millis();
        let spent = transactions
            .iter()
            .filter(|txn| {
                txn.kind == TransactionKind::Expense
                    && txn.category == budget.category
                    && txn.timestamp() >= start
                    && txn.timestamp() < end
            })
            .map(|txn| txn.amount)
            .sum();
        budget.clone().with_spent(spent)
    }
}
