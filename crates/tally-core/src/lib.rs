//! tally-core
//!
//! Business logic for the budget tracker: aggregation over transaction
//! snapshots, budget upsert policy, and the collaborator contracts for the
//! document store and identity provider. Depends on tally-domain. No UI,
//! no storage engine of its own.

pub mod budget_service;
pub mod error;
pub mod live;
pub mod store;
pub mod summary_service;
pub mod transaction_service;

pub use budget_service::BudgetService;
pub use error::{CoreError, CoreResult};
pub use live::{LiveBudgetBoard, LiveMonthlySummary};
pub use store::{
    Direction, Document, DocumentStore, Filter, FilterOp, Identity, NoSession, Observer, OrderBy,
    Query, Subscription, BUDGETS, TRANSACTIONS,
};
pub use summary_service::{MonthlyBucket, MonthlyTotals, SummaryService};
pub use transaction_service::TransactionService;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("tally_core=info".parse().unwrap());
        fmt().with_env_filter(filter).init();
        tracing::info!("tally core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
