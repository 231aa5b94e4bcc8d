//! Suggested category labels, keyed by transaction kind.
//!
//! These are UI suggestions, not a validated enum: stored records may carry
//! any label (direct edits included) and every consumer passes unknown
//! labels through verbatim.

use crate::transaction::TransactionKind;

/// Ordered income suggestions, as presented by entry forms.
pub const INCOME_CATEGORIES: &[&str] = &["Salary", "Business", "Investments", "Gifts", "Other Income"];

/// Ordered expense suggestions, as presented by entry forms.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transportation",
    "Shopping",
    "Entertainment",
    "Bills",
    "Healthcare",
    "Education",
    "Travel",
    "Other Expense",
];

/// Returns the suggestion list for the given kind.
pub fn suggested_categories(kind: TransactionKind) -> &'static [&'static str] {
    match kind {
        TransactionKind::Income => INCOME_CATEGORIES,
        TransactionKind::Expense => EXPENSE_CATEGORIES,
    }
}
