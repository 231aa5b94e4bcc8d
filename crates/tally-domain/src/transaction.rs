//! Domain model for income/expense transactions.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::common::{Displayable, Identifiable, OwnedByUser};
use crate::month::MonthKey;

/// Income or Expense classification of a transaction.
///
/// Serializes with the lowercase wire strings the stored documents use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The lowercase string stored in documents and used in query filters.
    pub fn wire(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        };
        f.write_str(label)
    }
}

/// A single income or expense record owned by one user.
///
/// `occurred_at` is the calendar timestamp chosen by the user;
/// `timestamp` is its epoch-millis mirror, kept for range queries against
/// stores that can only compare scalars. The pair is private so no code
/// path can move one without the other: both are set by [`Transaction::new`]
/// and [`Transaction::set_occurred_at`] only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub category: String,
    pub description: String,
    #[serde(rename = "date")]
    occurred_at: NaiveDateTime,
    timestamp: i64,
}

impl Transaction {
    /// Creates an unpersisted transaction.
    ///
    /// A blank `description` defaults to the category label. The engine
    /// never consults the system timezone: `occurred_at` is wall-clock time
    /// already normalized by the caller, and the millis mirror is derived
    /// from it deterministically.
    pub fn new(
        user_id: impl Into<String>,
        kind: TransactionKind,
        amount: f64,
        category: impl Into<String>,
        description: impl Into<String>,
        occurred_at: NaiveDateTime,
    ) -> Self {
        let category = category.into();
        let description = description.into();
        let description = if description.trim().is_empty() {
            category.clone()
        } else {
            description
        };
        Self {
            id: None,
            user_id: user_id.into(),
            kind,
            amount,
            category,
            description,
            occurred_at,
            timestamp: derive_timestamp(occurred_at),
        }
    }

    /// The calendar timestamp chosen by the user.
    pub fn occurred_at(&self) -> NaiveDateTime {
        self.occurred_at
    }

    /// Epoch-millis mirror of [`Transaction::occurred_at`].
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Moves the transaction in time, updating the millis mirror in lockstep.
    pub fn set_occurred_at(&mut self, occurred_at: NaiveDateTime) {
        self.occurred_at = occurred_at;
        self.timestamp = derive_timestamp(occurred_at);
    }

    /// The calendar day of the transaction.
    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_at.date()
    }

    /// The calendar month used for series bucketing.
    pub fn month_key(&self) -> MonthKey {
        MonthKey::containing(self.occurred_at.date())
    }
}

fn derive_timestamp(occurred_at: NaiveDateTime) -> i64 {
    occurred_at.and_utc().timestamp_millis()
}

impl Identifiable for Transaction {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl OwnedByUser for Transaction {
    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!(
            "{} {} {:.2} ({})",
            self.occurred_at.date(),
            self.kind,
            self.amount,
            self.category
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn blank_description_defaults_to_category() {
        let txn = Transaction::new(
            "u1",
            TransactionKind::Expense,
            42.50,
            "Food",
            "",
            at(2024, 3, 15),
        );
        assert_eq!(txn.description, "Food");
        assert_eq!(txn.timestamp(), at(2024, 3, 15).and_utc().timestamp_millis());
    }

    #[test]
    fn whitespace_description_also_defaults() {
        let txn = Transaction::new(
            "u1",
            TransactionKind::Income,
            10.0,
            "Salary",
            "   ",
            at(2024, 1, 1),
        );
        assert_eq!(txn.description, "Salary");
    }

    #[test]
    fn moving_the_date_moves_the_millis_mirror() {
        let mut txn = Transaction::new(
            "u1",
            TransactionKind::Expense,
            5.0,
            "Food",
            "lunch",
            at(2024, 6, 5),
        );
        let before = txn.timestamp();
        txn.set_occurred_at(at(2024, 7, 1));
        assert_ne!(txn.timestamp(), before);
        assert_eq!(txn.timestamp(), at(2024, 7, 1).and_utc().timestamp_millis());
        assert_eq!(txn.month_key().to_string(), "2024-07");
    }

    #[test]
    fn kind_uses_lowercase_wire_strings() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Income).unwrap(),
            "\"income\""
        );
        assert_eq!(TransactionKind::Expense.wire(), "expense");
    }

    #[test]
    fn serde_round_trips_with_original_field_names() {
        let txn = Transaction::new(
            "u1",
            TransactionKind::Expense,
            12.0,
            "Bills",
            "electricity",
            at(2024, 2, 10),
        );
        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["type"], "expense");
        assert!(json.get("id").is_none(), "unpersisted id must be absent");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, txn);
    }
}
