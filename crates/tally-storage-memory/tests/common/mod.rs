use chrono::{NaiveDate, NaiveDateTime};
use tally_domain::{Budget, MonthKey, Transaction, TransactionKind};

pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(12, 0, 0)
        .expect("valid time")
}

pub fn june() -> MonthKey {
    MonthKey::new(2024, 6).expect("valid month")
}

pub fn expense(category: &str, amount: f64, when: NaiveDateTime) -> Transaction {
    Transaction::new("u1", TransactionKind::Expense, amount, category, "", when)
}

pub fn income(category: &str, amount: f64, when: NaiveDateTime) -> Transaction {
    Transaction::new("u1", TransactionKind::Income, amount, category, "", when)
}

pub fn food_budget(limit: f64) -> Budget {
    Budget::new("u1", "Food", limit, june())
}
