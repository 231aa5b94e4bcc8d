//! Calendar-month keys in the `YYYY-MM` natural-key format.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Identifies one calendar month in the user's local calendar.
///
/// Serializes as the `YYYY-MM` string the budget documents carry, and is the
/// month component of a budget's (user, category, month) natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Builds a key from calendar parts. `month` must be in `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::OutOfRange { year, month });
        }
        Ok(Self { year, month })
    }

    /// Returns the month containing the given calendar date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Midnight on the first of the month (local wall-clock).
    pub fn start(&self) -> NaiveDateTime {
        self.first_day()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_else(|| unreachable!("midnight is always representable"))
    }

    /// The first calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| unreachable!("month is validated on construction"))
    }

    /// Epoch-millis of the month start, matching the `timestamp` mirror kept
    /// on transactions.
    pub fn start_timestamp_millis(&self) -> i64 {
        self.start().and_utc().timestamp_millis()
    }

    /// The following calendar month.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding calendar month.
    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Short month name for chart axes ("Jan", "Feb", ...).
    pub fn label(&self) -> &'static str {
        MONTH_LABELS[(self.month - 1) as usize]
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (year_part, month_part) = value
            .split_once('-')
            .ok_or_else(|| MonthKeyError::Malformed(value.to_string()))?;
        let year: i32 = year_part
            .parse()
            .map_err(|_| MonthKeyError::Malformed(value.to_string()))?;
        let month: u32 = month_part
            .parse()
            .map_err(|_| MonthKeyError::Malformed(value.to_string()))?;
        Self::new(year, month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Raised when a `YYYY-MM` key cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthKeyError {
    Malformed(String),
    OutOfRange { year: i32, month: u32 },
}

impl fmt::Display for MonthKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKeyError::Malformed(raw) => write!(f, "malformed month key: {raw:?}"),
            MonthKeyError::OutOfRange { year, month } => {
                write!(f, "month out of range: {year:04}-{month:02}")
            }
        }
    }
}

impl std::error::Error for MonthKeyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_natural_key_strings() {
        let key: MonthKey = "2024-06".parse().expect("valid key");
        assert_eq!(key.year(), 2024);
        assert_eq!(key.month(), 6);
        assert_eq!(key.to_string(), "2024-06");
        assert_eq!(key.label(), "Jun");
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!("2024".parse::<MonthKey>().is_err());
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("2024-00".parse::<MonthKey>().is_err());
        assert!("abcd-ef".parse::<MonthKey>().is_err());
    }

    #[test]
    fn walks_across_year_boundaries() {
        let december = MonthKey::new(2023, 12).unwrap();
        assert_eq!(december.succ(), MonthKey::new(2024, 1).unwrap());
        assert_eq!(MonthKey::new(2024, 1).unwrap().pred(), december);
    }

    #[test]
    fn start_millis_matches_transaction_timestamp_derivation() {
        let key = MonthKey::new(2024, 3).unwrap();
        let start = key.start();
        assert_eq!(start.and_utc().timestamp_millis(), key.start_timestamp_millis());
        assert_eq!(key.first_day(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn serde_round_trips_as_string() {
        let key = MonthKey::new(2024, 6).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2024-06\"");
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn orders_chronologically() {
        let earlier = MonthKey::new(2023, 12).unwrap();
        let later = MonthKey::new(2024, 1).unwrap();
        assert!(earlier < later);
    }
}
