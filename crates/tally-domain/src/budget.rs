//! Domain model for per-category monthly spending limits.

use serde::{Deserialize, Serialize};

use crate::common::{Displayable, Identifiable, OwnedByUser};
use crate::month::MonthKey;

/// A monthly spending cap for one (user, category, month) natural key.
///
/// `spent` is a read-time view populated by aggregating matching expense
/// transactions; it is never persisted and never written back to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub category: String,
    pub month: MonthKey,
    pub limit: f64,
    #[serde(skip)]
    pub spent: f64,
}

impl Budget {
    /// Creates an unpersisted budget with nothing spent against it.
    pub fn new(
        user_id: impl Into<String>,
        category: impl Into<String>,
        limit: f64,
        month: MonthKey,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            category: category.into(),
            month,
            limit,
            spent: 0.0,
        }
    }

    /// Returns a copy with the transient `spent` view populated.
    pub fn with_spent(mut self, spent: f64) -> Self {
        self.spent = spent;
        self
    }

    /// Amount still available under the cap. Negative when over budget.
    pub fn remaining(&self) -> f64 {
        self.limit - self.spent
    }

    /// Whole-number percentage of the cap consumed, truncated toward zero.
    ///
    /// A zero limit reports 0% by policy, never a division failure.
    pub fn percentage_used(&self) -> i64 {
        if self.limit == 0.0 {
            return 0;
        }
        (self.spent / self.limit * 100.0) as i64
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl OwnedByUser for Budget {
    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Displayable for Budget {
    fn display_label(&self) -> String {
        format!("{} {} ({}%)", self.month, self.category, self.percentage_used())
    }
}
