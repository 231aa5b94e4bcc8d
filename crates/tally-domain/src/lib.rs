//! tally-domain
//!
//! Pure data model for the budget tracker (Transaction, Budget, MonthKey,
//! category taxonomy). No I/O, no storage. Only data types and core enums.

pub mod budget;
pub mod category;
pub mod common;
pub mod month;
pub mod transaction;

pub use budget::*;
pub use category::*;
pub use common::*;
pub use month::*;
pub use transaction::*;
