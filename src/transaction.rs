//! Canonical transaction record written to the output CSV.

use crate::amount::Amount;
use chrono::NaiveDate;
use serde::Serialize;

/// Column order of the canonical output.
pub const CANONICAL_COLUMNS: [&str; 4] = ["date", "amount", "description", "notes"];

/// A normalized transaction ready for a budgeting tool import.
///
/// Field order matches [`CANONICAL_COLUMNS`]; the CSV header is derived
/// from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalTransaction {
    /// Calendar date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,

    /// Signed amount; negative values are outflows.
    pub amount: Amount,

    /// Statement description, verbatim.
    pub description: String,

    /// Copy of the description.
    pub notes: String,
}

impl CanonicalTransaction {
    pub fn new(date: NaiveDate, amount: Amount, description: String) -> Self {
        CanonicalTransaction {
            date,
            amount,
            notes: description.clone(),
            description,
        }
    }
}
