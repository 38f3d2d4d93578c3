//! Turns decoded rows into canonical transactions.

use crate::error::{ConvertError, Result};
use crate::record::{FieldValue, RawRow};
use crate::transaction::CanonicalTransaction;
use log::debug;

/// `transaction_type` code for a charge; its amount is negated.
pub const CHARGE_CODE: &str = "C";

/// `transaction_type` code for balance and informational lines; dropped.
pub const BALANCE_CODE: &str = "S";

/// Normalizes decoded rows, in order.
///
/// Rows carrying a `transaction_type` of `"C"` have their amount negated and
/// rows of type `"S"` are dropped. Every surviving row must provide a
/// `date`, an `amount` and a `description`.
///
/// Returns [`ConvertError::EmptyResult`] when no row survives.
pub fn normalize(rows: Vec<RawRow>) -> Result<Vec<CanonicalTransaction>> {
    let input_rows = rows.len();
    let mut out = Vec::with_capacity(rows.len());

    for mut row in rows {
        if let Some(kind) = row.text("transaction_type") {
            if kind == BALANCE_CODE {
                debug!("Row {}: dropping balance line", row.source_row);
                continue;
            }
            if kind == CHARGE_CODE {
                row.negate("amount");
            }
        }
        out.push(to_canonical(&row)?);
    }

    if out.is_empty() {
        return Err(ConvertError::EmptyResult { input_rows });
    }
    debug!("Normalized {} of {} rows", out.len(), input_rows);
    Ok(out)
}

fn to_canonical(row: &RawRow) -> Result<CanonicalTransaction> {
    let date = match required(row, "date")? {
        FieldValue::Date(d) => *d,
        other => {
            return Err(ConvertError::DateParse {
                row: row.source_row,
                field: "date".to_string(),
                value: other.to_string(),
                format: "%Y-%m-%d".to_string(),
            })
        }
    };

    let amount = match required(row, "amount")? {
        FieldValue::Amount(a) => *a,
        other => {
            return Err(ConvertError::InvalidValue {
                row: row.source_row,
                field: "amount".to_string(),
                value: other.to_string(),
            })
        }
    };

    let description = required(row, "description")?.to_string();
    Ok(CanonicalTransaction::new(date, amount, description))
}

fn required<'r>(row: &'r RawRow, field: &str) -> Result<&'r FieldValue> {
    row.get(field).ok_or_else(|| {
        ConvertError::missing_field(field, format!("not present in row {}", row.source_row))
    })
}
