//! Decoder output: one row of typed field values.

use crate::amount::Amount;
use chrono::NaiveDate;
use std::fmt;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Amount(Amount),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Amount> {
        match self {
            FieldValue::Amount(a) => Some(*a),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Amount(a) => write!(f, "{}", a),
        }
    }
}

/// Result of coercing raw text to a declared field type.
///
/// Lenient decoders keep the `FellBack` value and carry on; strict ones turn
/// it into an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    Parsed(FieldValue),
    FellBack(FieldValue),
}

impl Coercion {
    pub fn fell_back(&self) -> bool {
        matches!(self, Coercion::FellBack(_))
    }

    pub fn into_value(self) -> FieldValue {
        match self {
            Coercion::Parsed(v) | Coercion::FellBack(v) => v,
        }
    }
}

/// Field values decoded from one input line or sheet row, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number or sheet row the values came from.
    pub source_row: usize,
    values: Vec<(String, FieldValue)>,
    fallbacks: Vec<String>,
}

impl RawRow {
    pub fn new(source_row: usize) -> Self {
        RawRow {
            source_row,
            values: Vec::new(),
            fallbacks: Vec::new(),
        }
    }

    /// Sets a field, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Convenience accessor for text fields; `None` if absent or not text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn amount(&self, name: &str) -> Option<Amount> {
        self.get(name).and_then(FieldValue::as_amount)
    }

    /// Negates an amount field in place. Non-amount values are left alone.
    pub fn negate(&mut self, name: &str) {
        if let Some((_, FieldValue::Amount(a))) = self.values.iter_mut().find(|(n, _)| n == name) {
            *a = -*a;
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub(crate) fn record_fallback(&mut self, name: &str) {
        self.fallbacks.push(name.to_string());
    }

    /// Fields whose value is a substitute for text that failed to parse.
    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }
}
